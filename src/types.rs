//! Core types for pan123-dl

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the inner i64 value
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

remote_id!(
    /// Provider-assigned offline task id
    TaskId
);

remote_id!(
    /// Remote file id
    FileId
);

remote_id!(
    /// Remote folder id (folders are file entries of directory type)
    FolderId
);

impl FolderId {
    /// The drive root
    pub const ROOT: FolderId = FolderId(0);

    /// True for the drive root
    pub fn is_root(&self) -> bool {
        self.0 == 0
    }
}

impl From<FolderId> for FileId {
    fn from(id: FolderId) -> Self {
        FileId(id.0)
    }
}

/// Driver-level task state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Waiting on the provider
    Queued,
    /// Provider is fetching the content
    Downloading,
    /// Content is in the drive
    Completed,
    /// Provider gave up
    Failed,
}

impl TaskState {
    /// Map a provider status code; unknown codes yield `None`
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TaskState::Queued),
            1 => Some(TaskState::Downloading),
            2 => Some(TaskState::Completed),
            3 => Some(TaskState::Failed),
            _ => None,
        }
    }

    /// Provider status code for this state
    pub fn code(&self) -> i64 {
        match self {
            TaskState::Queued => 0,
            TaskState::Downloading => 1,
            TaskState::Completed => 2,
            TaskState::Failed => 3,
        }
    }

    /// Progress percentage for this state given the provider-reported fraction
    ///
    /// Only a downloading task reports its own progress; the other states are fixed.
    pub fn progress_percent(&self, fraction: f64) -> f64 {
        match self {
            TaskState::Queued | TaskState::Failed => 0.0,
            TaskState::Downloading => fraction * 100.0,
            TaskState::Completed => 100.0,
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskState::Queued => "queued",
            TaskState::Downloading => "downloading",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Tag attached to every task reported by this driver
pub const DRIVER_TAG: &str = "ani-rss";

/// A provider task as seen by the pipeline
///
/// Derived on every poll from the provider listing plus the submission record;
/// never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteTask {
    /// Provider task id
    pub task_id: TaskId,
    /// Name reported by the provider (updated after a successful rename)
    pub display_name: String,
    /// Total size in bytes
    pub size_bytes: u64,
    /// Normalized state
    pub state: TaskState,
    /// Progress in percent (0-100)
    pub progress_percent: f64,
    /// Save path recorded at submission; empty when this process never submitted the task
    pub download_dir: String,
    /// Pipeline tags
    pub tags: Vec<String>,
}

impl RemoteTask {
    /// True when no submission metadata is available and renaming must be skipped
    pub fn lacks_submission_metadata(&self) -> bool {
        self.download_dir.trim().is_empty()
    }
}

/// Naming intent recorded when a task is submitted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedTaskRecord {
    /// Provider task id
    pub task_id: TaskId,
    /// Logical save path the pipeline asked for
    pub save_path: String,
    /// Target name template, when the pipeline supplied one
    pub target_name: Option<String>,
}

/// A remote file found while searching for a task's output
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteFileCandidate {
    /// Remote file id
    pub file_id: FileId,
    /// Current file name
    pub file_name: String,
    /// Folder the file currently sits in
    pub parent_folder_id: FolderId,
    /// True when the parent is the task's destination folder
    pub is_in_target_directory: bool,
}

/// Cached login session
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Account the token belongs to
    pub username: String,
    /// Bearer token
    pub access_token: String,
    /// Assumed expiry of the token
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// True while the token may be reused at `now`, honoring the refresh lead
    pub fn is_usable_at(&self, now: DateTime<Utc>, refresh_lead: std::time::Duration) -> bool {
        let Ok(lead) = chrono::Duration::from_std(refresh_lead) else {
            return false;
        };
        match self.expires_at.checked_sub_signed(lead) {
            Some(refresh_at) => now < refresh_at,
            None => false,
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Show an episode belongs to
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Show {
    /// Show title
    pub title: String,
}

/// Episode handed to the driver for download
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Release title as published
    pub title: String,
    /// Target file name template chosen by the pipeline
    pub rename: Option<String>,
    /// Subtitle group, when known
    pub subgroup: Option<String>,
}

/// Events emitted by the driver
///
/// Consumers subscribe via [`Pan123Driver::subscribe`](crate::Pan123Driver::subscribe).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An offline task was submitted and its naming intent recorded
    TaskSubmitted {
        /// Provider task id
        task_id: TaskId,
        /// Target name template
        name: Option<String>,
        /// Logical save path
        save_path: String,
    },

    /// An offline task was submitted but its id could not be recovered
    TaskIdUnresolved {
        /// Target name template
        name: Option<String>,
    },

    /// A file was moved into the task's destination folder
    FileMoved {
        /// Provider task id
        task_id: TaskId,
        /// Moved file
        file_id: FileId,
        /// Destination folder
        to_folder: FolderId,
    },

    /// A file was renamed
    FileRenamed {
        /// Provider task id
        task_id: TaskId,
        /// Previous name
        from: String,
        /// New name
        to: String,
    },

    /// An emptied source folder was sent to the trash
    FolderTrashed {
        /// Trashed folder
        folder_id: FolderId,
    },

    /// Reconciliation finished for a task
    TaskReconciled {
        /// Provider task id
        task_id: TaskId,
        /// Number of candidate files processed
        files: usize,
    },

    /// The provider's offline-task record was deleted
    OfflineTaskDeleted {
        /// Provider task id
        task_id: TaskId,
    },
}
