//! 123pan offline-download driver split into focused submodules.
//!
//! The `Pan123Driver` struct and its methods are organized by component:
//! - [`session`] - Login, token verification and session reuse
//! - [`folders`] - Save-path to folder-id resolution
//! - [`files`] - Move, rename and trash calls
//! - [`submit`] - Magnet resolution and offline task submission
//! - [`tasks`] - Offline task listing and deletion
//! - [`reconcile`] - Post-completion file placement and renaming
//! - [`matching`] - Best-effort heuristics used by submission and reconciliation

mod files;
mod folders;
pub mod matching;
mod reconcile;
mod session;
mod submit;
mod tasks;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use submit::read_magnet;

use crate::backend::DownloadBackend;
use crate::config::Config;
use crate::error::Result;
use crate::provider::ApiClient;
use crate::renamer::{ExtensionRenamer, Renamer};
use crate::store::SharedState;
use crate::types::{Episode, Event, RemoteTask, Show};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Capacity of the event channel; slow subscribers lag and miss events
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Driver instance (cloneable - all fields are Arc-wrapped)
///
/// Instances are cheap. The pipeline may create one per invocation as long as
/// they all share the same [`SharedState`].
#[derive(Clone)]
pub struct Pan123Driver {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Provider HTTP client
    pub(crate) api: Arc<ApiClient>,
    /// Session cache and submission records shared with other instances
    pub(crate) state: SharedState,
    /// Naming collaborator used when no template was recorded
    pub(crate) renamer: Arc<dyn Renamer>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl Pan123Driver {
    /// Create a driver over the given shared state
    ///
    /// Fails only when the configuration is invalid or the HTTP client cannot
    /// be built. No network call is made here.
    pub fn new(config: Config, state: SharedState) -> Result<Self> {
        config.validate()?;
        let api = ApiClient::new(&config, state.sessions.clone())?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            config: Arc::new(config),
            api: Arc::new(api),
            state,
            renamer: Arc::new(ExtensionRenamer),
            event_tx,
        })
    }

    /// Replace the renaming collaborator
    pub fn with_renamer(mut self, renamer: Arc<dyn Renamer>) -> Self {
        self.renamer = renamer;
        self
    }

    /// Subscribe to driver events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Shared state this driver reads and writes
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn emit(&self, event: Event) {
        // no subscribers is fine
        let _ = self.event_tx.send(event);
    }
}

impl std::fmt::Debug for Pan123Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pan123Driver")
            .field("api", &self.api)
            .field("renamer", &self.renamer.name())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl DownloadBackend for Pan123Driver {
    async fn login(&self, test: bool) -> bool {
        self.authenticate(test).await
    }

    async fn download(
        &self,
        show: &Show,
        episode: &Episode,
        save_path: &str,
        torrent_file: &Path,
        is_special: bool,
    ) -> bool {
        let magnet = match read_magnet(torrent_file).await {
            Ok(magnet) => magnet,
            Err(e) => {
                tracing::error!(
                    file = %torrent_file.display(),
                    error = %e,
                    "cannot read magnet link"
                );
                return false;
            }
        };

        tracing::debug!(
            show = %show.title,
            episode = %episode.title,
            is_special,
            "submitting episode"
        );
        self.submit(&magnet, save_path, episode.rename.as_deref()).await
    }

    async fn torrents_infos(&self) -> Vec<RemoteTask> {
        self.list_tasks().await
    }

    async fn delete(&self, task: &RemoteTask, delete_files: bool) -> bool {
        if delete_files {
            tracing::debug!(task_id = %task.task_id, "file deletion not supported, removing task only");
        }
        if let Err(e) = self.ensure_session().await {
            tracing::error!(task_id = %task.task_id, error = %e, "cannot delete task");
            return false;
        }
        match self.delete_offline_task(task.task_id).await {
            Ok(()) => {
                self.state.records.remove(task.task_id).await;
                true
            }
            Err(e) => {
                tracing::warn!(task_id = %task.task_id, error = %e, "failed to delete offline task");
                false
            }
        }
    }

    async fn rename(&self, task: &mut RemoteTask) {
        self.reconcile(task).await;
    }

    async fn add_tags(&self, task: &RemoteTask, tag: &str) -> bool {
        tracing::debug!(task_id = %task.task_id, tag, "tags are not supported");
        false
    }

    async fn update_trackers(&self, trackers: &HashSet<String>) {
        tracing::debug!(count = trackers.len(), "trackers are not supported");
    }

    async fn set_save_path(&self, task: &RemoteTask, path: &str) {
        tracing::debug!(task_id = %task.task_id, path, "save path changes are not supported");
    }

    fn name(&self) -> &'static str {
        "123pan"
    }
}
