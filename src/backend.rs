//! Download backend contract
//!
//! The acquisition pipeline drives every backend (cloud drives, torrent clients)
//! through this trait. Operations never fail with an error: each one reports
//! `false`, an empty list, or silently skips, and the pipeline retries on its
//! next cycle.

use crate::types::{Episode, RemoteTask, Show};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;

/// Contract between the acquisition pipeline and a download backend
///
/// # Examples
///
/// ```no_run
/// use pan123_dl::{Config, Credentials, DownloadBackend, Pan123Driver, SharedState};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.credentials = Credentials::new("user@example.com", "secret");
///
/// let driver = Pan123Driver::new(config, SharedState::new())?;
/// if driver.login(true).await {
///     for task in driver.torrents_infos().await {
///         println!("{} {} {:.0}%", task.task_id, task.state, task.progress_percent);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait DownloadBackend: Send + Sync {
    /// Establish (or reuse) a session
    ///
    /// `test` is true for an explicit connectivity check from an admin surface;
    /// it forces a fresh login instead of reusing a cached token.
    async fn login(&self, test: bool) -> bool;

    /// Submit an episode for download into `save_path`
    ///
    /// `torrent_file` holds the magnet link (or is named after the info-hash).
    async fn download(
        &self,
        show: &Show,
        episode: &Episode,
        save_path: &str,
        torrent_file: &Path,
        is_special: bool,
    ) -> bool;

    /// Current tasks known to the backend
    async fn torrents_infos(&self) -> Vec<RemoteTask>;

    /// Remove a task from the backend
    async fn delete(&self, task: &RemoteTask, delete_files: bool) -> bool;

    /// Bring a completed task's files to their final names and location
    async fn rename(&self, task: &mut RemoteTask);

    /// Attach a tag to a task; returns false when unsupported
    async fn add_tags(&self, task: &RemoteTask, tag: &str) -> bool;

    /// Replace the tracker list used for new tasks
    async fn update_trackers(&self, trackers: &HashSet<String>);

    /// Change where a task stores its files
    async fn set_save_path(&self, task: &RemoteTask, path: &str);

    /// Human-readable backend name
    fn name(&self) -> &'static str;
}
