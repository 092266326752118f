//! # pan123-dl
//!
//! 123pan offline-download backend for anime episode acquisition pipelines.
//!
//! ## Design Philosophy
//!
//! pan123-dl is designed to be:
//! - **Library-first** - No CLI or scheduler, the pipeline drives it
//! - **Never fatal** - Every operation degrades to `false`, an empty list or a logged skip
//! - **Injectable state** - Session cache and submission records are passed in, not global
//! - **Event-driven** - Consumers subscribe to events describing what changed remotely
//!
//! ## Lifecycle
//!
//! 1. [`DownloadBackend::download`] resolves a magnet link, submits an offline
//!    task into the save path and records the naming intent.
//! 2. [`DownloadBackend::torrents_infos`] polls the provider and normalizes
//!    task states.
//! 3. [`DownloadBackend::rename`] on a completed task finds its files, moves
//!    them into the save path, renames them and trashes emptied folders.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pan123_dl::{Config, Credentials, DownloadBackend, Episode, Pan123Driver, SharedState, Show, TaskState};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.credentials = Credentials::new("user@example.com", "secret");
//!
//!     // one SharedState per process, cloned into every driver
//!     let state = SharedState::new();
//!     let driver = Pan123Driver::new(config, state.clone())?;
//!
//!     let mut events = driver.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let episode = Episode {
//!         title: "[Group] Show - 01".into(),
//!         rename: Some("Show S01E01".into()),
//!         subgroup: Some("Group".into()),
//!     };
//!     let show = Show { title: "Show".into() };
//!     driver
//!         .download(&show, &episode, "/Show/S1", Path::new("episode.torrent"), false)
//!         .await;
//!
//!     for mut task in driver.torrents_infos().await {
//!         if task.state == TaskState::Completed {
//!             driver.rename(&mut task).await;
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Download backend contract
pub mod backend;
/// Configuration types
pub mod config;
/// Driver implementation (decomposed into focused submodules)
pub mod driver;
/// Error types
pub mod error;
/// Provider HTTP client and request signing
pub mod provider;
/// Renaming collaborator
pub mod renamer;
/// Shared session cache and submission records
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use backend::DownloadBackend;
pub use config::{Config, Credentials, ListingConfig, ProviderConfig, SessionConfig, TimingConfig};
pub use driver::{Pan123Driver, read_magnet};
pub use error::{AuthError, Error, Result};
pub use renamer::{ExtensionRenamer, RenameHint, Renamer};
pub use store::{SessionCache, SharedState, TaskRecordStore};
pub use types::{
    DRIVER_TAG, Episode, Event, FileId, FolderId, RemoteFileCandidate, RemoteTask, Session, Show,
    SubmittedTaskRecord, TaskId, TaskState,
};
