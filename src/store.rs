//! Shared in-process state: the session cache and the submission records
//!
//! Both stores are injected into every driver instance through [`SharedState`].
//! An application creates one `SharedState` and hands clones of it to all
//! drivers; tests create a fresh one per case. Nothing here is persisted, so a
//! restart loses every record and tasks submitted before it are reported with
//! an empty download directory.

use crate::types::{Session, SubmittedTaskRecord, TaskId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// State shared by all driver instances of a process (cloneable - all fields are Arc-wrapped)
#[derive(Clone, Debug, Default)]
pub struct SharedState {
    /// The single cached login session
    pub sessions: Arc<SessionCache>,
    /// Naming intent recorded per submitted task
    pub records: Arc<TaskRecordStore>,
}

impl SharedState {
    /// Create empty shared state
    pub fn new() -> Self {
        Self::default()
    }
}

/// Holds at most one login session
///
/// A new login replaces the cached session wholesale, whichever account it
/// belongs to.
#[derive(Debug, Default)]
pub struct SessionCache {
    inner: RwLock<Option<Session>>,
}

impl SessionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the cached session
    pub async fn get(&self) -> Option<Session> {
        self.inner.read().await.clone()
    }

    /// Cached bearer token, if any
    pub async fn token(&self) -> Option<String> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Replace the cached session
    pub async fn replace(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    /// Drop the cached session
    pub async fn invalidate(&self) {
        *self.inner.write().await = None;
    }
}

/// Submission records keyed by task id
#[derive(Debug, Default)]
pub struct TaskRecordStore {
    inner: RwLock<HashMap<TaskId, SubmittedTaskRecord>>,
}

impl TaskRecordStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for its task id
    pub async fn insert(&self, record: SubmittedTaskRecord) {
        self.inner.write().await.insert(record.task_id, record);
    }

    /// Insert the record only if no record exists for its task id
    ///
    /// Returns true when the record was inserted.
    pub async fn insert_if_absent(&self, record: SubmittedTaskRecord) -> bool {
        let mut map = self.inner.write().await;
        if map.contains_key(&record.task_id) {
            return false;
        }
        map.insert(record.task_id, record);
        true
    }

    /// Clone of the record for a task
    pub async fn get(&self, task_id: TaskId) -> Option<SubmittedTaskRecord> {
        self.inner.read().await.get(&task_id).cloned()
    }

    /// True when a record exists for the task
    pub async fn contains(&self, task_id: TaskId) -> bool {
        self.inner.read().await.contains_key(&task_id)
    }

    /// Remove and return the record for a task
    ///
    /// Only one caller can take a given record, which is what makes
    /// reconciliation run at most once per task.
    pub async fn take(&self, task_id: TaskId) -> Option<SubmittedTaskRecord> {
        self.inner.write().await.remove(&task_id)
    }

    /// Remove the record for a task; removing a missing record is a no-op
    pub async fn remove(&self, task_id: TaskId) {
        self.inner.write().await.remove(&task_id);
    }

    /// Number of records
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// True when no records exist
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Task ids that currently have a record
    pub async fn task_ids(&self) -> Vec<TaskId> {
        self.inner.read().await.keys().copied().collect()
    }
}
