//! Offline task listing and deletion.

use crate::error::{Error, Result};
use crate::provider::endpoint;
use crate::provider::models::{API_OK, OfflineTask, TaskDeleteRequest, TaskListData, TaskListRequest};
use crate::types::{DRIVER_TAG, Event, RemoteTask, TaskId, TaskState};

use super::Pan123Driver;

/// Status codes requested when polling: queued, downloading, completed, failed
pub(crate) const LISTED_STATUSES: [i64; 4] = [0, 1, 2, 3];

impl Pan123Driver {
    /// Current offline tasks, normalized
    ///
    /// Tasks submitted by this process carry their recorded save path as
    /// `download_dir`; all others report it empty. Never fails: any error
    /// yields an empty list.
    pub async fn list_tasks(&self) -> Vec<RemoteTask> {
        if let Err(e) = self.ensure_session().await {
            tracing::error!(error = %e, "cannot list offline tasks");
            return Vec::new();
        }

        let listed = match self.fetch_offline_tasks(&LISTED_STATUSES).await {
            Ok(listed) => listed,
            Err(e) => {
                tracing::error!(error = %e, "failed to list offline tasks");
                return Vec::new();
            }
        };

        let mut tasks = Vec::with_capacity(listed.len());
        for task in listed {
            if let Some(task) = self.normalize(task).await {
                tasks.push(task);
            }
        }
        tracing::debug!(count = tasks.len(), "listed offline tasks");
        tasks
    }

    /// Raw first page of offline tasks in any of `statuses`
    pub(crate) async fn fetch_offline_tasks(&self, statuses: &[i64]) -> Result<Vec<OfflineTask>> {
        let request = TaskListRequest {
            current_page: 1,
            page_size: self.config.listing.page_size,
            status_arr: statuses,
        };
        let data: Option<TaskListData> = self
            .api
            .post(endpoint::TASK_LIST, &request)
            .await?
            .into_data(endpoint::TASK_LIST, API_OK)?;

        Ok(data.and_then(|d| d.list).unwrap_or_default())
    }

    /// Raw listing entry for one completed task
    ///
    /// Only completed tasks are requested, so queued and running ones cannot
    /// push it off the single page.
    pub(crate) async fn find_completed_task(&self, task_id: TaskId) -> Result<OfflineTask> {
        self.fetch_offline_tasks(&[TaskState::Completed.code()])
            .await?
            .into_iter()
            .find(|task| task.task_id == task_id.get())
            .ok_or_else(|| Error::NotFound(format!("offline task {task_id}")))
    }

    /// Delete the provider's record of an offline task
    ///
    /// Downloaded files stay in the drive.
    pub async fn delete_offline_task(&self, task_id: TaskId) -> Result<()> {
        let request = TaskDeleteRequest {
            task_ids: vec![task_id.get()],
        };
        self.api
            .post(endpoint::TASK_DELETE, &request)
            .await?
            .ensure(endpoint::TASK_DELETE, API_OK)?;

        tracing::info!(task_id = %task_id, "deleted offline task");
        self.emit(Event::OfflineTaskDeleted { task_id });
        Ok(())
    }

    async fn normalize(&self, task: OfflineTask) -> Option<RemoteTask> {
        let Some(state) = task.status.and_then(TaskState::from_code) else {
            tracing::debug!(task_id = task.task_id, status = ?task.status, "skipping task with unknown status");
            return None;
        };

        let task_id = TaskId(task.task_id);
        let download_dir = self
            .state
            .records
            .get(task_id)
            .await
            .map(|record| record.save_path)
            .unwrap_or_default();

        Some(RemoteTask {
            task_id,
            display_name: task.name.unwrap_or_default(),
            size_bytes: task.size.and_then(|size| u64::try_from(size).ok()).unwrap_or(0),
            state,
            progress_percent: state.progress_percent(task.progress.unwrap_or(0.0)),
            download_dir,
            tags: vec![DRIVER_TAG.to_string()],
        })
    }
}
