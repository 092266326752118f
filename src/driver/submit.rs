//! Magnet resolution and offline task submission.

use crate::error::{Error, Result};
use crate::provider::endpoint;
use crate::provider::models::{
    API_OK, ResolveData, ResolveRequest, ResolvedResource, SelectedResource, SubmitData,
    SubmitRequest,
};
use crate::types::{Event, FolderId, SubmittedTaskRecord, TaskId};
use std::collections::HashSet;
use std::path::Path;

use super::Pan123Driver;
use super::matching;
use super::tasks::LISTED_STATUSES;

impl Pan123Driver {
    /// Submit `magnet` as an offline task downloading into `save_path`
    ///
    /// On success the naming intent is recorded under the new task id. When
    /// the provider accepts the task but its id cannot be recovered, the
    /// submission still counts as successful; nothing is recorded and the task
    /// is later reported without a download directory.
    pub async fn submit(&self, magnet: &str, save_path: &str, target_name: Option<&str>) -> bool {
        match self.try_submit(magnet, save_path, target_name).await {
            Ok(Some(task_id)) => {
                tracing::info!(task_id = %task_id, save_path, "offline task submitted");
                true
            }
            Ok(None) => {
                tracing::warn!(save_path, "offline task submitted, but its id could not be recovered");
                true
            }
            Err(e) => {
                tracing::error!(save_path, error = %e, "offline task submission failed");
                false
            }
        }
    }

    async fn try_submit(
        &self,
        magnet: &str,
        save_path: &str,
        target_name: Option<&str>,
    ) -> Result<Option<TaskId>> {
        self.ensure_session().await?;

        let resources = self.resolve_resources(magnet).await?;
        let upload_dir = self.resolve_or_root(save_path).await;
        let returned_id = self.submit_resources(resources, upload_dir).await?;

        let target_name = target_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        let record_for = |task_id| SubmittedTaskRecord {
            task_id,
            save_path: save_path.to_string(),
            target_name: target_name.clone(),
        };

        let task_id = match returned_id {
            Some(task_id) => {
                self.state.records.insert(record_for(task_id)).await;
                Some(task_id)
            }
            None => match self.recover_task_id().await {
                // a concurrent submission may have adopted the same id first
                Some(task_id) => self
                    .state
                    .records
                    .insert_if_absent(record_for(task_id))
                    .await
                    .then_some(task_id),
                None => None,
            },
        };

        let Some(task_id) = task_id else {
            self.emit(Event::TaskIdUnresolved { name: target_name });
            return Ok(None);
        };

        self.emit(Event::TaskSubmitted {
            task_id,
            name: target_name,
            save_path: save_path.to_string(),
        });

        Ok(Some(task_id))
    }

    /// Ask the provider to split `magnet` into selectable resources
    ///
    /// Every file of every resource is selected.
    async fn resolve_resources(&self, magnet: &str) -> Result<Vec<SelectedResource>> {
        let data: Option<ResolveData> = self
            .api
            .post(endpoint::TASK_RESOLVE, &ResolveRequest { urls: magnet })
            .await?
            .into_data(endpoint::TASK_RESOLVE, API_OK)?;

        let list = data.and_then(|d| d.list).unwrap_or_default();
        if list.is_empty() {
            return Err(Error::missing(endpoint::TASK_RESOLVE, "resource list"));
        }

        list.into_iter().map(select_all_files).collect()
    }

    async fn submit_resources(
        &self,
        resources: Vec<SelectedResource>,
        upload_dir: FolderId,
    ) -> Result<Option<TaskId>> {
        let request = SubmitRequest {
            resource_list: resources,
            upload_dir: upload_dir.get(),
        };
        let data: Option<SubmitData> = self
            .api
            .post(endpoint::TASK_SUBMIT, &request)
            .await?
            .into_data(endpoint::TASK_SUBMIT, API_OK)?;

        Ok(data
            .and_then(|d| d.task_list)
            .and_then(|list| list.into_iter().find_map(|t| t.task_id))
            .filter(|&id| id > 0)
            .map(TaskId))
    }

    /// List tasks shortly after submission and adopt the first untracked one
    async fn recover_task_id(&self) -> Option<TaskId> {
        tokio::time::sleep(self.config.timing.task_lookup_delay).await;

        let listed = match self.fetch_offline_tasks(&LISTED_STATUSES).await {
            Ok(tasks) => tasks,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list tasks to recover submitted task id");
                return None;
            }
        };
        let listed: Vec<TaskId> = listed.iter().map(|t| TaskId(t.task_id)).collect();
        let tracked: HashSet<TaskId> = self.state.records.task_ids().await.into_iter().collect();

        let adopted = matching::adopt_first_untracked(&listed, &tracked);
        if let Some(id) = adopted {
            tracing::debug!(task_id = %id, "adopted untracked task as the submitted one");
        }
        adopted
    }
}

fn select_all_files(resource: ResolvedResource) -> Result<SelectedResource> {
    if resource.result != API_OK {
        return Err(Error::Protocol {
            endpoint: endpoint::TASK_RESOLVE.to_string(),
            code: resource.result,
            message: resource
                .err_msg
                .unwrap_or_else(|| format!("resource {} rejected", resource.id)),
        });
    }

    let file_ids: Vec<i64> = resource
        .files
        .unwrap_or_default()
        .into_iter()
        .map(|f| f.id)
        .filter(|&id| id > 0)
        .collect();
    if file_ids.is_empty() {
        return Err(Error::missing(endpoint::TASK_RESOLVE, "file list"));
    }

    Ok(SelectedResource {
        resource_id: resource.id,
        select_file_id: file_ids,
    })
}

/// Read the magnet link for a torrent file
///
/// A file whose content starts with `magnet:` yields that content. Otherwise a
/// file named after a 40-character hex or 32-character base32 info-hash yields
/// a magnet link built from the hash.
pub async fn read_magnet(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    let content = String::from_utf8_lossy(&bytes);
    let content = content.trim();
    if content.starts_with("magnet:") {
        return Ok(content.to_string());
    }

    path.file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| is_info_hash(stem))
        .map(|hash| format!("magnet:?xt=urn:btih:{hash}"))
        .ok_or_else(|| Error::InvalidMagnet(path.display().to_string()))
}

fn is_info_hash(s: &str) -> bool {
    match s.len() {
        40 => s.chars().all(|c| c.is_ascii_hexdigit()),
        32 => s
            .chars()
            .all(|c| c.is_ascii_alphabetic() || ('2'..='7').contains(&c)),
        _ => false,
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::models::ResolvedFile;

    const HEX_HASH: &str = "0123456789abcdef0123456789abcdef01234567";

    #[test]
    fn info_hash_formats() {
        assert!(is_info_hash(HEX_HASH));
        assert!(is_info_hash("ABCDEFGHIJKLMNOPQRSTUVWXYZ234567"));
        assert!(!is_info_hash("ABCDEFGHIJKLMNOPQRSTUVWXYZ234518"));
        assert!(!is_info_hash("episode"));
    }

    #[tokio::test]
    async fn magnet_content_is_used_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("episode.torrent");
        std::fs::write(&file, "  magnet:?xt=urn:btih:abc&dn=Show\n").unwrap();
        assert_eq!(
            read_magnet(&file).await.unwrap(),
            "magnet:?xt=urn:btih:abc&dn=Show"
        );
    }

    #[tokio::test]
    async fn hash_named_file_yields_magnet() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(format!("{HEX_HASH}.torrent"));
        std::fs::write(&file, [0xd8, 0x00, 0xff]).unwrap();
        assert_eq!(
            read_magnet(&file).await.unwrap(),
            format!("magnet:?xt=urn:btih:{HEX_HASH}")
        );
    }

    #[tokio::test]
    async fn unrecognized_torrent_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("episode.torrent");
        std::fs::write(&file, "d8:announce").unwrap();
        assert!(matches!(
            read_magnet(&file).await,
            Err(Error::InvalidMagnet(_))
        ));
        assert!(matches!(
            read_magnet(&dir.path().join("missing.torrent")).await,
            Err(Error::Io(_))
        ));
    }

    #[test]
    fn resources_select_every_positive_file() {
        let selected = select_all_files(ResolvedResource {
            id: 5,
            result: 0,
            err_msg: None,
            files: Some(vec![
                ResolvedFile { id: 1 },
                ResolvedFile { id: 0 },
                ResolvedFile { id: 3 },
            ]),
        })
        .unwrap();
        assert_eq!(selected.resource_id, 5);
        assert_eq!(selected.select_file_id, vec![1, 3]);
    }

    #[test]
    fn rejected_or_empty_resources_abort() {
        let rejected = select_all_files(ResolvedResource {
            id: 5,
            result: 1,
            err_msg: Some("bad magnet".into()),
            files: Some(vec![ResolvedFile { id: 1 }]),
        })
        .unwrap_err();
        assert!(rejected.to_string().contains("bad magnet"));

        assert!(
            select_all_files(ResolvedResource {
                id: 5,
                result: 0,
                err_msg: None,
                files: None,
            })
            .is_err()
        );
    }
}
