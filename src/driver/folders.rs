//! Save-path to folder-id resolution.
//!
//! Folder ids are never cached: every lookup walks the path from the root,
//! listing each level and creating missing segments.

use crate::error::{Error, Result};
use crate::provider::endpoint;
use crate::provider::models::{
    API_OK, CreateFolderData, CreateFolderRequest, ENTRY_TYPE_DIR, FileEntry, FileListData,
};
use crate::types::FolderId;

use super::Pan123Driver;

impl Pan123Driver {
    /// Resolve `path` to a folder id, creating missing segments
    ///
    /// An empty path or `/` is the drive root and needs no network call.
    /// Resolving an existing path creates nothing. Any segment that can be
    /// neither found nor created aborts the whole resolution.
    pub async fn resolve_or_create(&self, path: &str) -> Result<FolderId> {
        let segments = path_segments(path);
        if segments.is_empty() {
            return Ok(FolderId::ROOT);
        }
        self.ensure_session().await?;

        let mut current = FolderId::ROOT;
        for segment in segments {
            current = match self.find_folder(current, segment).await? {
                Some(id) => id,
                None => self.create_folder(current, segment).await?,
            };
        }

        tracing::debug!(path, folder_id = %current, "resolved save path");
        Ok(current)
    }

    /// Resolve `path`, falling back to the drive root on failure
    pub(crate) async fn resolve_or_root(&self, path: &str) -> FolderId {
        match self.resolve_or_create(path).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(path, error = %e, "cannot resolve save path, using drive root");
                FolderId::ROOT
            }
        }
    }

    /// List the first page of `parent`'s children, at most `limit` entries
    pub(crate) async fn list_children(&self, parent: FolderId, limit: u32) -> Result<Vec<FileEntry>> {
        let query = [
            ("driveId", "0".to_string()),
            ("limit", limit.to_string()),
            ("parentFileId", parent.to_string()),
            ("trashed", "false".to_string()),
            ("orderBy", "file_id".to_string()),
            ("orderDirection", "desc".to_string()),
        ];
        let data: Option<FileListData> = self
            .api
            .get(endpoint::FILE_LIST, &query)
            .await?
            .into_data(endpoint::FILE_LIST, API_OK)?;

        Ok(data.and_then(|d| d.info_list).unwrap_or_default())
    }

    /// Directory named exactly `name` directly under `parent`
    pub(crate) async fn find_folder(&self, parent: FolderId, name: &str) -> Result<Option<FolderId>> {
        let children = self
            .list_children(parent, self.config.listing.page_size)
            .await?;
        Ok(children
            .into_iter()
            .find(|entry| entry.is_dir() && entry.file_name == name)
            .map(|entry| FolderId(entry.file_id)))
    }

    /// Create directory `name` under `parent`
    ///
    /// When the response carries no usable id, the parent is listed again
    /// after the folder settle delay and the lookup is retried once.
    async fn create_folder(&self, parent: FolderId, name: &str) -> Result<FolderId> {
        let request = CreateFolderRequest {
            drive_id: 0,
            etag: "",
            file_name: name,
            parent_file_id: parent.get(),
            size: 0,
            kind: ENTRY_TYPE_DIR,
        };
        let created: Option<CreateFolderData> = self
            .api
            .post(endpoint::FOLDER_CREATE, &request)
            .await?
            .into_data(endpoint::FOLDER_CREATE, API_OK)?;

        if let Some(id) = created.and_then(|d| d.file_id).filter(|&id| id > 0) {
            tracing::info!(parent = %parent, name, folder_id = id, "created folder");
            return Ok(FolderId(id));
        }

        tracing::debug!(parent = %parent, name, "folder creation returned no id, listing again");
        tokio::time::sleep(self.config.timing.folder_settle).await;
        match self.find_folder(parent, name).await? {
            Some(id) => {
                tracing::info!(parent = %parent, name, folder_id = %id, "created folder");
                Ok(id)
            }
            None => Err(Error::Consistency(format!(
                "folder '{name}' not visible under {parent} after creation"
            ))),
        }
    }
}

/// Path segments split on `/`; blank segments are dropped, others kept verbatim
fn path_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}
