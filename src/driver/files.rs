//! Move, rename and trash calls on remote files.

use crate::error::Result;
use crate::provider::endpoint;
use crate::provider::models::{API_OK, FileRef, MoveRequest, RenameRequest, TrashRequest};
use crate::types::{FileId, FolderId};

use super::Pan123Driver;

impl Pan123Driver {
    pub(crate) async fn move_file(&self, file_id: FileId, to_folder: FolderId) -> Result<()> {
        let request = MoveRequest {
            file_id_list: vec![FileRef {
                file_id: file_id.get(),
            }],
            parent_file_id: to_folder.get(),
        };
        self.api
            .post(endpoint::FILE_MOVE, &request)
            .await?
            .ensure(endpoint::FILE_MOVE, API_OK)
    }

    pub(crate) async fn rename_file(&self, file_id: FileId, new_name: &str) -> Result<()> {
        let request = RenameRequest {
            drive_id: 0,
            file_id: file_id.get(),
            file_name: new_name,
        };
        self.api
            .post(endpoint::FILE_RENAME, &request)
            .await?
            .ensure(endpoint::FILE_RENAME, API_OK)
    }

    /// Send a file or folder to the provider's trash
    pub(crate) async fn trash(&self, file_id: FileId) -> Result<()> {
        let request = TrashRequest {
            drive_id: 0,
            operation: true,
            file_trash_info_list: vec![FileRef {
                file_id: file_id.get(),
            }],
        };
        self.api
            .post(endpoint::FILE_TRASH, &request)
            .await?
            .ensure(endpoint::FILE_TRASH, API_OK)
    }

    /// Trash `folder` only if a fresh listing shows it empty
    ///
    /// Returns true when the folder was trashed. A failed listing leaves the
    /// folder in place.
    pub(crate) async fn trash_if_empty(&self, folder: FolderId) -> Result<bool> {
        if folder.is_root() {
            return Ok(false);
        }

        let remaining = self
            .list_children(folder, self.config.listing.empty_check_limit)
            .await?;
        if !remaining.is_empty() {
            tracing::debug!(folder_id = %folder, entries = remaining.len(), "source folder not empty, keeping it");
            return Ok(false);
        }

        self.trash(folder.into()).await?;
        Ok(true)
    }
}
