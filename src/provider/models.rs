//! Request and response payloads of the provider API

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Result code of a successful login
pub(crate) const LOGIN_OK: i64 = 200;

/// Result code of a successful `/b/api` call
pub(crate) const API_OK: i64 = 0;

/// Directory entry type in file listings
pub(crate) const ENTRY_TYPE_DIR: i64 = 1;

/// Response envelope shared by every endpoint
///
/// `data` is kept as raw JSON until the code has been checked, because failed
/// calls often carry a payload of a different shape.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default = "missing_code")]
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) data: Option<serde_json::Value>,
}

fn missing_code() -> i64 {
    -1
}

impl Envelope {
    /// Check the result code and decode `data`
    ///
    /// `Ok(None)` means success with an absent or null payload.
    pub(crate) fn into_data<T: DeserializeOwned>(
        self,
        endpoint: &str,
        success: i64,
    ) -> Result<Option<T>> {
        if self.code != success {
            return Err(Error::Protocol {
                endpoint: endpoint.to_string(),
                code: self.code,
                message: self.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        match self.data {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    /// Check the result code, ignoring any payload
    pub(crate) fn ensure(self, endpoint: &str, success: i64) -> Result<()> {
        self.into_data::<serde_json::Value>(endpoint, success)
            .map(|_| ())
    }
}

// ─── Login ───────────────────────────────────────────────────────────────

/// Login body; email and phone accounts use different field sets
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(crate) enum SignInRequest<'a> {
    Email {
        mail: &'a str,
        password: &'a str,
        #[serde(rename = "type")]
        kind: u8,
    },
    Phone {
        passport: &'a str,
        password: &'a str,
        remember: bool,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct SignInData {
    #[serde(default)]
    pub(crate) token: Option<String>,
}

// ─── Offline tasks ───────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub(crate) struct ResolveRequest<'a> {
    pub(crate) urls: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolveData {
    #[serde(default)]
    pub(crate) list: Option<Vec<ResolvedResource>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolvedResource {
    pub(crate) id: i64,
    #[serde(default = "missing_code")]
    pub(crate) result: i64,
    #[serde(default)]
    pub(crate) err_msg: Option<String>,
    #[serde(default)]
    pub(crate) files: Option<Vec<ResolvedFile>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolvedFile {
    pub(crate) id: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitRequest {
    pub(crate) resource_list: Vec<SelectedResource>,
    pub(crate) upload_dir: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct SelectedResource {
    pub(crate) resource_id: i64,
    pub(crate) select_file_id: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitData {
    #[serde(default)]
    pub(crate) task_list: Option<Vec<SubmittedTask>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmittedTask {
    #[serde(default)]
    pub(crate) task_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskListRequest<'a> {
    pub(crate) current_page: u32,
    pub(crate) page_size: u32,
    pub(crate) status_arr: &'a [i64],
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskListData {
    #[serde(default)]
    pub(crate) list: Option<Vec<OfflineTask>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct OfflineTask {
    pub(crate) task_id: i64,
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Null for tasks that have not started fetching
    #[serde(default)]
    pub(crate) size: Option<i64>,
    #[serde(default)]
    pub(crate) status: Option<i64>,
    /// Only meaningful while downloading; null elsewhere
    #[serde(default)]
    pub(crate) progress: Option<f64>,
    /// Destination folder, spelled this way by the provider
    #[serde(default)]
    pub(crate) upload_idr: Option<i64>,
    #[serde(default)]
    pub(crate) upload_dir: Option<i64>,
}

impl OfflineTask {
    /// Destination folder id, if the provider reported a usable one
    pub(crate) fn destination_folder(&self) -> Option<i64> {
        self.upload_idr
            .or(self.upload_dir)
            .filter(|&id| id != 0)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TaskDeleteRequest {
    pub(crate) task_ids: Vec<i64>,
}

// ─── Files ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct FileListData {
    #[serde(rename = "InfoList", default)]
    pub(crate) info_list: Option<Vec<FileEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FileEntry {
    #[serde(rename = "FileId")]
    pub(crate) file_id: i64,
    #[serde(rename = "FileName", default)]
    pub(crate) file_name: String,
    #[serde(rename = "Type", default)]
    pub(crate) kind: i64,
}

impl FileEntry {
    pub(crate) fn is_dir(&self) -> bool {
        self.kind == ENTRY_TYPE_DIR
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateFolderRequest<'a> {
    pub(crate) drive_id: i64,
    pub(crate) etag: &'a str,
    pub(crate) file_name: &'a str,
    pub(crate) parent_file_id: i64,
    pub(crate) size: i64,
    #[serde(rename = "type")]
    pub(crate) kind: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateFolderData {
    #[serde(rename = "FileId", default)]
    pub(crate) file_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RenameRequest<'a> {
    pub(crate) drive_id: i64,
    pub(crate) file_id: i64,
    pub(crate) file_name: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct FileRef {
    #[serde(rename = "FileId")]
    pub(crate) file_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MoveRequest {
    pub(crate) file_id_list: Vec<FileRef>,
    pub(crate) parent_file_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TrashRequest {
    pub(crate) drive_id: i64,
    /// true moves to the trash
    pub(crate) operation: bool,
    pub(crate) file_trash_info_list: Vec<FileRef>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> Envelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn envelope_success_with_payload() {
        let env = envelope(json!({"code": 0, "data": {"InfoList": [
            {"FileId": 11, "FileName": "Show", "Type": 1},
            {"FileId": 12, "FileName": "a.mkv", "Type": 0}
        ]}}));
        let data: FileListData = env.into_data("/file/list/new", API_OK).unwrap().unwrap();
        let list = data.info_list.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].is_dir());
        assert!(!list[1].is_dir());
    }

    #[test]
    fn envelope_null_data_is_none() {
        let env = envelope(json!({"code": 0, "data": null}));
        let data: Option<CreateFolderData> = env.into_data("/file/upload_request", API_OK).unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn envelope_failure_skips_payload_decoding() {
        // payload shape does not match, but the code is checked first
        let env = envelope(json!({"code": 401, "message": "token expired", "data": "nope"}));
        let err = env.into_data::<FileListData>("/file/list/new", API_OK).unwrap_err();
        match err {
            Error::Protocol { code, message, .. } => {
                assert_eq!(code, 401);
                assert_eq!(message, "token expired");
            }
            other => panic!("expected Protocol error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_without_code_is_a_failure() {
        let env = envelope(json!({"data": {}}));
        assert!(env.ensure("/user/info", API_OK).is_err());
    }

    #[test]
    fn sign_in_bodies_differ_by_account_kind() {
        let email = serde_json::to_value(SignInRequest::Email {
            mail: "a@b.c",
            password: "pw",
            kind: 2,
        })
        .unwrap();
        assert_eq!(email, json!({"mail": "a@b.c", "password": "pw", "type": 2}));

        let phone = serde_json::to_value(SignInRequest::Phone {
            passport: "13800000000",
            password: "pw",
            remember: true,
        })
        .unwrap();
        assert_eq!(
            phone,
            json!({"passport": "13800000000", "password": "pw", "remember": true})
        );
    }

    #[test]
    fn file_request_bodies_use_provider_casing() {
        let create = serde_json::to_value(CreateFolderRequest {
            drive_id: 0,
            etag: "",
            file_name: "Show",
            parent_file_id: 5,
            size: 0,
            kind: ENTRY_TYPE_DIR,
        })
        .unwrap();
        assert_eq!(
            create,
            json!({"driveId": 0, "etag": "", "fileName": "Show", "parentFileId": 5, "size": 0, "type": 1})
        );

        let mv = serde_json::to_value(MoveRequest {
            file_id_list: vec![FileRef { file_id: 9 }],
            parent_file_id: 5,
        })
        .unwrap();
        assert_eq!(mv, json!({"fileIdList": [{"FileId": 9}], "parentFileId": 5}));

        let trash = serde_json::to_value(TrashRequest {
            drive_id: 0,
            operation: true,
            file_trash_info_list: vec![FileRef { file_id: 3 }],
        })
        .unwrap();
        assert_eq!(
            trash,
            json!({"driveId": 0, "operation": true, "fileTrashInfoList": [{"FileId": 3}]})
        );
    }

    #[test]
    fn offline_task_destination_prefers_provider_spelling() {
        let task: OfflineTask = serde_json::from_value(json!({
            "task_id": 1, "name": "x", "size": 1, "status": 2, "progress": 1.0,
            "upload_idr": 77, "upload_dir": 88
        }))
        .unwrap();
        assert_eq!(task.destination_folder(), Some(77));

        let task: OfflineTask = serde_json::from_value(json!({
            "task_id": 1, "name": "x", "status": 2, "upload_dir": 88
        }))
        .unwrap();
        assert_eq!(task.destination_folder(), Some(88));

        let task: OfflineTask =
            serde_json::from_value(json!({"task_id": 1, "upload_idr": 0})).unwrap();
        assert_eq!(task.destination_folder(), None);
    }

    #[test]
    fn offline_task_tolerates_null_fields() {
        let task: OfflineTask = serde_json::from_value(json!({
            "task_id": 4, "name": null, "size": null, "status": 0, "progress": null
        }))
        .unwrap();
        assert_eq!(task.name, None);
        assert_eq!(task.size, None);
        assert_eq!(task.status, Some(0));
        assert_eq!(task.progress, None);
    }
}
