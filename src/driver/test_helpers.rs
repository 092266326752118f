//! Shared test helpers for creating Pan123Driver instances against a mock provider.

use crate::config::{Config, Credentials};
use crate::driver::Pan123Driver;
use crate::store::SharedState;
use crate::types::{Session, SubmittedTaskRecord, TaskId};
use chrono::Utc;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub(crate) const TEST_USER: &str = "user@example.com";
pub(crate) const TEST_PASSWORD: &str = "secret";
pub(crate) const TEST_TOKEN: &str = "seeded-token";

/// Config pointing both API roots at `server`, with every settle delay at zero
pub(crate) fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.credentials = Credentials::new(TEST_USER, TEST_PASSWORD);
    config.provider.base_url = server.uri();
    config.provider.login_url = format!("{}/login/api", server.uri());
    config.timing.folder_settle = Duration::ZERO;
    config.timing.cleanup_settle = Duration::ZERO;
    config.timing.task_lookup_delay = Duration::ZERO;
    config
}

/// Session for the test account, valid for another hour
pub(crate) fn fresh_session() -> Session {
    Session {
        username: TEST_USER.to_string(),
        access_token: TEST_TOKEN.to_string(),
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}

/// Driver with an empty session cache
pub(crate) fn create_logged_out_driver(server: &MockServer) -> Pan123Driver {
    Pan123Driver::new(test_config(server), SharedState::new()).unwrap()
}

/// Driver whose session cache already holds a usable token
pub(crate) async fn create_test_driver(server: &MockServer) -> Pan123Driver {
    let state = SharedState::new();
    state.sessions.replace(fresh_session()).await;
    Pan123Driver::new(test_config(server), state).unwrap()
}

pub(crate) fn record(task_id: i64, save_path: &str, target_name: Option<&str>) -> SubmittedTaskRecord {
    SubmittedTaskRecord {
        task_id: TaskId(task_id),
        save_path: save_path.to_string(),
        target_name: target_name.map(str::to_string),
    }
}

/// Successful `/b/api` response carrying `data`
pub(crate) fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "ok", "data": data}))
}

/// Failed `/b/api` response with the given code
pub(crate) fn failure(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": code, "message": message, "data": null}))
}

pub(crate) fn dir(id: i64, name: &str) -> Value {
    json!({"FileId": id, "FileName": name, "Type": 1})
}

pub(crate) fn file(id: i64, name: &str) -> Value {
    json!({"FileId": id, "FileName": name, "Type": 0})
}

/// Offline task listing entry
pub(crate) fn offline_task(task_id: i64, name: &str, status: i64, progress: f64, upload_dir: i64) -> Value {
    json!({
        "task_id": task_id,
        "name": name,
        "size": 1_073_741_824i64,
        "status": status,
        "progress": progress,
        "upload_idr": upload_dir
    })
}

/// Serve a directory listing for `parent`
pub(crate) async fn mount_listing(server: &MockServer, parent: i64, entries: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/b/api/file/list/new"))
        .and(query_param("parentFileId", parent.to_string()))
        .respond_with(ok(json!({"InfoList": entries})))
        .mount(server)
        .await;
}

/// Serve the offline task listing
pub(crate) async fn mount_task_list(server: &MockServer, tasks: Vec<Value>) {
    Mock::given(method("POST"))
        .and(path("/b/api/offline_download/task/list"))
        .respond_with(ok(json!({"list": tasks})))
        .mount(server)
        .await;
}
