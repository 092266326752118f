//! Common test utilities for pan123-dl contract tests

use pan123_dl::{Config, Credentials};
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER: &str = "user@example.com";
pub const PASSWORD: &str = "secret";

/// Config pointing at `server` with zero settle delays
pub fn mock_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.credentials = Credentials::new(USER, PASSWORD);
    config.provider.base_url = server.uri();
    config.provider.login_url = format!("{}/login/api", server.uri());
    config.timing.folder_settle = Duration::ZERO;
    config.timing.cleanup_settle = Duration::ZERO;
    config.timing.task_lookup_delay = Duration::ZERO;
    config
}

pub fn api_ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "ok", "data": data}))
}

/// Accept logins, handing out `token`; expect exactly `times` of them
pub async fn mount_login(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/login/api/user/sign_in"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 200, "message": "success", "data": {"token": token}})),
        )
        .expect(times)
        .mount(server)
        .await;
}

/// Accept token verification
pub async fn mount_user_info(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/b/api/user/info"))
        .respond_with(api_ok(json!({"uid": 1})))
        .mount(server)
        .await;
}
