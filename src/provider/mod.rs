//! HTTP access to the provider API
//!
//! [`ApiClient`] owns the `reqwest` client, attaches the identification headers
//! and the bearer token, signs `/b/api` URLs and decodes the response envelope.
//! It performs no retries: failures surface as [`Error`] and the driver decides
//! how to degrade.

pub(crate) mod models;
pub mod sign;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::SessionCache;
use models::Envelope;
use serde::Serialize;
use sign::SignContext;
use std::sync::Arc;

/// Endpoint paths, relative to the login root or the `/b/api` root
pub(crate) mod endpoint {
    pub(crate) const SIGN_IN: &str = "/user/sign_in";
    pub(crate) const USER_INFO: &str = "/user/info";
    pub(crate) const TASK_RESOLVE: &str = "/v2/offline_download/task/resolve";
    pub(crate) const TASK_SUBMIT: &str = "/v2/offline_download/task/submit";
    pub(crate) const TASK_LIST: &str = "/offline_download/task/list";
    pub(crate) const TASK_DELETE: &str = "/offline_download/task/delete";
    pub(crate) const FILE_LIST: &str = "/file/list/new";
    pub(crate) const FOLDER_CREATE: &str = "/file/upload_request";
    pub(crate) const FILE_RENAME: &str = "/file/rename";
    pub(crate) const FILE_MOVE: &str = "/file/mod_pid";
    pub(crate) const FILE_TRASH: &str = "/file/trash";
}

/// Client for the provider's login and web APIs
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_root: String,
    login_url: String,
    sign_ctx: SignContext,
    sessions: Arc<SessionCache>,
}

impl ApiClient {
    /// Create a client for the configured provider
    ///
    /// The bearer token is read from `sessions` on every request, so a login
    /// performed by any driver sharing the cache is picked up immediately.
    pub fn new(config: &Config, sessions: Arc<SessionCache>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            "pan123-dl/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timing.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.provider.base_url.trim_end_matches('/').to_string(),
            api_root: config.provider.api_root(),
            login_url: config.provider.login_url.trim_end_matches('/').to_string(),
            sign_ctx: SignContext {
                platform: config.provider.platform.clone(),
                app_version: config.provider.app_version.clone(),
            },
            sessions,
        })
    }

    /// Signed POST to a `/b/api` endpoint with a JSON body
    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Envelope> {
        let url = sign::sign_url(&format!("{}{}", self.api_root, endpoint), &self.sign_ctx);
        let request = self.decorate(self.http.post(url)).await.json(body);
        Self::send(request, endpoint).await
    }

    /// Signed GET to a `/b/api` endpoint with query parameters
    pub(crate) async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope> {
        let url = sign::sign_url(&format!("{}{}", self.api_root, endpoint), &self.sign_ctx);
        let request = self.decorate(self.http.get(url)).await.query(query);
        Self::send(request, endpoint).await
    }

    /// Unsigned POST to the login API
    pub(crate) async fn post_login<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<Envelope> {
        let url = format!("{}{}", self.login_url, endpoint);
        let request = self.identify(self.http.post(url)).json(body);
        Self::send(request, endpoint).await
    }

    /// Signed GET that only reports whether the given token is accepted
    ///
    /// Any transport or decoding failure counts as "not accepted".
    pub(crate) async fn verify_token(&self, endpoint: &str, token: &str) -> bool {
        let url = sign::sign_url(&format!("{}{}", self.api_root, endpoint), &self.sign_ctx);
        let request = self.identify(self.http.get(url)).bearer_auth(token);

        let response = match request.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!(status = %response.status(), "token verification rejected");
                return false;
            }
            Err(e) => {
                tracing::debug!(error = %e, "token verification failed");
                return false;
            }
        };

        match response.json::<Envelope>().await {
            Ok(envelope) => envelope.code == models::API_OK,
            Err(e) => {
                tracing::debug!(error = %e, "token verification returned unreadable body");
                false
            }
        }
    }

    fn identify(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("origin", &self.base_url)
            .header("referer", format!("{}/", self.base_url))
            .header("platform", &self.sign_ctx.platform)
            .header("app-version", &self.sign_ctx.app_version)
    }

    async fn decorate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let request = self.identify(request);
        match self.sessions.token().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(request: reqwest::RequestBuilder, endpoint: &str) -> Result<Envelope> {
        let response = request.send().await?.error_for_status()?;
        let body = response.bytes().await?;
        let envelope: Envelope = serde_json::from_slice(&body)?;
        tracing::trace!(endpoint, code = envelope.code, "provider response");
        Ok(envelope)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("api_root", &self.api_root)
            .field("login_url", &self.login_url)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Session;
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    fn config_for(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.provider.base_url = server.uri();
        config.provider.login_url = format!("{}/login/api", server.uri());
        config
    }

    async fn client_with_token(server: &MockServer, token: Option<&str>) -> ApiClient {
        let sessions = Arc::new(SessionCache::new());
        if let Some(token) = token {
            sessions
                .replace(Session {
                    username: "user".into(),
                    access_token: token.into(),
                    expires_at: Utc::now() + chrono::Duration::hours(1),
                })
                .await;
        }
        ApiClient::new(&config_for(server), sessions).unwrap()
    }

    fn is_signed(request: &Request) -> bool {
        request.url.query_pairs().any(|(key, value)| {
            key.parse::<u32>().is_ok() && value.split('-').count() == 3
        })
    }

    #[tokio::test]
    async fn post_attaches_headers_signature_and_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/b/api/file/rename"))
            .and(header("authorization", "Bearer tok"))
            .and(header("platform", "web"))
            .and(header("app-version", "3"))
            .and(body_json(json!({"x": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server, Some("tok")).await;
        let envelope = client.post("/file/rename", &json!({"x": 1})).await.unwrap();
        assert_eq!(envelope.code, 0);

        let requests = server.received_requests().await.unwrap();
        assert!(is_signed(&requests[0]));
    }

    #[tokio::test]
    async fn get_keeps_signature_alongside_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/api/file/list/new"))
            .and(query_param("parentFileId", "42"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"code": 0, "data": {"InfoList": []}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_token(&server, Some("tok")).await;
        client
            .get("/file/list/new", &[("parentFileId", "42".to_string())])
            .await
            .unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(is_signed(&requests[0]));
    }

    #[tokio::test]
    async fn login_requests_are_unsigned_and_tokenless() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/api/user/sign_in"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 200})))
            .mount(&server)
            .await;

        let client = client_with_token(&server, Some("tok")).await;
        client.post_login("/user/sign_in", &json!({})).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(!is_signed(&requests[0]));
        assert!(!requests[0].headers.contains_key("authorization"));
    }

    #[tokio::test]
    async fn http_error_status_is_a_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_with_token(&server, None).await;
        let err = client.post("/file/rename", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn non_json_body_is_a_serialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_with_token(&server, None).await;
        let err = client.post("/file/rename", &json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn verify_token_requires_ok_status_and_zero_code() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/b/api/user/info"))
            .and(header("authorization", "Bearer good"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 0})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/api/user/info"))
            .and(header("authorization", "Bearer stale"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"code": 401})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b/api/user/info"))
            .and(header("authorization", "Bearer broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_with_token(&server, None).await;
        assert!(client.verify_token("/user/info", "good").await);
        assert!(!client.verify_token("/user/info", "stale").await);
        assert!(!client.verify_token("/user/info", "broken").await);
    }
}
