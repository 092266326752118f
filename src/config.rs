//! Configuration types for pan123-dl

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration for [`Pan123Driver`](crate::Pan123Driver)
///
/// Fields are organized into sub-configs:
/// - [`credentials`](Credentials) - account used for the provider login
/// - [`provider`](ProviderConfig) - endpoints and client identification
/// - [`session`](SessionConfig) - token validity and refresh lead time
/// - [`timing`](TimingConfig) - settle delays around eventually-consistent reads
/// - [`listing`](ListingConfig) - page sizes and search bounds
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Account credentials
    #[serde(default)]
    pub credentials: Credentials,

    /// Provider endpoints
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Session caching behavior
    #[serde(default)]
    pub session: SessionConfig,

    /// Settle delays
    #[serde(default)]
    pub timing: TimingConfig,

    /// Listing bounds
    #[serde(default)]
    pub listing: ListingConfig,
}

impl Config {
    /// Validate the configuration
    ///
    /// Credentials are not checked here: blank credentials are a runtime
    /// condition reported by a failed login, not a configuration error.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("provider.base_url", &self.provider.base_url),
            ("provider.login_url", &self.provider.login_url),
        ] {
            url::Url::parse(value).map_err(|e| Error::Config {
                message: format!("invalid URL '{value}': {e}"),
                key: Some(key.to_string()),
            })?;
        }

        if self.listing.page_size == 0 {
            return Err(Error::Config {
                message: "page size must be greater than zero".into(),
                key: Some("listing.page_size".into()),
            });
        }

        if self.listing.empty_check_limit == 0 {
            return Err(Error::Config {
                message: "empty-check limit must be greater than zero".into(),
                key: Some("listing.empty_check_limit".into()),
            });
        }

        if self.session.refresh_lead >= self.session.validity {
            return Err(Error::Config {
                message: "refresh lead must be shorter than the token validity".into(),
                key: Some("session.refresh_lead".into()),
            });
        }

        Ok(())
    }
}

/// Account credentials
///
/// A username containing `@` logs in by email, anything else is treated as a
/// phone number.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// Email address or phone number
    #[serde(default)]
    pub username: String,

    /// Account password
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Create credentials from a username and password
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// True when either field is blank
    pub fn is_blank(&self) -> bool {
        self.username.trim().is_empty() || self.password.trim().is_empty()
    }

    /// True when the username looks like an email address
    pub fn is_email(&self) -> bool {
        self.username.contains('@')
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Provider endpoints and client identification headers
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Web origin; the `/b/api` family lives under it (default: "https://www.123pan.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Login API root (default: "https://login.123pan.com/api")
    #[serde(default = "default_login_url")]
    pub login_url: String,

    /// Value of the `platform` header, also part of the request signature (default: "web")
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Value of the `app-version` header, also part of the request signature (default: "3")
    #[serde(default = "default_app_version")]
    pub app_version: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_url: default_login_url(),
            platform: default_platform(),
            app_version: default_app_version(),
        }
    }
}

impl ProviderConfig {
    /// Root of the authenticated `/b/api` endpoint family
    pub fn api_root(&self) -> String {
        format!("{}/b/api", self.base_url.trim_end_matches('/'))
    }
}

/// Session caching behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Assumed token lifetime after a successful login (default: 24 hours)
    #[serde(default = "default_validity", with = "duration_secs")]
    pub validity: Duration,

    /// Tokens this close to expiry are not reused (default: 5 minutes)
    #[serde(default = "default_refresh_lead", with = "duration_secs")]
    pub refresh_lead: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            validity: default_validity(),
            refresh_lead: default_refresh_lead(),
        }
    }
}

/// Settle delays used before reads that depend on a previous mutation
///
/// These tolerate eventual consistency on the provider side. They are a
/// heuristic: a slow provider can still hide fresh state for longer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait before re-listing a parent whose folder creation returned no id (default: 500ms)
    #[serde(default = "default_folder_settle", with = "duration_millis")]
    pub folder_settle: Duration,

    /// Wait before checking whether a source folder is empty after moves (default: 500ms)
    #[serde(default = "default_cleanup_settle", with = "duration_millis")]
    pub cleanup_settle: Duration,

    /// Wait before listing tasks to recover a task id missing from a submit response (default: 2s)
    #[serde(default = "default_task_lookup_delay", with = "duration_millis")]
    pub task_lookup_delay: Duration,

    /// Per-request timeout (None = transport default)
    #[serde(default, with = "optional_duration_secs")]
    pub request_timeout: Option<Duration>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            folder_settle: default_folder_settle(),
            cleanup_settle: default_cleanup_settle(),
            task_lookup_delay: default_task_lookup_delay(),
            request_timeout: None,
        }
    }
}

/// Page sizes and search bounds
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListingConfig {
    /// Entries requested per directory or task listing (default: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Entries requested when checking whether a folder is empty (default: 10)
    #[serde(default = "default_empty_check_limit")]
    pub empty_check_limit: u32,

    /// Maximum folder depth searched below a task's upload folder (default: 16)
    #[serde(default = "default_max_search_depth")]
    pub max_search_depth: usize,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            empty_check_limit: default_empty_check_limit(),
            max_search_depth: default_max_search_depth(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.123pan.com".to_string()
}

fn default_login_url() -> String {
    "https://login.123pan.com/api".to_string()
}

fn default_platform() -> String {
    "web".to_string()
}

fn default_app_version() -> String {
    "3".to_string()
}

fn default_validity() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_refresh_lead() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_folder_settle() -> Duration {
    Duration::from_millis(500)
}

fn default_cleanup_settle() -> Duration {
    Duration::from_millis(500)
}

fn default_task_lookup_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_page_size() -> u32 {
    100
}

fn default_empty_check_limit() -> u32 {
    10
}

fn default_max_search_depth() -> usize {
    16
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod optional_duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
