//! Error types for pan123-dl
//!
//! Errors follow the failure classes the driver has to deal with when talking
//! to the provider:
//! - Authentication failures (missing credentials, rejected login, no session)
//! - Protocol failures (non-success result codes, unexpected response shapes)
//! - Consistency failures (data not yet visible after a mutating call)
//! - Transport failures (network and HTTP-layer errors)
//!
//! The public driver contract never surfaces these directly: every operation
//! converts them into `false`, an empty list, or a logged skip at its boundary.
//! Internally, components return [`Result`] and propagate with `?`.

use thiserror::Error;

/// Result type alias for pan123-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for pan123-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "provider.base_url")
        key: Option<String>,
    },

    /// Authentication failed or no usable session is available
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Provider answered with a non-success result code or an unusable payload
    #[error("provider error on {endpoint}: code {code}: {message}")]
    Protocol {
        /// Endpoint path that produced the error (e.g., "/file/list/new")
        endpoint: String,
        /// Result code reported by the provider (-1 when the payload itself was unusable)
        code: i64,
        /// Provider message, or a description of what was missing
        message: String,
    },

    /// Expected remote state is not visible yet (eventual consistency)
    #[error("remote state not visible: {0}")]
    Consistency(String),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error (reading the torrent/magnet file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The supplied torrent file does not yield a magnet link
    #[error("invalid magnet: {0}")]
    InvalidMagnet(String),

    /// A task, folder or file could not be found remotely
    #[error("not found: {0}")]
    NotFound(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Authentication-related errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Username or password is blank
    #[error("username or password not configured")]
    MissingCredentials,

    /// Provider rejected the login request
    #[error("login rejected: {message}")]
    Rejected {
        /// Message returned by the provider
        message: String,
    },

    /// No session could be established for the operation
    #[error("no usable session")]
    NoSession,
}

impl Error {
    /// Build a protocol error for a payload that is missing an expected field
    pub(crate) fn missing(endpoint: &str, what: &str) -> Self {
        Error::Protocol {
            endpoint: endpoint.to_string(),
            code: -1,
            message: format!("{what} missing from response"),
        }
    }

    /// Returns true if a later attempt (typically the next poll cycle) may succeed
    ///
    /// Timeouts, connection failures, 5xx responses and consistency failures are
    /// transient. Rejected credentials, protocol errors and invalid input are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            Error::Consistency(_) => true,
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::Interrupted
            ),
            Error::Auth(AuthError::NoSession) => true,
            Error::Auth(_)
            | Error::Config { .. }
            | Error::Protocol { .. }
            | Error::Serialization(_)
            | Error::InvalidMagnet(_)
            | Error::NotFound(_)
            | Error::Other(_) => false,
        }
    }
}
