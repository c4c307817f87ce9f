//! Error types for catalog-sync
//!
//! Each component returns its own error type so callers can match on exactly the
//! failures that component can produce:
//! - [`AuthError`] - login failures
//! - [`CatalogError`] - catalog fetch failures
//! - [`AssetError`] - per-item document download failures (absorbed into task state)
//!
//! The crate-level [`Error`] wraps all of them plus construction-time failures.

use thiserror::Error;

/// Result type alias for catalog-sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for catalog-sync
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api.base_url")
        key: Option<String>,
    },

    /// The shared HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// Login failed
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Catalog fetch failed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Asset download failed
    ///
    /// Downloads never return this themselves; their failures land in the task
    /// state. For callers that re-raise a download failure through [`Error`].
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Login failures
#[derive(Debug, Error)]
pub enum AuthError {
    /// The login endpoint URL could not be constructed
    #[error("invalid login URL: {0}")]
    InvalidUrl(String),

    /// The server answered with something other than 200 OK
    #[error("unexpected status code {status} from login endpoint")]
    UnexpectedStatus {
        /// HTTP status code returned by the server
        status: u16,
    },

    /// The response body was not a valid token payload
    #[error("failed to decode login response: {0}")]
    Decoding(String),

    /// The request never produced a response (connect error, timeout, ...)
    #[error("login request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

/// Catalog fetch failures
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The session carries no access token; no request was made
    #[error("missing access token: log in before fetching the catalog")]
    MissingToken,

    /// The catalog endpoint URL could not be constructed
    #[error("invalid catalog URL: {0}")]
    InvalidUrl(String),

    /// The server answered with something other than 200 OK
    #[error("catalog server returned status {status}")]
    ServerError {
        /// HTTP status code returned by the server
        status: u16,
    },

    /// The response body was not a JSON array of catalog items
    #[error("invalid catalog data: {0}")]
    InvalidData(String),

    /// The request never produced a response (connect error, timeout, ...)
    #[error("catalog request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl CatalogError {
    /// Whether the server rejected the access token.
    ///
    /// A `true` here means the session should be considered stale and the user
    /// asked to log in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, CatalogError::ServerError { status: 401 | 403 })
    }
}

/// Document download failures
///
/// These never reach the UI as errors: the download task reverts to a retryable
/// state and the cause is kept on the task, logged, and broadcast as an event.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The item's asset URL is not a valid absolute URL
    #[error("invalid asset URL {url}: {reason}")]
    InvalidUrl {
        /// The URL as it appeared in the catalog
        url: String,
        /// Parser error
        reason: String,
    },

    /// The asset server answered with a non-success status
    #[error("asset server returned status {status}")]
    UnexpectedStatus {
        /// HTTP status code returned by the server
        status: u16,
    },

    /// The request or the body transfer failed
    #[error("asset request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The download was cancelled before it finished
    #[error("download cancelled")]
    Cancelled,
}

impl Error {
    /// Machine-readable error code, stable across releases
    ///
    /// Intended for UIs that map failures to localized messages.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::HttpClient(_) => "http_client_error",
            Error::Auth(AuthError::InvalidUrl(_)) => "invalid_url",
            Error::Auth(AuthError::UnexpectedStatus { .. }) => "login_rejected",
            Error::Auth(AuthError::Decoding(_)) => "invalid_login_response",
            Error::Auth(AuthError::Transport(_)) => "network_error",
            Error::Catalog(CatalogError::MissingToken) => "not_authenticated",
            Error::Catalog(CatalogError::InvalidUrl(_)) => "invalid_url",
            Error::Catalog(e @ CatalogError::ServerError { .. }) if e.is_unauthorized() => {
                "unauthorized"
            }
            Error::Catalog(CatalogError::ServerError { .. }) => "server_error",
            Error::Catalog(CatalogError::InvalidData(_)) => "invalid_data",
            Error::Catalog(CatalogError::Transport(_)) => "network_error",
            Error::Asset(AssetError::InvalidUrl { .. }) => "invalid_url",
            Error::Asset(AssetError::UnexpectedStatus { .. }) => "server_error",
            Error::Asset(AssetError::Transport(_)) => "network_error",
            Error::Asset(AssetError::Cancelled) => "cancelled",
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_only_for_401_and_403() {
        assert!(CatalogError::ServerError { status: 401 }.is_unauthorized());
        assert!(CatalogError::ServerError { status: 403 }.is_unauthorized());
        assert!(!CatalogError::ServerError { status: 500 }.is_unauthorized());
        assert!(!CatalogError::MissingToken.is_unauthorized());
    }

    #[test]
    fn error_codes_for_component_errors() {
        let cases: Vec<(Error, &str)> = vec![
            (
                Error::Config {
                    message: "bad".into(),
                    key: Some("api.base_url".into()),
                },
                "config_error",
            ),
            (
                AuthError::UnexpectedStatus { status: 401 }.into(),
                "login_rejected",
            ),
            (
                AuthError::Decoding("eof".into()).into(),
                "invalid_login_response",
            ),
            (CatalogError::MissingToken.into(), "not_authenticated"),
            (
                CatalogError::ServerError { status: 401 }.into(),
                "unauthorized",
            ),
            (
                CatalogError::ServerError { status: 502 }.into(),
                "server_error",
            ),
            (
                CatalogError::InvalidData("expected array".into()).into(),
                "invalid_data",
            ),
            (AssetError::Cancelled.into(), "cancelled"),
        ];

        for (error, code) in cases {
            assert_eq!(error.error_code(), code, "wrong code for {error}");
        }
    }

    #[test]
    fn display_includes_status() {
        let err = AuthError::UnexpectedStatus { status: 401 };
        assert_eq!(
            err.to_string(),
            "unexpected status code 401 from login endpoint"
        );

        let err: Error = CatalogError::ServerError { status: 500 }.into();
        assert_eq!(
            err.to_string(),
            "catalog error: catalog server returned status 500"
        );
    }
}
