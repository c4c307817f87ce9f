//! Configuration types for catalog-sync

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Remote service endpoints
///
/// Groups settings describing where the login and catalog endpoints live.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the backend (default: "https://3nt-demo-backend.azurewebsites.net")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Login endpoint path, relative to `base_url` (default: "/Access/Login")
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Catalog endpoint path, relative to `base_url` (default: "/Access/Books")
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            catalog_path: default_catalog_path(),
        }
    }
}

/// HTTP client settings shared by every request the crate makes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Total request timeout, including body transfer (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// TCP/TLS connect timeout (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// User-Agent header value
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// What a download task becomes when its asset fetch fails
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Go back to `Pending` so the user can simply tap again
    #[default]
    RevertToPending,
    /// Park the task in `Failed`; it is still retryable
    MarkFailed,
}

/// Download behavior configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// State a task lands in after a failed fetch (default: revert to pending)
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Rewrite `http://` image URLs to `https://` in published catalogs (default: true)
    #[serde(default = "default_true")]
    pub upgrade_insecure_image_urls: bool,

    /// Total time allowed for one document fetch, body included (default: 5 minutes)
    ///
    /// Replaces [`HttpConfig::timeout`] for asset requests only.
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            upgrade_insecure_image_urls: true,
            timeout: default_download_timeout(),
        }
    }
}

/// Main configuration
///
/// Fields are organized into logical sub-configs:
/// - [`api`](ApiConfig): backend endpoints
/// - [`http`](HttpConfig): client timeouts and identification
/// - [`download`](DownloadConfig): document download behavior
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Backend endpoints
    #[serde(default)]
    pub api: ApiConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Download behavior
    #[serde(default)]
    pub download: DownloadConfig,

    /// Buffer size of the event broadcast channels (default: 256)
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            http: HttpConfig::default(),
            download: DownloadConfig::default(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl Config {
    /// Full URL of the login endpoint
    pub fn login_url(&self) -> std::result::Result<Url, url::ParseError> {
        join_endpoint(&self.api.base_url, &self.api.login_path)
    }

    /// Full URL of the catalog endpoint
    pub fn catalog_url(&self) -> std::result::Result<Url, url::ParseError> {
        join_endpoint(&self.api.base_url, &self.api.catalog_path)
    }

    /// Check the configuration for values that would only fail later, at request time
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.api.base_url).map_err(|e| Error::Config {
            message: format!("invalid base URL '{}': {}", self.api.base_url, e),
            key: Some("api.base_url".to_string()),
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Config {
                message: format!("unsupported URL scheme '{}'", base.scheme()),
                key: Some("api.base_url".to_string()),
            });
        }
        if self.download.timeout.is_zero() {
            return Err(Error::Config {
                message: "download timeout must be greater than zero".to_string(),
                key: Some("download.timeout".to_string()),
            });
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::Config {
                message: "event channel capacity must be greater than zero".to_string(),
                key: Some("event_channel_capacity".to_string()),
            });
        }
        Ok(())
    }
}

// `Url::join` drops the last base segment unless it ends in '/', and an absolute
// path would drop all of them; normalize both sides so prefixes survive.
fn join_endpoint(base: &str, path: &str) -> std::result::Result<Url, url::ParseError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path.trim_start_matches('/'))
}

// Default value functions
fn default_base_url() -> String {
    "https://3nt-demo-backend.azurewebsites.net".to_string()
}

fn default_login_path() -> String {
    "/Access/Login".to_string()
}

fn default_catalog_path() -> String {
    "/Access/Books".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("catalog-sync/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_true() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    256
}

// Duration serialization helper
mod duration_serde {
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
