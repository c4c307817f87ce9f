//! Core types for catalog-sync

use bytes::Bytes;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unique, stable identifier of a catalog item
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the inner i64 value
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl From<i64> for ItemId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<ItemId> for i64 {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl PartialEq<i64> for ItemId {
    fn eq(&self, other: &i64) -> bool {
        self.0 == *other
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ItemId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

/// One downloadable entry of the catalog
///
/// Field names follow the backend's JSON (`img_url`, `date_released`, `pdf_url`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Item ID
    pub id: ItemId,
    /// Display title
    pub title: String,
    /// Cover image location, as sent by the server
    #[serde(rename = "img_url")]
    pub image_url: String,
    /// Release date as sent by the server (ISO-8601, may be malformed)
    #[serde(rename = "date_released")]
    pub release_date_raw: String,
    /// Location of the downloadable document
    #[serde(rename = "pdf_url")]
    pub asset_url: String,
}

impl CatalogItem {
    /// Release date parsed from [`release_date_raw`](Self::release_date_raw)
    ///
    /// Accepts a full RFC 3339 timestamp, a timestamp without offset (taken as UTC),
    /// or a bare `YYYY-MM-DD` date (midnight UTC). Anything else is `None`.
    pub fn release_date(&self) -> Option<DateTime<Utc>> {
        parse_release_date(&self.release_date_raw)
    }

    /// Cover image URL with an `http://` scheme upgraded to `https://`
    pub fn secure_image_url(&self) -> String {
        match self.image_url.strip_prefix("http://") {
            Some(rest) => format!("https://{rest}"),
            None => self.image_url.clone(),
        }
    }
}

pub(crate) fn parse_release_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Progress of one item's document download
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadState {
    /// Not downloaded; a download may be started
    Pending,
    /// A fetch is in flight; further triggers are ignored
    InProgress,
    /// The document has been fetched
    Completed(Bytes),
    /// The last fetch failed (only under [`FailurePolicy::MarkFailed`](crate::config::FailurePolicy::MarkFailed)); retryable
    Failed,
}

impl DownloadState {
    /// Badge text shown next to an item
    pub fn label(&self) -> &'static str {
        match self {
            DownloadState::Pending => "Pending",
            DownloadState::InProgress => "Downloading",
            DownloadState::Completed(_) => "Downloaded",
            DownloadState::Failed => "Failed",
        }
    }

    /// Whether a new download trigger would be ignored in this state
    pub fn blocks_download(&self) -> bool {
        matches!(self, DownloadState::InProgress | DownloadState::Completed(_))
    }
}

/// Per-item download task, owned by the synchronizer
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadTask {
    /// Current state
    pub state: DownloadState,
    /// Cause of the most recent failed or cancelled fetch, cleared on success
    pub last_error: Option<String>,
    /// When the state last changed
    pub updated_at: DateTime<Utc>,
}

impl DownloadTask {
    pub(crate) fn pending() -> Self {
        Self {
            state: DownloadState::Pending,
            last_error: None,
            updated_at: Utc::now(),
        }
    }

    /// Document bytes, present only once the task is completed
    pub fn payload(&self) -> Option<&Bytes> {
        match &self.state {
            DownloadState::Completed(payload) => Some(payload),
            _ => None,
        }
    }
}

/// Why a download trigger did nothing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The item is not part of the most recently published catalog
    NotInCatalog,
    /// A fetch for this item is already running
    AlreadyInProgress,
    /// The document was already downloaded
    AlreadyCompleted,
}

/// Result of one `download` call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// This call performed the fetch and the document is now available
    Completed {
        /// Number of bytes received
        size_bytes: usize,
    },
    /// This call performed the fetch and it failed; the task is retryable again
    Failed {
        /// Failure cause
        error: String,
    },
    /// This call's fetch was cancelled; the task is back to `Pending`
    Cancelled,
    /// This call was a no-op
    Skipped(SkipReason),
}

/// Summary of a successful catalog refresh
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshSummary {
    /// Items in the published catalog
    pub items: usize,
    /// Groups in the published catalog
    pub groups: usize,
    /// Items seen for the first time (new `Pending` tasks)
    pub new_items: usize,
}

/// Event emitted by the session manager and the synchronizer
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Login succeeded and the session is now authenticated
    LoggedIn {
        /// Login timestamp
        at: DateTime<Utc>,
    },

    /// A new catalog was published
    CatalogRefreshed {
        /// Total item count
        items: usize,
        /// Number of groups
        groups: usize,
    },

    /// A refresh failed; the previous catalog is still published
    RefreshFailed {
        /// Error message
        error: String,
    },

    /// An item's document fetch started
    DownloadStarted {
        /// Item ID
        id: ItemId,
    },

    /// An item's document is available
    DownloadCompleted {
        /// Item ID
        id: ItemId,
        /// Document size
        size_bytes: usize,
    },

    /// An item's document fetch failed
    DownloadFailed {
        /// Item ID
        id: ItemId,
        /// Error message
        error: String,
    },

    /// An item's document fetch was cancelled
    DownloadCancelled {
        /// Item ID
        id: ItemId,
    },
}
