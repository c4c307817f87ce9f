//! # catalog-sync
//!
//! Data layer for browsing a remote catalog of downloadable documents.
//!
//! ## Design Philosophy
//!
//! catalog-sync is designed to be:
//! - **Library-first** - No UI, the crate only owns state that a UI renders
//! - **Snapshot-based** - Readers always see a complete catalog, never a partial one
//! - **Event-driven** - Consumers subscribe to events or watch channels, no polling required
//!
//! A [`SessionManager`] logs in and holds the bearer token. A
//! [`CatalogSynchronizer`] uses that session to fetch the catalog, groups items by
//! release month, and downloads each item's document at most once.
//!
//! ## Quick Start
//!
//! ```no_run
//! use catalog_sync::{CatalogSynchronizer, Config, ItemId, SessionManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.api.base_url = "https://catalog.example.com".to_string();
//!
//!     let sessions = SessionManager::from_config(config)?;
//!     sessions.login("reader", "secret").await?;
//!
//!     let sync = CatalogSynchronizer::for_session(&sessions);
//!     sync.refresh().await?;
//!
//!     for (month, items) in sync.catalog().sections() {
//!         println!("{month}: {} items", items.len());
//!     }
//!
//!     let outcome = sync.download(ItemId(42)).await;
//!     println!("{outcome:?}");
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog fetching and grouping
pub mod catalog;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Shared HTTP client construction
pub mod http;
/// Authentication and session state
pub mod session;
/// Published catalog and per-item download state
pub mod synchronizer;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use catalog::{CatalogClient, CatalogGroup, CatalogGrouping, UNKNOWN_GROUP};
pub use config::{ApiConfig, Config, DownloadConfig, FailurePolicy, HttpConfig};
pub use error::{AssetError, AuthError, CatalogError, Error, Result};
pub use session::{Session, SessionManager, TokenResponse};
pub use synchronizer::{CatalogSynchronizer, DownloadTasks};
pub use types::{
    CatalogItem, DownloadOutcome, DownloadState, DownloadTask, Event, ItemId, RefreshSummary,
    SkipReason,
};
