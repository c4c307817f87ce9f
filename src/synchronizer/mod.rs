//! Catalog synchronizer: the authoritative in-memory catalog and download state.
//!
//! The `CatalogSynchronizer` struct and its methods are organized by concern:
//! - [`refresh`] - fetch, sort, group and publish the catalog
//! - [`download`] - per-item document downloads and their state machine
//! - [`control`] - cancellation of in-flight downloads
//!
//! Both published structures live in `tokio::sync::watch` channels. Readers get
//! whole snapshots and never observe a half-applied update. Every download task
//! transition happens while holding the `in_flight` lock, which makes that lock the
//! single serialization point for the task map.

mod control;
mod download;
mod refresh;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::catalog::{CatalogClient, CatalogGrouping};
use crate::config::Config;
use crate::session::{Session, SessionManager};
use crate::types::{DownloadState, DownloadTask, Event, ItemId};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast, watch};
use tokio_util::sync::CancellationToken;

/// Download task per item ID, as published to readers
pub type DownloadTasks = HashMap<ItemId, DownloadTask>;

/// Published state and the locks that guard its mutation
#[derive(Clone)]
pub(crate) struct SharedState {
    /// Current catalog, replaced as a whole on every successful refresh
    pub(crate) catalog: Arc<watch::Sender<Arc<CatalogGrouping>>>,
    /// Download task per item
    pub(crate) tasks: Arc<watch::Sender<DownloadTasks>>,
    /// Cancellation tokens of in-flight downloads; held across every task transition
    pub(crate) in_flight: Arc<Mutex<HashMap<ItemId, CancellationToken>>>,
    /// Serializes refreshes so publications follow call order
    pub(crate) refresh_gate: Arc<Mutex<()>>,
}

impl SharedState {
    fn new() -> Self {
        let (catalog, _rx) = watch::channel(Arc::new(CatalogGrouping::default()));
        let (tasks, _rx) = watch::channel(DownloadTasks::new());
        Self {
            catalog: Arc::new(catalog),
            tasks: Arc::new(tasks),
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            refresh_gate: Arc::new(Mutex::new(())),
        }
    }
}

/// Owns the grouped catalog and the per-item download tasks
///
/// Cloneable: all fields are shared, so a clone can be moved into a UI callback and
/// drives the same state.
#[derive(Clone)]
pub struct CatalogSynchronizer {
    /// Catalog fetcher
    pub(crate) client: CatalogClient,
    /// Client used for document downloads
    pub(crate) http_client: reqwest::Client,
    /// Read-only view of the session owned by the [`SessionManager`]
    pub(crate) session: watch::Receiver<Session>,
    pub(crate) config: Arc<Config>,
    pub(crate) state: SharedState,
    pub(crate) event_tx: broadcast::Sender<Event>,
}

impl CatalogSynchronizer {
    /// Create a synchronizer reading the session from `session`
    pub fn new(
        config: Arc<Config>,
        http_client: reqwest::Client,
        session: watch::Receiver<Session>,
    ) -> Self {
        let (event_tx, _rx) = broadcast::channel(config.event_channel_capacity.max(1));
        Self::with_event_sender(config, http_client, session, event_tx)
    }

    /// Create a synchronizer that shares configuration, HTTP client and event stream
    /// with `manager`
    pub fn for_session(manager: &SessionManager) -> Self {
        Self::with_event_sender(
            manager.config(),
            manager.http_client(),
            manager.subscribe_session(),
            manager.event_sender(),
        )
    }

    fn with_event_sender(
        config: Arc<Config>,
        http_client: reqwest::Client,
        session: watch::Receiver<Session>,
        event_tx: broadcast::Sender<Event>,
    ) -> Self {
        Self {
            client: CatalogClient::new(config.clone(), http_client.clone()),
            http_client,
            session,
            config,
            state: SharedState::new(),
            event_tx,
        }
    }

    /// Snapshot of the most recently published catalog
    pub fn catalog(&self) -> Arc<CatalogGrouping> {
        self.state.catalog.borrow().clone()
    }

    /// Live view of the published catalog
    pub fn subscribe_catalog(&self) -> watch::Receiver<Arc<CatalogGrouping>> {
        self.state.catalog.subscribe()
    }

    /// Snapshot of every download task
    pub fn download_tasks(&self) -> DownloadTasks {
        self.state.tasks.borrow().clone()
    }

    /// Live view of the download tasks
    pub fn subscribe_tasks(&self) -> watch::Receiver<DownloadTasks> {
        self.state.tasks.subscribe()
    }

    /// Download task of one item
    pub fn task(&self, id: ItemId) -> Option<DownloadTask> {
        self.state.tasks.borrow().get(&id).cloned()
    }

    /// Download state of one item; items never seen are `Pending`
    pub fn download_state(&self, id: ItemId) -> DownloadState {
        self.state
            .tasks
            .borrow()
            .get(&id)
            .map(|task| task.state.clone())
            .unwrap_or(DownloadState::Pending)
    }

    /// Downloaded document of one item, if its task is completed
    pub fn payload(&self, id: ItemId) -> Option<Bytes> {
        self.state
            .tasks
            .borrow()
            .get(&id)
            .and_then(|task| task.payload().cloned())
    }

    /// Subscribe to catalog and download events
    ///
    /// Events are buffered up to the configured channel capacity; a subscriber that
    /// falls further behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Emit an event to all subscribers; dropped if nobody listens
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
