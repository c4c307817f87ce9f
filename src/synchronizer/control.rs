//! Cancellation of in-flight downloads.
//!
//! Cancelling only signals the fetch; the transition back to `Pending` is made by
//! the download itself, through the same path as every other transition.

use crate::types::ItemId;

use super::CatalogSynchronizer;

impl CatalogSynchronizer {
    /// Cancel the in-flight download of one item
    ///
    /// Returns `false` when nothing was in flight for `id`. Best effort: a fetch
    /// that already finished is reported with its real outcome.
    pub async fn cancel_download(&self, id: ItemId) -> bool {
        let in_flight = self.state.in_flight.lock().await;
        match in_flight.get(&id) {
            Some(cancel_token) => {
                cancel_token.cancel();
                tracing::debug!(item_id = id.0, "Download cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Cancel every in-flight download, e.g. when the catalog view goes away
    ///
    /// Returns how many downloads were signalled.
    pub async fn cancel_all(&self) -> usize {
        let in_flight = self.state.in_flight.lock().await;
        for cancel_token in in_flight.values() {
            cancel_token.cancel();
        }
        if !in_flight.is_empty() {
            tracing::info!(count = in_flight.len(), "Cancelling all in-flight downloads");
        }
        in_flight.len()
    }

    /// IDs of items whose document is being fetched right now
    pub async fn in_flight(&self) -> Vec<ItemId> {
        let in_flight = self.state.in_flight.lock().await;
        let mut ids: Vec<ItemId> = in_flight.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
