//! Catalog refresh: fetch, group and publish.

use crate::catalog::CatalogGrouping;
use crate::error::CatalogError;
use crate::types::{CatalogItem, DownloadTask, Event, RefreshSummary};
use std::collections::hash_map::Entry;
use std::sync::Arc;

use super::CatalogSynchronizer;

impl CatalogSynchronizer {
    /// Fetch the catalog with the current session and publish it
    ///
    /// On success the new grouping replaces the old one in a single step and every
    /// item seen for the first time gets a `Pending` download task. Tasks of items
    /// that disappeared are kept; a download still running for them may finish.
    ///
    /// On failure the previously published catalog stays in place, a
    /// [`Event::RefreshFailed`] is emitted and the error is returned.
    ///
    /// Concurrent refreshes run one after another.
    pub async fn refresh(&self) -> Result<RefreshSummary, CatalogError> {
        let _gate = self.state.refresh_gate.lock().await;

        let session = self.session.borrow().clone();
        let items = match self.client.fetch_catalog(&session).await {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    unauthorized = e.is_unauthorized(),
                    "Catalog refresh failed"
                );
                self.emit_event(Event::RefreshFailed {
                    error: e.to_string(),
                });
                return Err(e);
            }
        };

        let items: Vec<CatalogItem> = if self.config.download.upgrade_insecure_image_urls {
            items
                .into_iter()
                .map(|mut item| {
                    item.image_url = item.secure_image_url();
                    item
                })
                .collect()
        } else {
            items
        };

        let grouping = Arc::new(CatalogGrouping::from_items(items));

        // Publish under the transition lock so a concurrent download never sees the
        // new catalog without its task entries
        let new_items = {
            let _transitions = self.state.in_flight.lock().await;
            let mut added = 0;
            self.state.tasks.send_if_modified(|tasks| {
                for item in grouping.items() {
                    if let Entry::Vacant(entry) = tasks.entry(item.id) {
                        entry.insert(DownloadTask::pending());
                        added += 1;
                    }
                }
                added > 0
            });
            self.state.catalog.send_replace(Arc::clone(&grouping));
            added
        };

        let summary = RefreshSummary {
            items: grouping.item_count(),
            groups: grouping.len(),
            new_items,
        };

        tracing::info!(
            items = summary.items,
            groups = summary.groups,
            new_items = summary.new_items,
            "Catalog published"
        );
        self.emit_event(Event::CatalogRefreshed {
            items: summary.items,
            groups: summary.groups,
        });

        Ok(summary)
    }
}
