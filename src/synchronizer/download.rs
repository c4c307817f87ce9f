//! Per-item document downloads.
//!
//! State machine of one task:
//!
//! ```text
//! Pending ──download──▶ InProgress ──ok──────────▶ Completed
//!    ▲                     │
//!    └──── err / cancel ───┘      (err ▶ Failed under FailurePolicy::MarkFailed)
//! ```
//!
//! `InProgress` and `Completed` reject further triggers, so at most one fetch per
//! item is ever in flight and a downloaded document is never fetched twice.

use crate::config::FailurePolicy;
use crate::error::AssetError;
use crate::types::{
    CatalogItem, DownloadOutcome, DownloadState, DownloadTask, Event, ItemId, SkipReason,
};
use bytes::Bytes;
use chrono::Utc;
use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use url::Url;

use super::CatalogSynchronizer;

impl CatalogSynchronizer {
    /// Download the document of one item
    ///
    /// A no-op ([`DownloadOutcome::Skipped`]) when the item is not in the published
    /// catalog, or when its task is already in progress or completed. Otherwise the
    /// task moves to `InProgress`, the document is fetched, and the task ends in
    /// `Completed` or returns to a retryable state.
    ///
    /// The fetch runs on its own tokio task: dropping the returned future does not
    /// abandon the transition, the task still settles when the fetch does.
    pub async fn download(&self, id: ItemId) -> DownloadOutcome {
        let (item, cancel_token) = match self.begin_download(id).await {
            Ok(started) => started,
            Err(reason) => {
                tracing::debug!(item_id = id.0, reason = ?reason, "Download trigger ignored");
                return DownloadOutcome::Skipped(reason);
            }
        };

        tracing::debug!(item_id = id.0, url = %item.asset_url, "Download started");
        self.emit_event(Event::DownloadStarted { id });

        let this = self.clone();
        let handle = tokio::spawn(async move { this.run_download(item, cancel_token).await });

        match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                // The fetch task panicked or the runtime is shutting down
                tracing::error!(item_id = id.0, error = %e, "Download task aborted");
                self.settle(id, Err(AssetError::Cancelled)).await
            }
        }
    }

    /// Start a download in the background
    ///
    /// For UI callbacks that cannot await. The handle resolves to the same outcome
    /// [`download`](Self::download) would return.
    pub fn spawn_download(&self, id: ItemId) -> tokio::task::JoinHandle<DownloadOutcome> {
        let this = self.clone();
        tokio::spawn(async move { this.download(id).await })
    }

    /// Download several items concurrently
    ///
    /// Outcomes are returned in the order of `ids`. Repeated IDs are fine: only the
    /// first one to reach the task map fetches, the rest are skipped.
    pub async fn download_many<I>(&self, ids: I) -> Vec<(ItemId, DownloadOutcome)>
    where
        I: IntoIterator<Item = ItemId>,
    {
        let downloads = ids
            .into_iter()
            .map(|id| async move { (id, self.download(id).await) });
        join_all(downloads).await
    }

    /// Claim the item for downloading: `Pending`/`Failed` → `InProgress`
    async fn begin_download(
        &self,
        id: ItemId,
    ) -> Result<(CatalogItem, CancellationToken), SkipReason> {
        let mut in_flight = self.state.in_flight.lock().await;

        let item = self
            .state
            .catalog
            .borrow()
            .find(id)
            .cloned()
            .ok_or(SkipReason::NotInCatalog)?;

        let mut skipped = None;
        self.state.tasks.send_if_modified(|tasks| {
            let task = tasks.entry(id).or_insert_with(DownloadTask::pending);
            if task.state.blocks_download() {
                skipped = Some(match task.state {
                    DownloadState::Completed(_) => SkipReason::AlreadyCompleted,
                    _ => SkipReason::AlreadyInProgress,
                });
                return false;
            }
            task.state = DownloadState::InProgress;
            task.updated_at = Utc::now();
            true
        });
        if let Some(reason) = skipped {
            return Err(reason);
        }

        let cancel_token = CancellationToken::new();
        in_flight.insert(id, cancel_token.clone());
        Ok((item, cancel_token))
    }

    async fn run_download(
        &self,
        item: CatalogItem,
        cancel_token: CancellationToken,
    ) -> DownloadOutcome {
        let result = tokio::select! {
            _ = cancel_token.cancelled() => Err(AssetError::Cancelled),
            result = self.fetch_asset(&item.asset_url) => result,
        };
        self.settle(item.id, result).await
    }

    /// Fetch the raw document bytes, bounded by the download timeout
    async fn fetch_asset(&self, asset_url: &str) -> Result<Bytes, AssetError> {
        let url = Url::parse(asset_url).map_err(|e| AssetError::InvalidUrl {
            url: asset_url.to_string(),
            reason: e.to_string(),
        })?;

        let response = self
            .http_client
            .get(url)
            .timeout(self.config.download.timeout)
            .send()
            .await
            .map_err(AssetError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(AssetError::Transport)
    }

    /// Leave `InProgress`: store the payload, or fall back to a retryable state
    async fn settle(&self, id: ItemId, result: Result<Bytes, AssetError>) -> DownloadOutcome {
        let mut in_flight = self.state.in_flight.lock().await;
        in_flight.remove(&id);

        let failure_state = match self.config.download.failure_policy {
            FailurePolicy::RevertToPending => DownloadState::Pending,
            FailurePolicy::MarkFailed => DownloadState::Failed,
        };

        let outcome = match &result {
            Ok(payload) => DownloadOutcome::Completed {
                size_bytes: payload.len(),
            },
            Err(AssetError::Cancelled) => DownloadOutcome::Cancelled,
            Err(e) => DownloadOutcome::Failed {
                error: e.to_string(),
            },
        };

        self.state.tasks.send_modify(|tasks| {
            let task = tasks.entry(id).or_insert_with(DownloadTask::pending);
            match result {
                Ok(payload) => {
                    task.state = DownloadState::Completed(payload);
                    task.last_error = None;
                }
                Err(AssetError::Cancelled) => {
                    task.state = DownloadState::Pending;
                    task.last_error = Some(AssetError::Cancelled.to_string());
                }
                Err(e) => {
                    task.state = failure_state;
                    task.last_error = Some(e.to_string());
                }
            }
            task.updated_at = Utc::now();
        });
        drop(in_flight);

        match &outcome {
            DownloadOutcome::Completed { size_bytes } => {
                tracing::info!(item_id = id.0, size_bytes, "Download completed");
                self.emit_event(Event::DownloadCompleted {
                    id,
                    size_bytes: *size_bytes,
                });
            }
            DownloadOutcome::Cancelled => {
                tracing::warn!(item_id = id.0, "Download cancelled");
                self.emit_event(Event::DownloadCancelled { id });
            }
            DownloadOutcome::Failed { error } => {
                tracing::warn!(item_id = id.0, error = %error, "Download failed");
                self.emit_event(Event::DownloadFailed {
                    id,
                    error: error.clone(),
                });
            }
            DownloadOutcome::Skipped(_) => {}
        }

        outcome
    }
}
