//! Catalog retrieval and organization.
//!
//! - [`CatalogClient`] - stateless authenticated fetch of the raw item list
//! - [`grouping`] - release-date sorting and month/year grouping

pub mod grouping;


pub use grouping::{CatalogGroup, CatalogGrouping, UNKNOWN_GROUP};

use crate::config::Config;
use crate::error::CatalogError;
use crate::session::Session;
use crate::types::CatalogItem;
use std::sync::Arc;

/// Fetches the catalog on behalf of an authenticated session
///
/// Holds no state between calls besides the shared HTTP client and configuration,
/// so it is safe to call repeatedly and from several tasks at once.
#[derive(Clone)]
pub struct CatalogClient {
    http_client: reqwest::Client,
    config: Arc<Config>,
}

impl CatalogClient {
    /// Create a client that sends requests through `http_client`
    pub fn new(config: Arc<Config>, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Fetch every item of the catalog
    ///
    /// Fails with [`CatalogError::MissingToken`] without touching the network when
    /// `session` is not authenticated.
    pub async fn fetch_catalog(
        &self,
        session: &Session,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let token = session.token().ok_or(CatalogError::MissingToken)?;

        let url = self
            .config
            .catalog_url()
            .map_err(|e| CatalogError::InvalidUrl(e.to_string()))?;

        tracing::debug!(url = %url, "Fetching catalog");

        let response = self
            .http_client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(CatalogError::Transport)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(CatalogError::ServerError {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(CatalogError::Transport)?;
        let items: Vec<CatalogItem> = serde_json::from_slice(&body)
            .map_err(|e| CatalogError::InvalidData(e.to_string()))?;

        tracing::debug!(items = items.len(), "Catalog fetched");
        Ok(items)
    }
}
