//! Shared HTTP client construction.

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Build the `reqwest::Client` shared by login, catalog and asset requests.
///
/// `reqwest::Client` is internally reference counted; clones share one connection pool.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .user_agent(config.user_agent.as_str())
        .build()
        .map_err(Error::HttpClient)
}
