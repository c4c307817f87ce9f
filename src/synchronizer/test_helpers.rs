//! Shared test helpers for creating CatalogSynchronizer instances in tests.

use crate::config::Config;
use crate::session::Session;
use crate::synchronizer::CatalogSynchronizer;
use crate::types::{DownloadState, DownloadTask, ItemId};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token every test session carries
pub(crate) const TEST_TOKEN: &str = "test-token";

/// Sample document body
pub(crate) const SAMPLE_PDF: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n%%EOF";

/// Helper to create a synchronizer pointed at `server` with an authenticated session.
pub(crate) fn create_test_synchronizer(server: &MockServer) -> CatalogSynchronizer {
    create_test_synchronizer_with_config(server, Config::default())
}

/// Same as [`create_test_synchronizer`] with a caller-provided base config.
///
/// The API base URL is always overridden to point at `server`.
pub(crate) fn create_test_synchronizer_with_config(
    server: &MockServer,
    mut config: Config,
) -> CatalogSynchronizer {
    config.api.base_url = server.uri();
    let http_client = crate::http::build_client(&config.http).unwrap();

    // The receiver keeps the last value after the sender is dropped
    let (_session_tx, session_rx) =
        watch::channel(Session::authenticated(TEST_TOKEN, Utc::now()));

    CatalogSynchronizer::new(Arc::new(config), http_client, session_rx)
}

/// A catalog entry whose `pdf_url` points at `/assets/{id}.pdf` on `server`
pub(crate) fn catalog_entry(server: &MockServer, id: i64, date: &str) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "title": format!("Issue {id}"),
        "img_url": format!("http://images.example.com/{id}.png"),
        "date_released": date,
        "pdf_url": format!("{}/assets/{id}.pdf", server.uri()),
    })
}

/// Serve `entries` from the catalog endpoint
pub(crate) async fn mount_catalog(server: &MockServer, entries: Vec<serde_json::Value>) {
    Mock::given(method("GET"))
        .and(path("/Access/Books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(entries))
        .mount(server)
        .await;
}

/// Serve item `id`'s document with `response`, expecting exactly `expected_calls` fetches
pub(crate) async fn mount_asset(
    server: &MockServer,
    id: i64,
    response: ResponseTemplate,
    expected_calls: u64,
) {
    Mock::given(method("GET"))
        .and(path(format!("/assets/{id}.pdf")))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Successful document response, optionally delayed to keep the download in flight
pub(crate) fn pdf_response(delay: Duration) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_bytes(SAMPLE_PDF)
        .set_delay(delay)
}

/// Synchronizer with a published catalog of items `ids` (one per month of 2020)
pub(crate) async fn synchronizer_with_items(
    server: &MockServer,
    ids: &[i64],
) -> CatalogSynchronizer {
    let entries = ids
        .iter()
        .map(|&id| {
            let month = 1 + id.rem_euclid(12);
            catalog_entry(server, id, &format!("2020-{month:02}-15"))
        })
        .collect();
    mount_catalog(server, entries).await;

    let sync = create_test_synchronizer(server);
    sync.refresh().await.unwrap();
    sync
}

/// Wait until item `id` satisfies `predicate`, failing the test after two seconds
pub(crate) async fn wait_for_task<F>(sync: &CatalogSynchronizer, id: ItemId, predicate: F)
where
    F: Fn(&DownloadTask) -> bool,
{
    let mut tasks = sync.subscribe_tasks();
    tokio::time::timeout(
        Duration::from_secs(2),
        tasks.wait_for(|tasks| tasks.get(&id).is_some_and(&predicate)),
    )
    .await
    .expect("timed out waiting for task state")
    .expect("task channel closed");
}

/// Wait until item `id` is in flight
pub(crate) async fn wait_until_in_progress(sync: &CatalogSynchronizer, id: ItemId) {
    wait_for_task(sync, id, |task| task.state == DownloadState::InProgress).await;
}

/// Wait until `server` has received a request for `request_path`
///
/// `InProgress` is published before the fetch is sent, so tests that need the
/// request on the wire wait for it here.
pub(crate) async fn wait_for_request(server: &MockServer, request_path: &str) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let received = server.received_requests().await.unwrap_or_default();
            if received.iter().any(|request| request.url.path() == request_path) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for request");
}
