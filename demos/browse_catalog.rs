//! Browse catalog example
//!
//! This example demonstrates the core functionality of catalog-sync:
//! - Logging in and sharing the session
//! - Refreshing the catalog and listing it by release month
//! - Subscribing to events
//! - Downloading documents concurrently

use catalog_sync::config::{ApiConfig, Config};
use catalog_sync::{
    CatalogSynchronizer, DownloadOutcome, Event, SessionManager, UNKNOWN_GROUP,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for logging (optional)
    // Uncomment if you add tracing-subscriber to your dependencies:
    // tracing_subscriber::fmt::init();

    let config = Config {
        api: ApiConfig {
            base_url: "https://catalog.example.com".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };

    let sessions = SessionManager::from_config(config)?;
    let sync = CatalogSynchronizer::for_session(&sessions);

    // Subscribe to events
    let mut events = sync.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                Event::LoggedIn { at } => println!("✓ Logged in at {}", at),
                Event::CatalogRefreshed { items, groups } => {
                    println!("✓ Catalog refreshed: {} items in {} months", items, groups);
                }
                Event::RefreshFailed { error } => println!("✗ Refresh failed: {}", error),
                Event::DownloadCompleted { id, size_bytes } => {
                    println!("⬇ Item #{} downloaded ({} bytes)", id, size_bytes);
                }
                Event::DownloadFailed { id, error } => {
                    println!("✗ Item #{} failed: {}", id, error);
                }
                _ => {}
            }
        }
    });

    sessions.login("your_username", "your_password").await?;
    sync.refresh().await?;

    let catalog = sync.catalog();
    for (month, items) in catalog.sections() {
        println!("{}", month);
        for item in items {
            println!(
                "  #{} {} [{}]",
                item.id,
                item.title,
                sync.download_state(item.id).label()
            );
        }
    }

    // Download the newest month
    let latest = catalog
        .groups()
        .iter()
        .rev()
        .find(|group| group.key != UNKNOWN_GROUP);
    if let Some(latest) = latest {
        let ids = latest.items.iter().map(|item| item.id);
        for (id, outcome) in sync.download_many(ids).await {
            if let DownloadOutcome::Completed { size_bytes } = outcome {
                println!("Item #{} ready: {} bytes", id, size_bytes);
            }
        }
    }

    Ok(())
}
