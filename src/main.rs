//! Cache Facade demo
//!
//! Connects to the configured store, writes one item with a TTL, reads it
//! back and prints it.

use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cache_facade::{connect, ClientOptions};

/// Main entry point for the cache facade demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load client options from environment variables
/// 3. Connect and verify the store with a ping
/// 4. Save `key` with a 10 second TTL, then read it back
/// 5. Release the connection
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cache_facade=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let options = ClientOptions::from_env().with_on_connect(|options| {
        info!("Connected to Redis over {} at {}", options.network, options.addr);
        Ok(())
    });
    info!("Client options loaded: {:?}", options);

    let (cache, teardown) = connect(options)
        .await
        .context("failed to connect to cache store")?;

    let ttl = Duration::from_secs(10);
    cache
        .save_item("key", b"value", ttl)
        .await
        .context("failed to save item")?;

    let value = cache
        .find_item("key")
        .await
        .context("failed to read item")?
        .unwrap_or_default();
    println!("{}", String::from_utf8_lossy(&value));

    teardown.close();
    info!("Connection released");
    Ok(())
}
