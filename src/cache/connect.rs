//! Connection Lifecycle Module
//!
//! Builds a facade from client options and hands back the teardown that
//! releases its connection.

use std::sync::Arc;

use tracing::error;

use super::CacheFacade;
use crate::config::ClientOptions;
use crate::error::{CacheError, Result};
use crate::store::{KeyValueStore, RedisStore};

// == Connect ==
/// Connects to the configured Redis server and verifies it with a ping.
///
/// # Startup Sequence
/// 1. Open the connection and set the client name
/// 2. Run the `on_connect` hook, if any
/// 3. Ping the store
///
/// Any failure is logged and returned; the connection opened so far is
/// released and no facade is handed out.
///
/// # Example
/// ```ignore
/// let (cache, teardown) = connect(ClientOptions::from_env()).await?;
/// cache.save_item("key", b"value", Duration::from_secs(10)).await?;
/// teardown.close();
/// ```
pub async fn connect(options: ClientOptions) -> Result<(CacheFacade, Teardown)> {
    let store = RedisStore::connect(&options)
        .await
        .inspect_err(|err| report_connect(&options, err))?;

    connect_with_store(Arc::new(store), &options).await
}

/// Runs the hook and the ping against an already opened store.
pub(crate) async fn connect_with_store(
    store: Arc<dyn KeyValueStore>,
    options: &ClientOptions,
) -> Result<(CacheFacade, Teardown)> {
    // Dropping the teardown on any early return releases the connection
    let teardown = Teardown {
        store: Some(store.clone()),
    };

    if let Some(hook) = &options.on_connect {
        hook(options).inspect_err(|err| report_connect(options, err))?;
    }

    let facade = CacheFacade::new(store, options.client_name.clone())
        .with_command_timeout(options.command_timeout);
    facade.ping().await?;

    Ok((facade, teardown))
}

fn report_connect(options: &ClientOptions, err: &CacheError) {
    error!(
        use_case = "cache",
        cache_db = %options.client_name,
        operation = "connect",
        addr = %options.addr,
        error = %err,
        "cache connection failed"
    );
}

// == Teardown ==
/// Releases the facade's connection.
///
/// `close` consumes the teardown, so it runs at most once. Dropping an
/// unclosed teardown releases the connection as well. Facade clones still
/// alive afterwards fail with `CacheError::Closed`.
pub struct Teardown {
    store: Option<Arc<dyn KeyValueStore>>,
}

impl Teardown {
    /// Closes the connection.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(store) = self.store.take() {
            store.close();
        }
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.release();
    }
}
