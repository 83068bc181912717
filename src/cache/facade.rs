//! Cache Facade Module
//!
//! Item and bulk operations composed from single-key store primitives.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use super::scan::KeyScan;
use crate::error::{CacheError, Result};
use crate::store::{Cursor, Expiration, KeyValueStore, TimeToLive};

/// Value of the `use_case` field on every log record
const USE_CASE: &str = "cache";

// == Cache Facade ==
/// Cache access facade over a shared store connection.
///
/// Cloning is cheap; clones share the same connection. Item operations and
/// [`CacheFacade::find_keys`] propagate failures. The bulk deletes are
/// best-effort: every failure is logged and skipped, and they always return
/// `Ok(())`.
#[derive(Clone)]
pub struct CacheFacade {
    /// Store connection
    store: Arc<dyn KeyValueStore>,
    /// Store identity used in log records
    name: String,
    /// Upper bound for each primitive call
    command_timeout: Option<Duration>,
}

impl CacheFacade {
    // == Constructor ==
    /// Wraps an already connected store.
    ///
    /// # Arguments
    /// * `store` - The store all operations are forwarded to
    /// * `name` - Store identity reported as `cache_db` in log records
    pub fn new(store: Arc<dyn KeyValueStore>, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            command_timeout: None,
        }
    }

    /// Bounds every primitive call by `timeout`.
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Ping ==
    /// Liveness probe against the store.
    pub async fn ping(&self) -> Result<()> {
        self.bounded(self.store.ping()).await.inspect_err(|err| {
            error!(
                use_case = USE_CASE,
                cache_db = %self.name,
                operation = "ping",
                error = %err,
                "cache ping failed"
            );
        })
    }

    // == Find Item ==
    /// Reads the value stored under `key`.
    ///
    /// An absent key is `Ok(None)`, not an error.
    pub async fn find_item(&self, key: &str) -> Result<Option<Vec<u8>>> {
        validate_key(key)?;
        self.bounded(self.store.get(key))
            .await
            .inspect_err(|err| self.report_key("find_item", key, err))
    }

    // == Save Item ==
    /// Stores `value` under `key`, replacing any previous value and expiration.
    ///
    /// # Arguments
    /// * `key` - The key to write
    /// * `value` - The payload
    /// * `expiration` - `Expiration::Never`, or a duration (`Duration` converts)
    pub async fn save_item(
        &self,
        key: &str,
        value: &[u8],
        expiration: impl Into<Expiration>,
    ) -> Result<()> {
        validate_key(key)?;
        let expiration = expiration.into();
        expiration.validate()?;

        self.bounded(self.store.set(key, value, expiration))
            .await
            .inspect_err(|err| self.report_key("save_item", key, err))
    }

    // == Remove Item ==
    /// Deletes `key`. Deleting an absent key succeeds.
    pub async fn remove_item(&self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.bounded(self.store.del(key))
            .await
            .map(|_| ())
            .inspect_err(|err| self.report_key("remove_item", key, err))
    }

    // == Find Keys ==
    /// Collects every key matching `pattern`, scanning from `cursor` until the
    /// store reports completion.
    ///
    /// `count` only sets the per-round-trip granularity; the result holds all
    /// matches. Any failed round trip aborts the call and discards the keys
    /// gathered so far.
    pub async fn find_keys(
        &self,
        pattern: &str,
        cursor: impl Into<Cursor>,
        count: u64,
    ) -> Result<Vec<String>> {
        let mut scan = KeyScan::new(pattern, cursor.into(), count);
        let mut keys = Vec::new();

        loop {
            match self.next_page("find_keys", &mut scan).await {
                Ok(Some(page)) => keys.extend(page),
                Ok(None) => return Ok(keys),
                Err(err) => {
                    self.report_scan("find_keys", &scan, &err);
                    return Err(err);
                }
            }
        }
    }

    // == Delete With Keyword ==
    /// Deletes every key matching `pattern` as the scan discovers it.
    ///
    /// Per-key and scan failures are logged, never returned.
    pub async fn delete_with_keyword(
        &self,
        pattern: &str,
        cursor: impl Into<Cursor>,
        count: u64,
    ) -> Result<()> {
        let mut scan = KeyScan::new(pattern, cursor.into(), count);

        loop {
            match self.next_page("delete_with_keyword", &mut scan).await {
                Ok(Some(page)) => {
                    for key in page {
                        self.delete_logged("delete_with_keyword", &key).await;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    self.report_scan("delete_with_keyword", &scan, &err);
                    break;
                }
            }
        }

        Ok(())
    }

    // == Delete With Keys ==
    /// Deletes each of `keys` in order. Failures are logged, never returned.
    pub async fn delete_with_keys(
        &self,
        keys: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Result<()> {
        for key in keys {
            self.delete_logged("delete_with_keys", key.as_ref()).await;
        }
        Ok(())
    }

    // == Delete Without TTL ==
    /// Deletes the keys matching `pattern` that have no expiration set.
    ///
    /// Keys with a TTL, or whose TTL query fails, are left in place. Failures
    /// are logged, never returned.
    pub async fn delete_without_ttl(
        &self,
        pattern: &str,
        cursor: impl Into<Cursor>,
        count: u64,
    ) -> Result<()> {
        let mut scan = KeyScan::new(pattern, cursor.into(), count);

        loop {
            match self.next_page("delete_without_ttl", &mut scan).await {
                Ok(Some(page)) => {
                    for key in page {
                        match self.bounded(self.store.ttl(&key)).await {
                            Ok(TimeToLive::Persistent) => {
                                self.delete_logged("delete_without_ttl", &key).await;
                            }
                            Ok(_) => {}
                            Err(err) => self.report_key("delete_without_ttl", &key, &err),
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    self.report_scan("delete_without_ttl", &scan, &err);
                    break;
                }
            }
        }

        Ok(())
    }

    // == Helpers ==
    /// Fetches the next page of a scan; `Ok(None)` once the pass is complete.
    ///
    /// Keys on the page that are not UTF-8 are reported one by one and
    /// skipped; the rest of the page is returned.
    async fn next_page(
        &self,
        operation: &'static str,
        scan: &mut KeyScan<'_>,
    ) -> Result<Option<Vec<String>>> {
        let Some(cursor) = scan.position() else {
            return Ok(None);
        };
        let page = self
            .bounded(self.store.scan(cursor, scan.pattern(), scan.count()))
            .await?;

        for raw in &page.undecodable {
            error!(
                use_case = USE_CASE,
                cache_db = %self.name,
                operation,
                key = %String::from_utf8_lossy(raw),
                error = "key is not valid UTF-8",
                "cache key skipped"
            );
        }

        Ok(Some(scan.advance(page)))
    }

    async fn delete_logged(&self, operation: &'static str, key: &str) {
        if let Err(err) = self.bounded(self.store.del(key)).await {
            self.report_key(operation, key, &err);
        }
    }

    /// Applies the command timeout to one primitive call.
    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match self.command_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or(Err(CacheError::Timeout(limit))),
            None => call.await,
        }
    }

    fn report_key(&self, operation: &'static str, key: &str, err: &CacheError) {
        error!(
            use_case = USE_CASE,
            cache_db = %self.name,
            operation,
            key,
            error = %err,
            "cache operation failed"
        );
    }

    fn report_scan(&self, operation: &'static str, scan: &KeyScan<'_>, err: &CacheError) {
        error!(
            use_case = USE_CASE,
            cache_db = %self.name,
            operation,
            pattern = scan.pattern(),
            cursor = scan.cursor().0,
            error = %err,
            "cache scan failed"
        );
    }
}

/// Rejects empty keys before they reach the store.
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    Ok(())
}
