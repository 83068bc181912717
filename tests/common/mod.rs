//! Shared test helpers: a failure-injecting store and a log capture layer.

#![allow(dead_code)]

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use cache_facade::store::{MemoryStore, ScanPage};
use cache_facade::{CacheError, CacheFacade, Cursor, Expiration, KeyValueStore, Result, TimeToLive};
use tracing::field::{Field, Visit};
use tracing::dispatcher::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;

// == Flaky Store ==
/// Memory store wrapper that fails or stalls selected primitive calls.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_ping: bool,
    fail_get: bool,
    fail_del: HashSet<String>,
    fail_ttl: HashSet<String>,
    fail_scan_at: Option<usize>,
    undecodable: Vec<Vec<u8>>,
    delay: Option<Duration>,
    scans: AtomicUsize,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_ping(mut self) -> Self {
        self.fail_ping = true;
        self
    }

    pub fn failing_get(mut self) -> Self {
        self.fail_get = true;
        self
    }

    pub fn failing_del(mut self, keys: &[&str]) -> Self {
        self.fail_del = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn failing_ttl(mut self, keys: &[&str]) -> Self {
        self.fail_ttl = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Fails the scan round trip with the given zero-based index.
    pub fn failing_scan_at(mut self, call: usize) -> Self {
        self.fail_scan_at = Some(call);
        self
    }

    /// Adds a key that is not UTF-8 to the first scan page.
    pub fn with_undecodable_key(mut self, raw: &[u8]) -> Self {
        self.undecodable.push(raw.to_vec());
        self
    }

    /// Delays every call before it reaches the inner store.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn scan_calls(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    async fn stall(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn injected() -> CacheError {
    CacheError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "injected failure",
    )))
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn ping(&self) -> Result<()> {
        self.stall().await;
        if self.fail_ping {
            return Err(injected());
        }
        self.inner.ping().await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.stall().await;
        if self.fail_get {
            return Err(injected());
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()> {
        self.stall().await;
        self.inner.set(key, value, expiration).await
    }

    async fn del(&self, key: &str) -> Result<bool> {
        self.stall().await;
        if self.fail_del.contains(key) {
            return Err(injected());
        }
        self.inner.del(key).await
    }

    async fn scan(&self, cursor: Cursor, pattern: &str, count: u64) -> Result<ScanPage> {
        self.stall().await;
        let call = self.scans.fetch_add(1, Ordering::SeqCst);
        if self.fail_scan_at == Some(call) {
            return Err(injected());
        }
        let mut page = self.inner.scan(cursor, pattern, count).await?;
        if call == 0 {
            page.undecodable.extend(self.undecodable.iter().cloned());
        }
        Ok(page)
    }

    async fn ttl(&self, key: &str) -> Result<TimeToLive> {
        self.stall().await;
        if self.fail_ttl.contains(key) {
            return Err(injected());
        }
        self.inner.ttl(key).await
    }

    fn close(&self) {
        self.inner.close();
    }
}

/// Builds a facade over `store`, returning both handles.
pub fn facade_over(store: FlakyStore) -> (CacheFacade, Arc<FlakyStore>) {
    let store = Arc::new(store);
    let facade = CacheFacade::new(store.clone(), "test-cache");
    (facade, store)
}

/// Writes persistent keys directly to the inner store.
pub async fn seed(store: &FlakyStore, keys: &[&str]) {
    for key in keys {
        store.inner.set(key, b"v", Expiration::Never).await.unwrap();
    }
}

// == Log Capture ==
/// One captured error-level log record.
#[derive(Debug, Clone, Default)]
pub struct ErrorRecord {
    pub fields: Vec<(String, String)>,
}

impl ErrorRecord {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

impl Visit for ErrorRecord {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.push((field.name().to_string(), value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.fields
            .push((field.name().to_string(), format!("{:?}", value)));
    }
}

/// Layer collecting every error-level event.
#[derive(Clone, Default)]
pub struct ErrorCapture {
    records: Arc<Mutex<Vec<ErrorRecord>>>,
}

impl ErrorCapture {
    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl<S: Subscriber> Layer<S> for ErrorCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::ERROR {
            let mut record = ErrorRecord::default();
            event.record(&mut record);
            self.records.lock().unwrap().push(record);
        }
    }
}

/// Installs an error capture layer for the current thread.
pub fn capture_errors() -> (ErrorCapture, DefaultGuard) {
    let capture = ErrorCapture::default();
    let guard = tracing_subscriber::registry()
        .with(capture.clone())
        .set_default();
    (capture, guard)
}
