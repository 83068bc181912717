//! Store Module
//!
//! The primitive key-value operations the facade is built on, and the
//! backends that provide them.

mod entry;
mod glob;
mod memory;
mod remote;
mod types;

use async_trait::async_trait;

use crate::error::Result;

// Re-export public types
pub use entry::StoreEntry;
pub use glob::glob_match;
pub use memory::MemoryStore;
pub use remote::RedisStore;
pub use types::{Cursor, Expiration, ScanPage, TimeToLive};

// == Public Constants ==
/// Keys examined per SCAN round trip when the caller passes a count of 0
pub const DEFAULT_SCAN_COUNT: u64 = 10;

// == Key Value Store ==
/// Primitive operations of a remote key-value store.
///
/// Every call is a single round trip with no retries. Implementations must be
/// safe to share between concurrent callers.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Liveness probe.
    async fn ping(&self) -> Result<()>;

    /// Reads a value; `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Writes a value, replacing any previous value and expiration.
    async fn set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()>;

    /// Deletes a key; returns whether it existed.
    async fn del(&self, key: &str) -> Result<bool>;

    /// Runs one SCAN step from `cursor`, examining roughly `count` keys.
    async fn scan(&self, cursor: Cursor, pattern: &str, count: u64) -> Result<ScanPage>;

    /// Queries the remaining lifetime of a key.
    async fn ttl(&self, key: &str) -> Result<TimeToLive>;

    /// Releases the underlying connection. Later calls fail with `CacheError::Closed`.
    fn close(&self);
}
