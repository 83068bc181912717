//! Memory Store Module
//!
//! In-process key-value store for development and tests, with TTL
//! expiration and a cursor scan that tolerates concurrent mutation of the
//! keyspace. Expired entries are dropped lazily when their key is written
//! or deleted.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    glob_match, Cursor, Expiration, KeyValueStore, ScanPage, StoreEntry, TimeToLive,
    DEFAULT_SCAN_COUNT,
};
use crate::error::{CacheError, Result};

// == Keyspace ==
/// Entries plus their scan order.
///
/// Every key gets a sequence number when first written; `order` maps those
/// numbers back to keys. A scan cursor is the next sequence number to examine,
/// so deleting keys mid-scan never shifts the position of the remaining ones.
#[derive(Debug, Default)]
struct Keyspace {
    entries: HashMap<String, StoreEntry>,
    order: BTreeMap<u64, String>,
    next_seq: u64,
}

impl Keyspace {
    fn remove(&mut self, key: &str) -> Option<StoreEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    fn live(&self, key: &str) -> Option<&StoreEntry> {
        self.entries.get(key).filter(|entry| !entry.is_expired())
    }
}

// == Memory Store ==
/// Key-value store held in process memory.
///
/// Not a production backend; [`crate::connect`] always talks to Redis. Wrap
/// it with [`crate::CacheFacade::new`] to exercise the facade locally.
#[derive(Debug, Default)]
pub struct MemoryStore {
    keyspace: RwLock<Keyspace>,
    closed: AtomicBool,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(CacheError::Closed)
        } else {
            Ok(())
        }
    }

    // == Length ==
    /// Returns the number of live (unexpired) entries.
    pub async fn len(&self) -> usize {
        let keyspace = self.keyspace.read().await;
        keyspace
            .entries
            .values()
            .filter(|entry| !entry.is_expired())
            .count()
    }

    // == Is Empty ==
    /// Returns true if the store holds no live entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.ensure_open()?;
        let keyspace = self.keyspace.read().await;
        Ok(keyspace.live(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: &[u8], expiration: Expiration) -> Result<()> {
        self.ensure_open()?;
        expiration.validate()?;

        let mut keyspace = self.keyspace.write().await;
        let existing = keyspace.entries.get(key).map(|entry| entry.seq);
        let seq = match existing {
            Some(seq) => seq,
            None => {
                keyspace.next_seq += 1;
                let seq = keyspace.next_seq;
                keyspace.order.insert(seq, key.to_string());
                seq
            }
        };

        let entry = StoreEntry::new(value.to_vec(), seq, expiration.as_duration());
        keyspace.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool> {
        self.ensure_open()?;
        let mut keyspace = self.keyspace.write().await;
        Ok(keyspace
            .remove(key)
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn scan(&self, cursor: Cursor, pattern: &str, count: u64) -> Result<ScanPage> {
        self.ensure_open()?;
        let count = if count == 0 { DEFAULT_SCAN_COUNT } else { count };

        let keyspace = self.keyspace.read().await;
        let mut page = ScanPage::default();

        // Sequence numbers start at 1, so cursor 0 scans from the beginning
        for (examined, (seq, key)) in keyspace.order.range(cursor.0.max(1)..).enumerate() {
            if examined as u64 == count {
                page.cursor = Cursor(*seq);
                break;
            }

            if keyspace.live(key).is_some() && glob_match(pattern, key) {
                page.keys.push(key.clone());
            }
        }

        Ok(page)
    }

    async fn ttl(&self, key: &str) -> Result<TimeToLive> {
        self.ensure_open()?;
        let keyspace = self.keyspace.read().await;
        Ok(match keyspace.live(key) {
            None => TimeToLive::Missing,
            Some(entry) => entry
                .ttl_remaining()
                .map_or(TimeToLive::Persistent, TimeToLive::Expires),
        })
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
