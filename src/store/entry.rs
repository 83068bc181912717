//! Store Entry Module
//!
//! Defines the structure for individual in-memory entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Store Entry ==
/// Represents a single stored item with its value and metadata.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// The stored value
    pub value: Vec<u8>,
    /// Scan position assigned when the key was first written
    pub seq: u64,
    /// Expiration instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates a new entry with optional TTL.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `seq` - Scan position of the key
    /// * `ttl` - Optional TTL measured from now
    pub fn new(value: Vec<u8>, seq: u64, ttl: Option<Duration>) -> Self {
        Self {
            value,
            seq,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time reaches its expiration
    /// instant, so a fully elapsed TTL is never observable as live.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Instant::now() >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining TTL, or None if no expiration is set.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has TTL and hasn't expired
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}
