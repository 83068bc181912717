//! Cache Facade - A best-effort cache access layer over a remote key-value store
//!
//! Provides item CRUD with expiration plus pattern-based key discovery and
//! bulk deletion on top of Redis-style primitives.

pub mod cache;
pub mod config;
pub mod error;
pub mod store;

pub use cache::{connect, CacheFacade, Teardown};
pub use config::ClientOptions;
pub use error::{CacheError, Result};
pub use store::{Cursor, Expiration, KeyValueStore, TimeToLive};
