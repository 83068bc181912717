//! Cache Module
//!
//! The cache facade: item CRUD with expiration plus best-effort bulk
//! discovery and deletion over a store connection.

mod connect;
mod facade;
mod scan;


// Re-export public types
pub use connect::{connect, Teardown};
pub use facade::CacheFacade;
pub use scan::KeyScan;
