//! Store Value Types
//!
//! Cursor, scan page, expiration and time-to-live types shared by every backend.

use std::fmt;
use std::time::Duration;

use crate::error::{CacheError, Result};

// == Cursor ==
/// Opaque, server-issued scan position.
///
/// `Cursor::START` begins a scan; a returned cursor equal to `Cursor::START`
/// means the scan is complete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Cursor(pub u64);

impl Cursor {
    /// Cursor that starts a scan and terminates it when returned
    pub const START: Cursor = Cursor(0);

    /// Returns true when this cursor marks the end of a scan.
    pub fn is_terminal(&self) -> bool {
        self.0 == 0
    }
}

impl From<u64> for Cursor {
    fn from(value: u64) -> Self {
        Cursor(value)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// == Scan Page ==
/// One SCAN round trip: the keys matched in this page and where to resume.
///
/// Keys the server returned that are not valid UTF-8 cannot be addressed
/// through the `&str` key API; they are kept raw in `undecodable` so the
/// caller can report them without losing the rest of the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub cursor: Cursor,
    pub keys: Vec<String>,
    pub undecodable: Vec<Vec<u8>>,
}

impl ScanPage {
    /// Splits raw key bytes into decodable keys and undecodable leftovers.
    pub fn from_raw(cursor: Cursor, raw_keys: Vec<Vec<u8>>) -> Self {
        let mut page = ScanPage {
            cursor,
            ..ScanPage::default()
        };
        for raw in raw_keys {
            match String::from_utf8(raw) {
                Ok(key) => page.keys.push(key),
                Err(err) => page.undecodable.push(err.into_bytes()),
            }
        }
        page
    }
}

// == Expiration ==
/// Expiration requested when writing an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Keep the item until it is deleted
    Never,
    /// Let the store evict the item this long after the write
    After(Duration),
}

impl Expiration {
    /// Rejects `After(0)`, which no store can honor.
    pub fn validate(&self) -> Result<()> {
        match self {
            Expiration::After(ttl) if ttl.is_zero() => Err(CacheError::InvalidRequest(
                "Expiration must be greater than zero".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// Returns the duration, or None for `Never`.
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Expiration::Never => None,
            Expiration::After(ttl) => Some(*ttl),
        }
    }
}

impl From<Duration> for Expiration {
    fn from(ttl: Duration) -> Self {
        Expiration::After(ttl)
    }
}

impl From<Option<Duration>> for Expiration {
    fn from(ttl: Option<Duration>) -> Self {
        ttl.map_or(Expiration::Never, Expiration::After)
    }
}

// == Time To Live ==
/// Remaining lifetime of a key as reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeToLive {
    /// Key exists and has no expiration set
    Persistent,
    /// Key does not exist
    Missing,
    /// Key expires after the given duration
    Expires(Duration),
}

impl TimeToLive {
    /// Maps a raw `PTTL` reply onto a TimeToLive.
    ///
    /// `-1` is the "no expiration" sentinel, `-2` means the key is absent.
    pub fn from_millis_reply(reply: i64) -> Self {
        match reply {
            -1 => TimeToLive::Persistent,
            r if r < 0 => TimeToLive::Missing,
            r => TimeToLive::Expires(Duration::from_millis(r as u64)),
        }
    }
}
