//! Key Scan Module
//!
//! Resumable cursor state for a full SCAN pass.

use crate::store::{Cursor, ScanPage};

// == Key Scan ==
/// Progress of one scan pass over the keyspace.
///
/// A pass starts at the caller's cursor and ends once the server hands back
/// the terminal cursor. Pages are not snapshot-isolated from each other.
#[derive(Debug, Clone)]
pub struct KeyScan<'a> {
    pattern: &'a str,
    cursor: Cursor,
    count: u64,
    finished: bool,
}

impl<'a> KeyScan<'a> {
    /// Creates a scan for `pattern` starting at `cursor`, requesting about
    /// `count` keys per round trip.
    pub fn new(pattern: &'a str, cursor: Cursor, count: u64) -> Self {
        Self {
            pattern,
            cursor,
            count,
            finished: false,
        }
    }

    pub fn pattern(&self) -> &'a str {
        self.pattern
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    /// Cursor the next round trip resumes from.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Returns the cursor to request next, or None once the pass is complete.
    pub fn position(&self) -> Option<Cursor> {
        (!self.finished).then_some(self.cursor)
    }

    /// Records a fetched page and returns its keys.
    pub fn advance(&mut self, page: ScanPage) -> Vec<String> {
        self.cursor = page.cursor;
        self.finished = page.cursor.is_terminal();
        page.keys
    }
}
