//! Multistream index file parsing
//!
//! Each line of a multistream index has the shape `offset:id:title`, for
//! example `3808346070:7863199:Elkies`. `offset` is the byte position of the
//! compressed block holding the page. Titles may contain colons themselves,
//! so only the first two fields are split off.

use crate::error::{FormatError, FormatResult};
use crate::lines::LineSource;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Field separator of index lines
pub const INDEX_SEPARATOR: char = ':';

/// One index line
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Raw bytes to skip in the archive to reach the page's block
    pub offset: u64,
    /// Page id
    pub id: u64,
    /// Page title
    pub title: String,
}

impl IndexEntry {
    /// Create new index entry
    pub fn new(offset: u64, id: u64, title: impl Into<String>) -> Self {
        Self {
            offset,
            id,
            title: title.into(),
        }
    }

    /// Parse a single `offset:id:title` line
    pub fn parse(line: &str) -> FormatResult<Self> {
        let mut fields = line.splitn(3, INDEX_SEPARATOR);

        let offset = fields
            .next()
            .unwrap_or_default()
            .parse::<u64>()
            .map_err(|e| malformed(line, format!("invalid offset: {e}")))?;

        let id = fields
            .next()
            .ok_or_else(|| malformed(line, "missing page id".to_string()))?
            .parse::<u64>()
            .map_err(|e| malformed(line, format!("invalid page id: {e}")))?;

        let title = fields.next().unwrap_or_default();

        Ok(Self::new(offset, id, title))
    }
}

fn malformed(line: &str, reason: String) -> FormatError {
    FormatError::MalformedIndex {
        line: line.to_string(),
        reason,
    }
}

/// Lazy, forward-only reader of index entries
///
/// The reader stops after the first error.
#[derive(Debug)]
pub struct IndexReader {
    lines: LineSource,
    failed: bool,
    entries_read: u64,
}

impl IndexReader {
    /// Create a reader over an existing line source
    pub fn new(lines: LineSource) -> Self {
        Self {
            lines,
            failed: false,
            entries_read: 0,
        }
    }

    /// Open an index file, decompressing it when its name ends in `.bz2`
    pub fn open<P: AsRef<Path>>(path: P) -> FormatResult<Self> {
        Ok(Self::new(LineSource::open(path)?))
    }

    /// Open an index file with an explicit read buffer capacity
    pub fn open_with_buffer<P: AsRef<Path>>(path: P, capacity: usize) -> FormatResult<Self> {
        Ok(Self::new(LineSource::open_with_buffer(path, capacity)?))
    }

    /// Number of entries parsed so far
    pub fn entries_read(&self) -> u64 {
        self.entries_read
    }

    /// Release the underlying line source
    pub fn close(self) {
        self.lines.close();
    }
}

impl Iterator for IndexReader {
    type Item = FormatResult<IndexEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = self
            .lines
            .next()?
            .and_then(|line| IndexEntry::parse(&line));

        match result {
            Ok(entry) => {
                self.entries_read += 1;
                Some(Ok(entry))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
