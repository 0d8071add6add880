//! Indexed access to Wikipedia multistream dumps.
//!
//! A multistream dump (`*-pages-articles-multistream.xml.bz2`) is a
//! concatenation of independent bzip2 streams, each holding up to a hundred
//! `<page>` elements. The companion index (`*-multistream-index.txt`) maps
//! every page to the byte offset of its stream:
//!
//! ```text
//! 616:10:AccessibleComputing
//! 616:12:Anarchism
//! 654123:1202:Blue
//! ```
//!
//! This crate combines both files:
//!
//! - **Sequential**: every page in archive order, one block open at a time
//! - **Lookup**: pages selected by an index predicate, one decompression per
//!   distinct block
//! - **Redirects**: lookups that swap redirect stubs for their targets
//! - **Unpacked**: plain front-to-back reading of a dump without an index
//!
//! # Example
//!
//! ```rust,no_run
//! use wikidump_reader::DumpReader;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = DumpReader::new(
//!     "enwiki-latest-pages-articles-multistream.xml.bz2",
//!     "enwiki-latest-pages-articles-multistream-index.txt.bz2",
//! );
//!
//! let pages = reader.find_pages_following_redirects(|entry| entry.title == "Cat")?;
//! for page in &pages {
//!     println!("{} ({} bytes)", page.title, page.text.len());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use thiserror::Error;

// Reader configuration
pub mod config;

// Block seeking
pub mod seek;

// Whole-archive iteration
pub mod sequential;

// Index-less iteration
pub mod unpacked;

// Batched lookups
pub mod lookup;

// Redirect following
pub mod redirect;

mod dump_reader;

pub use config::ReaderConfig;
pub use dump_reader::DumpReader;
pub use lookup::LookupStats;
pub use seek::{BlockStream, open_block};
pub use sequential::IndexedDumpIterator;
pub use unpacked::UnpackedDumpIterator;
pub use wikidump_formats::{IndexEntry, Page};

/// Result type for reader operations.
pub type Result<T> = std::result::Result<T, ReaderError>;

/// Errors that can occur while reading a dump.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Index, page markup or line decoding failed.
    #[error(transparent)]
    Format(#[from] wikidump_formats::FormatError),

    /// The archive ends before the requested block offset.
    #[error("Seek incomplete: requested offset {requested}, archive holds {available} bytes")]
    SeekIncomplete {
        /// Offset that was requested
        requested: u64,
        /// Bytes actually present
        available: u64,
    },

    /// The indexed block does not contain the page.
    #[error("Page {id} not found in block at offset {offset}")]
    PageNotFound {
        /// Page id from the index entry
        id: u64,
        /// Block offset from the index entry
        offset: u64,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReaderError {
    /// Check if the error stems from malformed dump or index content
    pub fn is_malformed_input(&self) -> bool {
        match self {
            Self::Format(e) => e.is_parse_error(),
            Self::SeekIncomplete { .. } => true,
            _ => false,
        }
    }
}

/// Version information for the reader.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
