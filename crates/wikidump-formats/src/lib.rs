//! Text format parsers for Wikipedia dumps
//!
#![allow(clippy::cast_possible_truncation)] // Offsets and counts stay within usize on 64-bit targets
#![allow(clippy::uninlined_format_args)] // Backwards compatibility
#![allow(clippy::doc_markdown)] // MediaWiki element names don't need backticks
#![allow(clippy::module_name_repetitions)] // Clear naming is preferred
#![allow(clippy::return_self_not_must_use)] // Builder patterns
//! This crate reads the plain-text building blocks of the dumps published at
//! <https://dumps.wikimedia.org>, without touching archive offsets:
//!
//! - **Lines**: lazy line access over plain or bzip2-compressed streams
//! - **Index**: `offset:id:title` entries of `*-multistream-index.txt(.bz2)`
//! - **Markup**: line-suffix driven page extraction from `*-pages-articles.xml`
//! - **Page**: the extracted page record and redirect stub detection
//! - **SQL**: typed rows from table dumps such as `*-category.sql`
//!
//! # Example
//!
//! ```
//! use std::io::Cursor;
//! use wikidump_formats::lines::LineSource;
//! use wikidump_formats::markup::PageExtractor;
//!
//! let xml = "  <page>
//!     <title>Cat</title>
//!     <ns>0</ns>
//!     <id>1</id>
//!     <revision>
//!       <format>text/x-wiki</format>
//!       <text xml:space=\"preserve\">#REDIRECT [[Felis]]</text>
//!     </revision>
//!   </page>
//! ";
//!
//! let lines = LineSource::new(Cursor::new(xml.as_bytes().to_vec()));
//! let pages: Vec<_> = PageExtractor::for_block(lines)
//!     .collect::<Result<_, _>>()
//!     .expect("valid page");
//!
//! assert_eq!(pages[0].title, "Cat");
//! assert_eq!(pages[0].redirect_target().expect("redirect"), "Felis");
//! ```

#![warn(missing_docs)]

mod error;

pub mod index;
pub mod lines;
pub mod markup;
pub mod page;
pub mod sql;

pub use error::{FormatError, FormatResult};
pub use index::{IndexEntry, IndexReader};
pub use lines::{Compression, LineSource};
pub use markup::{DumpMarkers, PageExtractor};
pub use page::{Page, RedirectRule};
pub use sql::{Category, CategoryLink, CategoryLinkReader, CategoryReader, InsertReader, SqlRow};
