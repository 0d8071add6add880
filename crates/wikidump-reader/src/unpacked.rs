//! Iteration over a dump without an index
//!
//! Works on the plain `*-pages-articles.xml` file as well as on a whole
//! `.bz2` dump, which is decoded across all of its streams.

use crate::Result;
use crate::config::ReaderConfig;
use std::path::Path;
use wikidump_formats::{FormatError, LineSource, Page, PageExtractor};

/// Iterator over every page of a dump read front to back
#[derive(Debug)]
pub struct UnpackedDumpIterator {
    pages: PageExtractor,
}

impl UnpackedDumpIterator {
    /// Open the dump and skip its `<siteinfo>` header
    pub fn open<P: AsRef<Path>>(dump: P, config: &ReaderConfig) -> Result<Self> {
        config.validate()?;
        let mut lines = LineSource::open_with_buffer(dump, config.read_buffer_size)?;

        let siteinfo_close = &config.markers.siteinfo_close;
        lines
            .skip_to_line_ending_with(siteinfo_close)
            .map_err(|e| match e {
                FormatError::EndOfStream => FormatError::MalformedRecord(format!(
                    "dump header end {siteinfo_close:?} not found"
                )),
                other => other,
            })?;

        Ok(Self {
            pages: PageExtractor::new(lines, config.markers.clone(), None),
        })
    }

    /// Number of pages returned so far
    pub fn pages_read(&self) -> usize {
        self.pages.pages_emitted()
    }

    /// Release the dump file
    pub fn close(self) {
        self.pages.close();
    }
}

impl Iterator for UnpackedDumpIterator {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pages.next().map(|page| page.map_err(Into::into))
    }
}
