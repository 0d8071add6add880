//! Whole-archive iteration driven by the multistream index
//!
//! The index lists every page with the offset of its block, and all entries
//! of one block are adjacent. Walking the index and opening a block each time
//! the offset changes visits every page once, in archive order.

use crate::config::ReaderConfig;
use crate::seek::open_block;
use crate::{ReaderError, Result};
use std::path::{Path, PathBuf};
use wikidump_formats::{Compression, IndexReader, Page, PageExtractor};

/// Iterator over every page of a multistream archive
///
/// At most one block and one index reader are open at any time. Dropping
/// the iterator releases both.
#[derive(Debug)]
pub struct IndexedDumpIterator {
    dump: PathBuf,
    compression: Compression,
    config: ReaderConfig,
    index: IndexReader,
    pages: Option<PageExtractor>,
    current_offset: Option<u64>,
    next_offset: Option<u64>,
    blocks_opened: usize,
    failed: bool,
}

impl IndexedDumpIterator {
    /// Open the archive and its index, positioned at the first block
    ///
    /// An empty index produces an empty iterator.
    pub fn open<P, Q>(dump: P, index: Q, config: ReaderConfig) -> Result<Self>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        config.validate()?;
        let dump = dump.as_ref().to_path_buf();
        let mut index = IndexReader::open_with_buffer(index, config.read_buffer_size)?;
        let first = index.next().transpose()?;

        let mut iter = Self {
            compression: Compression::from_path(&dump),
            dump,
            config,
            index,
            pages: None,
            current_offset: None,
            next_offset: None,
            blocks_opened: 0,
            failed: false,
        };

        if let Some(entry) = first {
            iter.next_offset = iter.find_next_offset(entry.offset)?;
            iter.open_pages(entry.offset)?;
        }

        Ok(iter)
    }

    /// Offset of the block currently being read
    pub fn current_offset(&self) -> Option<u64> {
        self.current_offset
    }

    /// Offset of the block that follows the current one
    pub fn next_offset(&self) -> Option<u64> {
        self.next_offset
    }

    /// Number of blocks opened so far
    pub fn blocks_opened(&self) -> usize {
        self.blocks_opened
    }

    /// Release the open block and the index
    pub fn close(self) {
        tracing::debug!(
            dump = %self.dump.display(),
            blocks_opened = self.blocks_opened,
            "closing dump iterator"
        );
    }

    /// Scan the index for the first offset different from `current`
    fn find_next_offset(&mut self, current: u64) -> Result<Option<u64>> {
        for entry in &mut self.index {
            let entry = entry?;
            if entry.offset != current {
                return Ok(Some(entry.offset));
            }
        }
        Ok(None)
    }

    fn open_pages(&mut self, offset: u64) -> Result<()> {
        // Release the previous block before opening the next one
        self.pages = None;

        let block = open_block(
            &self.dump,
            offset,
            self.compression,
            self.config.read_buffer_size,
        )?;
        self.pages = Some(block.into_pages(
            self.config.read_buffer_size,
            self.config.markers.clone(),
            self.config.max_pages_per_block,
        ));
        self.current_offset = Some(offset);
        self.blocks_opened += 1;
        Ok(())
    }

    fn advance_block(&mut self, offset: u64) -> Result<()> {
        self.open_pages(offset)?;
        self.next_offset = self.find_next_offset(offset)?;
        Ok(())
    }

    fn fail(&mut self, error: ReaderError) -> Option<Result<Page>> {
        self.failed = true;
        self.pages = None;
        Some(Err(error))
    }
}

impl Iterator for IndexedDumpIterator {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.failed {
                return None;
            }

            match self.pages.as_mut()?.next() {
                Some(Ok(page)) => return Some(Ok(page)),
                Some(Err(e)) => return self.fail(e.into()),
                None => {}
            }

            let Some(offset) = self.next_offset else {
                self.pages = None;
                return None;
            };
            if let Err(e) = self.advance_block(offset) {
                return self.fail(e);
            }
        }
    }
}
