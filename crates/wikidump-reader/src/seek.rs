//! Opening single compressed blocks of a multistream archive
//!
//! A multistream archive is a concatenation of independent bzip2 streams.
//! A live decoder cannot be moved to another stream, so every block is
//! opened on a fresh reader positioned at the block's raw byte offset, with
//! a fresh decoder that stops at the end of that one stream.

use crate::{ReaderError, Result};
use bzip2::bufread::BzDecoder;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use wikidump_formats::{Compression, DumpMarkers, LineSource, PageExtractor};

/// Decoded content of one block
pub struct BlockStream {
    offset: u64,
    inner: Box<dyn Read + Send>,
}

impl BlockStream {
    /// Raw byte offset the block starts at
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Split the decoded block into lines
    pub fn into_lines(self, capacity: usize) -> LineSource {
        LineSource::with_capacity(capacity, self)
    }

    /// Extract at most `limit` pages from the block
    pub fn into_pages(self, capacity: usize, markers: DumpMarkers, limit: usize) -> PageExtractor {
        PageExtractor::new(self.into_lines(capacity), markers, Some(limit))
    }
}

impl Read for BlockStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.inner.read(buf)
    }
}

impl fmt::Debug for BlockStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockStream")
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

/// Open the block starting `offset` raw bytes into the archive at `path`
///
/// The archive file is opened anew on every call.
pub fn open_block<P: AsRef<Path>>(
    path: P,
    offset: u64,
    compression: Compression,
    capacity: usize,
) -> Result<BlockStream> {
    let path = path.as_ref();
    let file = File::open(path)?;
    tracing::debug!(path = %path.display(), offset, "opening block");
    open_block_in(file, offset, compression, capacity)
}

/// Open the block starting `offset` raw bytes into `reader`
///
/// Fails with [`ReaderError::SeekIncomplete`] when the stream is shorter
/// than `offset`. An offset equal to the stream length opens an empty block;
/// decoding it then fails with an I/O error.
pub fn open_block_in<R>(
    mut reader: R,
    offset: u64,
    compression: Compression,
    capacity: usize,
) -> Result<BlockStream>
where
    R: Read + Seek + Send + 'static,
{
    let available = reader.seek(SeekFrom::End(0))?;
    if available < offset {
        return Err(ReaderError::SeekIncomplete {
            requested: offset,
            available,
        });
    }
    reader.seek(SeekFrom::Start(offset))?;

    let buffered = BufReader::with_capacity(capacity, reader);
    let inner: Box<dyn Read + Send> = match compression {
        Compression::Bzip2 => Box::new(BzDecoder::new(buffered)),
        Compression::None => Box::new(buffered),
    };

    Ok(BlockStream { offset, inner })
}
