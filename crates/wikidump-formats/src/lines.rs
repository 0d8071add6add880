//! Lazy line access over plain and bzip2-compressed streams
//!
//! Every other reader in this crate consumes a [`LineSource`]. Lines are
//! handed out without their trailing line terminator and without any other
//! trimming, so callers decide what whitespace means for their format.

use crate::error::{FormatError, FormatResult};
use bzip2::read::MultiBzDecoder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Default read buffer capacity (1 MiB)
pub const DEFAULT_BUFFER_SIZE: usize = 1024 * 1024;

/// File name suffix identifying bzip2-compressed dump files
pub const BZIP2_SUFFIX: &str = ".bz2";

/// Compression applied to a dump file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compression {
    /// Plain text
    None,
    /// One or more concatenated bzip2 streams
    Bzip2,
}

impl Compression {
    /// Detect compression from the file name suffix
    pub fn from_path(path: &Path) -> Self {
        let is_bz2 = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(BZIP2_SUFFIX));

        if is_bz2 { Self::Bzip2 } else { Self::None }
    }

    /// Whether a decoder has to be layered over the raw bytes
    pub fn is_compressed(self) -> bool {
        matches!(self, Self::Bzip2)
    }
}

/// Forward-only sequence of text lines
///
/// The source owns its reader; dropping it (or calling [`LineSource::close`])
/// releases the underlying file handle.
pub struct LineSource {
    reader: Box<dyn BufRead + Send>,
    buffer: Vec<u8>,
    peeked: Option<String>,
    exhausted: bool,
    lines_read: u64,
}

impl LineSource {
    /// Wrap any reader with the default buffer capacity
    pub fn new<R: Read + Send + 'static>(reader: R) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, reader)
    }

    /// Wrap any reader with an explicit buffer capacity
    pub fn with_capacity<R: Read + Send + 'static>(capacity: usize, reader: R) -> Self {
        Self::from_buf_read(BufReader::with_capacity(capacity, reader))
    }

    /// Wrap an already buffered reader
    pub fn from_buf_read<R: BufRead + Send + 'static>(reader: R) -> Self {
        Self {
            reader: Box::new(reader),
            buffer: Vec::new(),
            peeked: None,
            exhausted: false,
            lines_read: 0,
        }
    }

    /// Wrap a reader, decoding it first when `compression` requires it
    ///
    /// Compressed input is decoded across all concatenated streams.
    pub fn from_reader<R: Read + Send + 'static>(
        reader: R,
        compression: Compression,
        capacity: usize,
    ) -> Self {
        match compression {
            Compression::Bzip2 => Self::with_capacity(capacity, MultiBzDecoder::new(reader)),
            Compression::None => Self::with_capacity(capacity, reader),
        }
    }

    /// Open a file, choosing the decoder from its name
    pub fn open<P: AsRef<Path>>(path: P) -> FormatResult<Self> {
        Self::open_with_buffer(path, DEFAULT_BUFFER_SIZE)
    }

    /// Open a file with an explicit buffer capacity
    pub fn open_with_buffer<P: AsRef<Path>>(path: P, capacity: usize) -> FormatResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let compression = Compression::from_path(path);
        tracing::trace!(path = %path.display(), ?compression, "opening line source");
        Ok(Self::from_reader(file, compression, capacity))
    }

    /// Whether another line can be read
    pub fn has_next(&mut self) -> FormatResult<bool> {
        self.fill_peek()
    }

    /// Read the next line
    ///
    /// Fails with [`FormatError::EndOfStream`] when the stream is exhausted.
    pub fn next_line(&mut self) -> FormatResult<String> {
        if !self.fill_peek()? {
            return Err(FormatError::EndOfStream);
        }
        let line = self.peeked.take().ok_or(FormatError::EndOfStream)?;
        self.lines_read += 1;
        Ok(line)
    }

    /// Read the next line with surrounding whitespace removed
    pub fn next_trimmed(&mut self) -> FormatResult<String> {
        let line = self.next_line()?;
        Ok(line.trim().to_string())
    }

    /// Discard lines until one whose trimmed form ends with `suffix`
    ///
    /// Returns the matching line untouched. Matching is case sensitive.
    pub fn skip_to_line_ending_with(&mut self, suffix: &str) -> FormatResult<String> {
        loop {
            let line = self.next_line()?;
            if line.trim().ends_with(suffix) {
                return Ok(line);
            }
        }
    }

    /// Number of lines handed out so far
    pub fn lines_read(&self) -> u64 {
        self.lines_read
    }

    /// Release the underlying reader
    pub fn close(self) {
        tracing::trace!(lines_read = self.lines_read, "closing line source");
    }

    fn fill_peek(&mut self) -> FormatResult<bool> {
        if self.peeked.is_some() {
            return Ok(true);
        }
        if self.exhausted {
            return Ok(false);
        }

        self.buffer.clear();
        if self.reader.read_until(b'\n', &mut self.buffer)? == 0 {
            self.exhausted = true;
            return Ok(false);
        }

        if self.buffer.last() == Some(&b'\n') {
            self.buffer.pop();
            if self.buffer.last() == Some(&b'\r') {
                self.buffer.pop();
            }
        }
        self.peeked = Some(String::from_utf8_lossy(&self.buffer).into_owned());
        Ok(true)
    }
}

impl Iterator for LineSource {
    type Item = FormatResult<String>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_line() {
            Ok(line) => Some(Ok(line)),
            Err(FormatError::EndOfStream) => None,
            Err(e) => {
                self.exhausted = true;
                Some(Err(e))
            }
        }
    }
}

impl fmt::Debug for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSource")
            .field("lines_read", &self.lines_read)
            .field("exhausted", &self.exhausted)
            .finish_non_exhaustive()
    }
}
