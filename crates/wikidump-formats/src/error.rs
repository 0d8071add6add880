//! Error types for dump format parsing

use thiserror::Error;

/// Format operation result type
pub type FormatResult<T> = Result<T, FormatError>;

/// Errors raised while reading lines, index entries, pages or SQL rows
#[derive(Debug, Error)]
pub enum FormatError {
    /// No further line is available in the underlying stream
    #[error("End of stream")]
    EndOfStream,

    /// Index line could not be parsed into `offset:id:title`
    #[error("Malformed index line {line:?}: {reason}")]
    MalformedIndex {
        /// The offending line
        line: String,
        /// What was wrong with it
        reason: String,
    },

    /// Page markup did not have the expected shape
    #[error("Malformed page record: {0}")]
    MalformedRecord(String),

    /// Redirect target requested for a page that is not a redirect stub
    #[error("Page {title:?} is not a redirect")]
    NotARedirect {
        /// Title of the page
        title: String,
    },

    /// SQL tuple could not be converted into a row
    #[error("Malformed SQL row: {0}")]
    MalformedRow(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormatError {
    /// Check if this error only signals exhaustion of a stream
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /// Check if this error comes from malformed input rather than I/O
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedIndex { .. } | Self::MalformedRecord(_) | Self::MalformedRow(_)
        )
    }
}
