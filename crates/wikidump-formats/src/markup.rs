//! Line-oriented page extraction from MediaWiki XML
//!
//! Dumps are pretty-printed with one element per line, so a page can be
//! pulled out by matching line suffixes instead of running an XML parser:
//!
//! ```text
//!   <page>                                   SeekPageStart
//!     <title>Cat</title>                     ReadTitle
//!     <ns>0</ns>                             SeekNamespaceEnd
//!     <id>1</id>                             ReadId
//!     <revision>
//!       ...
//!       <format>text/x-wiki</format>         SeekFormatEnd
//!       <text bytes="4" xml:space="preserve">Meow</text>   ReadText
//!       <sha1>...</sha1>
//!     </revision>
//!   </page>
//! ```
//!
//! [`advance`] performs one transition of the [`ExtractState`] machine.
//! [`PageExtractor`] drives it and applies the per-block page limit.

use crate::error::{FormatError, FormatResult};
use crate::lines::LineSource;
use crate::page::Page;
use serde::{Deserialize, Serialize};

/// Pages per bzip2 stream in multistream dumps
pub const DEFAULT_PAGES_PER_BLOCK: usize = 100;

/// Line suffixes the extractor keys on
///
/// Matching happens on trimmed lines and is case sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpMarkers {
    /// Line opening a page
    pub page_open: String,
    /// Line closing the namespace element, directly followed by the page id
    pub namespace_close: String,
    /// Line closing the format element, directly followed by the text
    pub format_close: String,
    /// Prefix of the text element
    pub text_open: String,
    /// Suffix closing the text element
    pub text_close: String,
    /// Suffix of a self-closing element
    pub self_closing: String,
    /// Line closing the dump header of unpacked dumps
    pub siteinfo_close: String,
}

impl Default for DumpMarkers {
    fn default() -> Self {
        Self {
            page_open: "<page>".to_string(),
            namespace_close: "</ns>".to_string(),
            format_close: "</format>".to_string(),
            text_open: "<text".to_string(),
            text_close: "</text>".to_string(),
            self_closing: "/>".to_string(),
            siteinfo_close: "</siteinfo>".to_string(),
        }
    }
}

/// State of the extraction machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractState {
    /// Looking for the line opening the next page
    SeekPageStart,
    /// The next line holds the title
    ReadTitle,
    /// Looking for the end of the namespace element
    SeekNamespaceEnd {
        /// Title read so far
        title: String,
    },
    /// The next line holds the page id
    ReadId {
        /// Title read so far
        title: String,
    },
    /// Looking for the end of the format element
    SeekFormatEnd {
        /// Title read so far
        title: String,
        /// Page id
        id: u64,
    },
    /// The next lines hold the text element
    ReadText {
        /// Title read so far
        title: String,
        /// Page id
        id: u64,
    },
}

/// Outcome of one transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Continue in the given state
    Next(ExtractState),
    /// A page is complete; the machine restarts at [`ExtractState::SeekPageStart`]
    Emit(Page),
    /// No further page starts in this stream
    End,
}

/// Perform a single transition, consuming lines from `lines`
///
/// Running out of lines while looking for a page start ends the machine.
/// Running out anywhere else means the page was truncated.
pub fn advance(
    state: ExtractState,
    lines: &mut LineSource,
    markers: &DumpMarkers,
) -> FormatResult<Step> {
    let step = match state {
        ExtractState::SeekPageStart => {
            return match lines.skip_to_line_ending_with(&markers.page_open) {
                Ok(_) => Ok(Step::Next(ExtractState::ReadTitle)),
                Err(FormatError::EndOfStream) => Ok(Step::End),
                Err(e) => Err(e),
            };
        }
        ExtractState::ReadTitle => {
            let line = lines.next_line().map_err(truncated)?;
            Step::Next(ExtractState::SeekNamespaceEnd {
                title: element_text(&line).to_string(),
            })
        }
        ExtractState::SeekNamespaceEnd { title } => {
            lines
                .skip_to_line_ending_with(&markers.namespace_close)
                .map_err(truncated)?;
            Step::Next(ExtractState::ReadId { title })
        }
        ExtractState::ReadId { title } => {
            let line = lines.next_line().map_err(truncated)?;
            let raw = element_text(&line);
            let id = raw.trim().parse::<u64>().map_err(|e| {
                FormatError::MalformedRecord(format!("invalid id {raw:?} for page {title:?}: {e}"))
            })?;
            Step::Next(ExtractState::SeekFormatEnd { title, id })
        }
        ExtractState::SeekFormatEnd { title, id } => {
            lines
                .skip_to_line_ending_with(&markers.format_close)
                .map_err(truncated)?;
            Step::Next(ExtractState::ReadText { title, id })
        }
        ExtractState::ReadText { title, id } => {
            let text = read_text(lines, markers).map_err(truncated)?;
            Step::Emit(Page::new(id, title, text))
        }
    };
    Ok(step)
}

/// Text between the first `>` and the last `</` of a one-line element
fn element_text(line: &str) -> &str {
    let inner = line.split_once('>').map_or(line, |(_, rest)| rest);
    inner.rfind("</").map_or(inner, |pos| &inner[..pos])
}

fn after_open_tag(line: &str) -> &str {
    line.split_once('>').map_or(line, |(_, rest)| rest)
}

fn before_close_tag<'a>(line: &'a str, close: &str) -> &'a str {
    line.rfind(close).map_or(line, |pos| &line[..pos])
}

fn read_text(lines: &mut LineSource, markers: &DumpMarkers) -> FormatResult<String> {
    let first = lines.next_trimmed()?;

    // <text bytes="0" xml:space="preserve" />
    if first.starts_with(&markers.text_open)
        && first.ends_with(&markers.self_closing)
        && first.find('>') == Some(first.len() - 1)
    {
        return Ok(String::new());
    }

    if first.ends_with(&markers.text_close) {
        return Ok(before_close_tag(after_open_tag(&first), &markers.text_close).to_string());
    }

    let mut text = after_open_tag(&first).to_string();
    loop {
        let line = lines.next_trimmed()?;
        if line.ends_with(&markers.text_close) {
            text.push_str(before_close_tag(&line, &markers.text_close));
            return Ok(text);
        }
        text.push_str(&line);
    }
}

fn truncated(e: FormatError) -> FormatError {
    match e {
        FormatError::EndOfStream => {
            FormatError::MalformedRecord("stream ended inside a page".to_string())
        }
        other => other,
    }
}

/// Pull-based page iterator over one line source
///
/// With a limit set, the extractor never reads past the limit-th page. The
/// first page's errors are returned to the caller. Errors while probing any
/// later page end the sequence instead, which tolerates trailing non-page
/// data at the end of a block.
#[derive(Debug)]
pub struct PageExtractor {
    lines: LineSource,
    markers: DumpMarkers,
    limit: Option<usize>,
    emitted: usize,
    finished: bool,
}

impl PageExtractor {
    /// Create an extractor over `lines`
    pub fn new(lines: LineSource, markers: DumpMarkers, limit: Option<usize>) -> Self {
        Self {
            lines,
            markers,
            limit,
            emitted: 0,
            finished: false,
        }
    }

    /// Extractor for one multistream block with the default limit
    pub fn for_block(lines: LineSource) -> Self {
        Self::new(lines, DumpMarkers::default(), Some(DEFAULT_PAGES_PER_BLOCK))
    }

    /// Number of pages returned so far
    pub fn pages_emitted(&self) -> usize {
        self.emitted
    }

    /// Whether the page limit has been reached
    pub fn limit_reached(&self) -> bool {
        self.limit.is_some_and(|limit| self.emitted >= limit)
    }

    /// Release the underlying line source
    pub fn close(self) {
        self.lines.close();
    }

    fn read_page(&mut self) -> FormatResult<Option<Page>> {
        let mut state = ExtractState::SeekPageStart;
        loop {
            match advance(state, &mut self.lines, &self.markers)? {
                Step::Next(next) => state = next,
                Step::Emit(page) => return Ok(Some(page)),
                Step::End => return Ok(None),
            }
        }
    }

    /// Read a page after the first one
    ///
    /// Anything that fails to parse here is treated as the end of the data.
    fn probe_next_page(&mut self) -> Option<Page> {
        match self.read_page() {
            Ok(page) => page,
            Err(e) => {
                tracing::debug!(
                    pages_emitted = self.emitted,
                    lines_read = self.lines.lines_read(),
                    error = %e,
                    "treating unreadable trailing data as end of pages"
                );
                None
            }
        }
    }
}

impl Iterator for PageExtractor {
    type Item = FormatResult<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.limit_reached() {
            return None;
        }

        let page = if self.emitted == 0 {
            match self.read_page() {
                Ok(page) => page,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        } else {
            self.probe_next_page()
        };

        if let Some(page) = page {
            self.emitted += 1;
            Some(Ok(page))
        } else {
            self.finished = true;
            None
        }
    }
}
