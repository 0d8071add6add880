//! Row readers for MediaWiki SQL table dumps
//!
//! Table dumps such as `enwiki-latest-category.sql` hold batches of rows in
//! extended `INSERT` statements, one statement per line:
//!
//! ```text
//! INSERT INTO `category` VALUES (1,'Physics',120,15,0),(2,'Chemistry',98,11,2);
//! ```
//!
//! [`InsertReader`] scans for those lines, splits each statement into
//! tuples and converts every tuple with [`SqlRow::from_values`]. A tuple that
//! does not convert is logged and skipped; the rest of the batch is kept.

use crate::error::{FormatError, FormatResult};
use crate::lines::LineSource;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::marker::PhantomData;
use std::path::Path;
use std::str::FromStr;

/// Timestamp layout used by `categorylinks.cl_timestamp`
pub const SQL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One value of a SQL tuple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    /// `NULL`
    Null,
    /// Unquoted literal, kept verbatim
    Number(String),
    /// Quoted string with backslash escapes resolved
    Text(String),
}

impl SqlValue {
    /// Quoted string content
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Parse an unquoted literal
    pub fn parse_number<T: FromStr>(&self) -> FormatResult<T>
    where
        T::Err: std::fmt::Display,
    {
        match self {
            Self::Number(raw) => raw
                .parse()
                .map_err(|e| FormatError::MalformedRow(format!("invalid number {raw:?}: {e}"))),
            other => Err(FormatError::MalformedRow(format!(
                "expected number, found {other:?}"
            ))),
        }
    }
}

/// Table row decodable from one tuple
pub trait SqlRow: Sized {
    /// Table name as it appears in `INSERT INTO \`...\``
    const TABLE: &'static str;

    /// Convert tuple values into a row
    fn from_values(values: &[SqlValue]) -> FormatResult<Self>;
}

/// Row of the `category` table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    /// `cat_id`
    pub id: u32,
    /// `cat_title`, spaces usually replaced by underscores
    pub title: String,
    /// `cat_pages`, member pages
    pub pages: i32,
    /// `cat_subcats`
    pub subcategories: i32,
    /// `cat_files`
    pub files: i32,
}

impl SqlRow for Category {
    const TABLE: &'static str = "category";

    fn from_values(values: &[SqlValue]) -> FormatResult<Self> {
        let [id, title, pages, subcategories, files, ..] = values else {
            return Err(FormatError::MalformedRow(format!(
                "category row needs 5 values, found {}",
                values.len()
            )));
        };

        Ok(Self {
            id: id.parse_number()?,
            title: text(title)?.to_string(),
            pages: pages.parse_number()?,
            subcategories: subcategories.parse_number()?,
            files: files.parse_number()?,
        })
    }
}

/// Row of the `categorylinks` table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CategoryLink {
    /// `cl_from`, id of the member page
    pub page_id: u32,
    /// `cl_to`, title of the category
    pub category_title: String,
    /// `cl_sortkey`
    pub sort_key: String,
    /// `cl_timestamp`
    pub timestamp: NaiveDateTime,
}

impl SqlRow for CategoryLink {
    const TABLE: &'static str = "categorylinks";

    fn from_values(values: &[SqlValue]) -> FormatResult<Self> {
        let [page_id, category_title, sort_key, timestamp, ..] = values else {
            return Err(FormatError::MalformedRow(format!(
                "categorylinks row needs at least 4 values, found {}",
                values.len()
            )));
        };

        let raw_timestamp = text(timestamp)?;
        let timestamp = NaiveDateTime::parse_from_str(raw_timestamp, SQL_TIMESTAMP_FORMAT)
            .map_err(|e| {
                FormatError::MalformedRow(format!("invalid timestamp {raw_timestamp:?}: {e}"))
            })?;

        Ok(Self {
            page_id: page_id.parse_number()?,
            category_title: text(category_title)?.to_string(),
            sort_key: text(sort_key)?.to_string(),
            timestamp,
        })
    }
}

fn text(value: &SqlValue) -> FormatResult<&str> {
    value
        .as_text()
        .ok_or_else(|| FormatError::MalformedRow(format!("expected string, found {value:?}")))
}

/// Statement prefix for `table`
pub fn insert_prefix(table: &str) -> String {
    format!("INSERT INTO `{table}` VALUES (")
}

/// Split the body of an `INSERT` statement into raw tuples
///
/// `body` starts right after the opening `(` of the first tuple. Tuples are
/// separated by `),(` and the statement ends at `);`; both only count
/// outside quoted strings.
pub fn split_tuples(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut tuples = Vec::new();
    let mut start = 0;
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_quote => i += 1,
            b'\'' => in_quote = !in_quote,
            b')' if !in_quote => {
                tuples.push(&body[start..i]);
                if bytes.get(i + 1) == Some(&b',') && bytes.get(i + 2) == Some(&b'(') {
                    i += 3;
                    start = i;
                    continue;
                }
                return tuples;
            }
            _ => {}
        }
        i += 1;
    }

    if start < bytes.len() {
        tuples.push(&body[start..]);
    }
    tuples
}

/// Tokenise one tuple into values
pub fn parse_tuple(tuple: &str) -> FormatResult<Vec<SqlValue>> {
    let mut values = Vec::new();
    let mut chars = tuple.chars().peekable();

    loop {
        if chars.peek() == Some(&'\'') {
            chars.next();
            let mut value = String::new();
            loop {
                match chars.next() {
                    Some('\\') => match chars.next() {
                        Some('n') => value.push('\n'),
                        Some('r') => value.push('\r'),
                        Some('t') => value.push('\t'),
                        Some('0') => value.push('\0'),
                        Some(c) => value.push(c),
                        None => return Err(unterminated(tuple)),
                    },
                    Some('\'') => break,
                    Some(c) => value.push(c),
                    None => return Err(unterminated(tuple)),
                }
            }
            values.push(SqlValue::Text(value));
        } else {
            let mut raw = String::new();
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                raw.push(c);
                chars.next();
            }
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(FormatError::MalformedRow(format!("empty value in {tuple:?}")));
            }
            values.push(if raw.eq_ignore_ascii_case("NULL") {
                SqlValue::Null
            } else {
                SqlValue::Number(raw.to_string())
            });
        }

        match chars.next() {
            Some(',') => {}
            None => return Ok(values),
            Some(c) => {
                return Err(FormatError::MalformedRow(format!(
                    "unexpected {c:?} after value in {tuple:?}"
                )));
            }
        }
    }
}

fn unterminated(tuple: &str) -> FormatError {
    FormatError::MalformedRow(format!("unterminated string in {tuple:?}"))
}

/// Lazy reader of typed rows from `INSERT` statements
#[derive(Debug)]
pub struct InsertReader<T> {
    lines: LineSource,
    prefix: String,
    pending: VecDeque<T>,
    statements: u64,
    skipped: u64,
    done: bool,
    _row: PhantomData<fn() -> T>,
}

/// Reader of the `category` table
pub type CategoryReader = InsertReader<Category>;

/// Reader of the `categorylinks` table
pub type CategoryLinkReader = InsertReader<CategoryLink>;

impl<T: SqlRow> InsertReader<T> {
    /// Create a reader over an existing line source
    pub fn new(lines: LineSource) -> Self {
        Self {
            lines,
            prefix: insert_prefix(T::TABLE),
            pending: VecDeque::new(),
            statements: 0,
            skipped: 0,
            done: false,
            _row: PhantomData,
        }
    }

    /// Open a table dump, decompressing it when its name ends in `.bz2`
    pub fn open<P: AsRef<Path>>(path: P) -> FormatResult<Self> {
        Ok(Self::new(LineSource::open(path)?))
    }

    /// Number of `INSERT` statements consumed
    pub fn statements_read(&self) -> u64 {
        self.statements
    }

    /// Number of tuples that failed to convert
    pub fn rows_skipped(&self) -> u64 {
        self.skipped
    }

    /// Release the underlying line source
    pub fn close(self) {
        self.lines.close();
    }

    /// Queue the rows of the next statement; `false` once no statement is left
    fn read_statement(&mut self) -> FormatResult<bool> {
        loop {
            let line = match self.lines.next_line() {
                Ok(line) => line,
                Err(FormatError::EndOfStream) => return Ok(false),
                Err(e) => return Err(e),
            };

            let Some(body) = line.strip_prefix(self.prefix.as_str()) else {
                continue;
            };
            self.statements += 1;

            for tuple in split_tuples(body) {
                match parse_tuple(tuple).and_then(|values| T::from_values(&values)) {
                    Ok(row) => self.pending.push_back(row),
                    Err(e) => {
                        self.skipped += 1;
                        tracing::warn!(
                            table = T::TABLE,
                            statement = self.statements,
                            error = %e,
                            "skipping malformed row"
                        );
                    }
                }
            }
            return Ok(true);
        }
    }
}

impl<T: SqlRow> Iterator for InsertReader<T> {
    type Item = FormatResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }
            if self.done {
                return None;
            }
            match self.read_statement() {
                Ok(true) => {}
                Ok(false) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
