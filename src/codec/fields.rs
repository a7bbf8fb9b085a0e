//! Field splitting for the two CSV dialects found in the dataset.

use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// How a data line is split into fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Split on every comma or tab. No quoting, no escaping.
    #[default]
    Plain,
    /// RFC 4180 comma separated: double-quoted fields may contain commas.
    Quoted,
}

/// Fields of one line, borrowed where the dialect allows it.
#[derive(Debug, Clone)]
pub enum Fields<'a> {
    Plain(Vec<&'a str>),
    Quoted(StringRecord),
}

impl<'a> Fields<'a> {
    pub fn split(line: &'a str, dialect: Dialect) -> Result<Self> {
        match dialect {
            Dialect::Plain => Ok(Fields::Plain(
                line.split(|c| c == ',' || c == '\t').collect(),
            )),
            Dialect::Quoted => {
                let mut reader = ReaderBuilder::new()
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes());
                let mut record = StringRecord::new();
                reader
                    .read_record(&mut record)
                    .map_err(|e| Error::malformed(format!("csv: {e}")))?;
                Ok(Fields::Quoted(record))
            }
        }
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        match self {
            Fields::Plain(parts) => parts.get(idx).copied(),
            Fields::Quoted(record) => record.get(idx),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Fields::Plain(parts) => parts.len(),
            Fields::Quoted(record) => record.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len()).filter_map(move |idx| self.get(idx))
    }
}

/// Extracts a single column without decoding the rest of the record.
///
/// Returns `None` when the line is shorter than `idx + 1` fields or cannot
/// be split under `dialect`.
pub fn parse_field(line: &str, idx: usize, dialect: Dialect) -> Option<String> {
    match dialect {
        Dialect::Plain => line
            .split(|c| c == ',' || c == '\t')
            .nth(idx)
            .map(str::to_string),
        Dialect::Quoted => Fields::split(line, dialect)
            .ok()?
            .get(idx)
            .map(str::to_string),
    }
}
