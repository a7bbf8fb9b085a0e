//! Header-row column resolution.
//!
//! Every partition file starts with a header row. Column names are matched
//! case-insensitively; a missing column disables the filter that needs it.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::codec::{Dialect, Fields};
use crate::error::{Error, Result};
use crate::granularity::RecordKind;

pub const SYMBOL_COLUMN: &str = "symbol";
pub const BAR_START_COLUMN: &str = "bob";
pub const BAR_END_COLUMN: &str = "eob";
pub const TICK_TIME_COLUMN: &str = "created_at";

/// Zero-based index of `name` in `header`, or `None` when absent.
pub fn resolve_column(header: &Fields<'_>, name: &str) -> Option<usize> {
    header
        .iter()
        .position(|h| h.trim().trim_start_matches('\u{feff}').eq_ignore_ascii_case(name))
}

/// Indices of the columns the record filter reads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Columns {
    pub symbol: Option<usize>,
    /// Period start for bars, trade time for ticks.
    pub start: Option<usize>,
    /// Period end; bars only.
    pub end: Option<usize>,
}

impl Columns {
    /// Fixed positions of the canonical bar layout
    /// `symbol,open,high,low,close,amount,volume,bob,eob,type`.
    pub const CANONICAL_BAR: Columns = Columns {
        symbol: Some(0),
        start: Some(7),
        end: Some(8),
    };

    pub fn resolve(header_line: &str, dialect: Dialect, kind: RecordKind) -> Result<Self> {
        let header = Fields::split(header_line, dialect)?;
        let symbol = resolve_column(&header, SYMBOL_COLUMN);
        Ok(match kind {
            RecordKind::Bar => Columns {
                symbol,
                start: resolve_column(&header, BAR_START_COLUMN),
                end: resolve_column(&header, BAR_END_COLUMN),
            },
            RecordKind::Tick => Columns {
                symbol,
                start: resolve_column(&header, TICK_TIME_COLUMN),
                end: None,
            },
        })
    }

    /// Reads the first line of `path` and resolves it.
    pub fn from_file(path: &Path, dialect: Dialect, kind: RecordKind) -> Result<Self> {
        let header = read_header(path)?.unwrap_or_default();
        Columns::resolve(&header, dialect, kind)
    }
}

/// First line of a file, `None` for an empty file.
pub fn read_header(path: &Path) -> Result<Option<String>> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| Error::io(path, e))?;
    if read == 0 {
        return Ok(None);
    }
    let trimmed = line.trim_end_matches(['\n', '\r']);
    Ok(Some(trimmed.to_string()))
}
