//! Record cadence of a dataset partition.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scan::HeaderPolicy;

/// Time granularity, named after the on-disk directory (`1d`, `1m`, `15m`, `tick`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "1d")]
    Day,
    #[serde(rename = "1m")]
    Minute,
    #[serde(rename = "15m")]
    Minute15,
    #[serde(rename = "tick")]
    Tick,
}

/// Shape of the rows stored at a granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// OHLCV bar with `bob`/`eob` period bounds.
    Bar,
    /// Single trade with one `created_at` timestamp.
    Tick,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Day,
        Granularity::Minute,
        Granularity::Minute15,
        Granularity::Tick,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Granularity::Day => "1d",
            Granularity::Minute => "1m",
            Granularity::Minute15 => "15m",
            Granularity::Tick => "tick",
        }
    }

    pub fn kind(self) -> RecordKind {
        match self {
            Granularity::Tick => RecordKind::Tick,
            _ => RecordKind::Bar,
        }
    }

    /// Daily files hold every symbol of a date; the others are one file per symbol.
    pub fn is_multi_symbol(self) -> bool {
        matches!(self, Granularity::Day)
    }

    /// Bar headers are consumed; tick headers are passed through once per file.
    pub fn header_policy(self) -> HeaderPolicy {
        match self.kind() {
            RecordKind::Bar => HeaderPolicy::Skip,
            RecordKind::Tick => HeaderPolicy::Emit,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim() {
            "1d" => Ok(Granularity::Day),
            "1m" => Ok(Granularity::Minute),
            "15m" => Ok(Granularity::Minute15),
            "tick" => Ok(Granularity::Tick),
            other => Err(Error::UnknownGranularity(other.to_string())),
        }
    }
}
