use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },
    #[error("empty path component: {field}")]
    EmptyComponent { field: &'static str },
    #[error("invalid path component for {field}: {value}")]
    InvalidComponent { field: &'static str, value: String },
    #[error("unknown granularity: {0}")]
    UnknownGranularity(String),
    #[error("config error in {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("cursor token: {0}")]
    Cursor(#[source] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Non-fatal problems encountered while still producing a result.
///
/// A call that returns `Ok` with warnings produced partial or degraded
/// output; callers should surface these rather than drop them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A time-range bound could not be parsed; the range was dropped.
    InvalidFilter { input: String, reason: String },
    /// A file could not be read and contributed nothing.
    Unreadable { path: PathBuf, message: String },
    /// Rows whose filter columns could not be decoded were skipped.
    MalformedRows { path: PathBuf, count: usize },
    /// A filter was requested but the file has no such column.
    MissingColumn { path: PathBuf, column: String },
    /// A filter was supplied that this read mode does not apply.
    IgnoredFilter { filter: String, reason: String },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::InvalidFilter { input, reason } => {
                write!(f, "time filter {input:?} ignored: {reason}")
            }
            Warning::Unreadable { path, message } => {
                write!(f, "unreadable file {}: {message}", path.display())
            }
            Warning::MalformedRows { path, count } => {
                write!(f, "skipped {count} malformed rows in {}", path.display())
            }
            Warning::MissingColumn { path, column } => {
                write!(f, "column {column} missing in {}", path.display())
            }
            Warning::IgnoredFilter { filter, reason } => {
                write!(f, "{filter} filter ignored: {reason}")
            }
        }
    }
}
