//! Resumable read position across an ordered file list.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Where the next window starts.
///
/// `remaining_files` holds the files not yet fully consumed, current file
/// first; `next_offset` is the 0-based data-line index (header excluded)
/// of the first unconsumed line in that file. Callers treat the cursor as
/// opaque and hand it back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    remaining_files: Vec<PathBuf>,
    next_offset: usize,
}

impl Cursor {
    /// A cursor at the first data line of `files`.
    pub fn start(files: Vec<PathBuf>) -> Self {
        Self {
            remaining_files: files,
            next_offset: 0,
        }
    }

    pub(crate) fn at(remaining_files: Vec<PathBuf>, next_offset: usize) -> Self {
        let next_offset = if remaining_files.is_empty() {
            0
        } else {
            next_offset
        };
        Self {
            remaining_files,
            next_offset,
        }
    }

    pub fn remaining_files(&self) -> &[PathBuf] {
        &self.remaining_files
    }

    pub fn next_offset(&self) -> usize {
        self.next_offset
    }

    /// No files left: the query is complete.
    pub fn is_exhausted(&self) -> bool {
        self.remaining_files.is_empty()
    }

    /// Fails when a remaining path is not valid UTF-8.
    pub fn to_token(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Error::Cursor)
    }

    pub fn from_token(token: &str) -> Result<Self> {
        serde_json::from_str(token).map_err(Error::Cursor)
    }
}
