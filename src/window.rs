//! Windowed reads over an ordered file list.
//!
//! A window is at most `budget` matching lines starting at a [`Cursor`]. The
//! returned cursor points at the exact next unconsumed data line, so a
//! sequence of windows yields every matching line once, in file order.

use std::path::PathBuf;

use log::debug;
use serde::Serialize;

use crate::codec::Bar;
use crate::cursor::Cursor;
use crate::error::{Result, Warning};
use crate::filter::RecordFilter;
use crate::scan::{FileScanner, LineSink, ReadOptions, ScanEnd};

/// One bounded slice of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Window {
    /// Matching data lines in order. With [`HeaderPolicy::Emit`] each file's
    /// header precedes that file's lines.
    ///
    /// [`HeaderPolicy::Emit`]: crate::scan::HeaderPolicy::Emit
    pub lines: Vec<String>,
    /// Number of data lines in `lines`, headers excluded.
    pub matched: usize,
    pub cursor: Cursor,
    pub warnings: Vec<Warning>,
}

impl Window {
    pub fn remaining_files(&self) -> &[PathBuf] {
        self.cursor.remaining_files()
    }

    /// True when no further window can return data.
    pub fn is_last(&self) -> bool {
        self.cursor.is_exhausted()
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Strictly decodes the lines as bars. Only meaningful for bar windows
    /// read without emitted headers.
    pub fn decode_bars(&self) -> Result<Vec<Bar>> {
        self.lines.iter().map(|line| Bar::parse_line(line)).collect()
    }
}

struct Budgeted {
    budget: usize,
    lines: Vec<String>,
    matched: usize,
}

impl LineSink for Budgeted {
    fn is_full(&self) -> bool {
        self.matched >= self.budget
    }

    fn header(&mut self, line: String) {
        self.lines.push(line);
    }

    fn push(&mut self, line: String) {
        self.lines.push(line);
        self.matched += 1;
    }
}

/// Reads windows with fixed options. Holds no state between calls.
#[derive(Debug, Clone, Copy)]
pub struct WindowReader {
    options: ReadOptions,
}

impl WindowReader {
    pub fn new(options: ReadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Returns up to `budget` lines matching `filter`.
    ///
    /// With a cursor, reading resumes at `cursor.next_offset()` in the first
    /// of `cursor.remaining_files()` and `files` is ignored; without one it
    /// starts at the first data line of `files`. A zero budget returns an
    /// empty window whose cursor is the starting position.
    ///
    /// Any file that cannot be read fails the call.
    pub fn read(
        &self,
        files: &[PathBuf],
        cursor: Option<&Cursor>,
        budget: usize,
        filter: &RecordFilter,
    ) -> Result<Window> {
        let (files, skip) = match cursor {
            Some(cursor) => (cursor.remaining_files(), cursor.next_offset()),
            None => (files, 0),
        };

        let mut sink = Budgeted {
            budget,
            lines: Vec::new(),
            matched: 0,
        };
        let mut scanner = FileScanner::new(self.options, filter);
        let mut next = Cursor::at(Vec::new(), 0);

        for (idx, path) in files.iter().enumerate() {
            if sink.is_full() {
                debug!("budget {budget} reached before {}", path.display());
                next = Cursor::at(files[idx..].to_vec(), if idx == 0 { skip } else { 0 });
                break;
            }
            let start_line = if idx == 0 { skip } else { 0 };
            match scanner.scan(path, start_line, &mut sink)? {
                ScanEnd::Exhausted => {}
                ScanEnd::Stopped { next_offset } => {
                    debug!(
                        "budget {budget} reached in {} at line {next_offset}",
                        path.display()
                    );
                    next = Cursor::at(files[idx..].to_vec(), next_offset);
                    break;
                }
            }
        }

        Ok(Window {
            lines: sink.lines,
            matched: sink.matched,
            cursor: next,
            warnings: scanner.into_warnings(),
        })
    }
}
