//! Whole-range reads: collect every matching line, then paginate by index.

use std::path::{Path, PathBuf};

use log::warn;
use serde::Serialize;

use crate::error::{Error, Result, Warning};
use crate::filter::RecordFilter;
use crate::scan::{FileScanner, LineSink, ReadOptions, ScanEnd};

/// Upper bound on lines returned by one [`get_day_range`] call.
pub const DAY_RANGE_CAP: usize = 3000;

/// Matching lines of a whole file set, each terminated by `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DayText {
    pub text: String,
    pub lines: usize,
    pub warnings: Vec<Warning>,
}

impl LineSink for DayText {
    fn is_full(&self) -> bool {
        false
    }

    fn push(&mut self, line: String) {
        self.text.push_str(&line);
        self.text.push('\n');
        self.lines += 1;
    }
}

#[derive(Default)]
struct Counter(u64);

impl LineSink for Counter {
    fn is_full(&self) -> bool {
        false
    }

    fn push(&mut self, _line: String) {
        self.0 += 1;
    }
}

/// Concatenates the lines of `files` matching `filter`.
///
/// A file that fails to read contributes nothing, not even the lines read
/// before the failure, and is reported as a warning.
pub fn collect_day_text(
    files: &[PathBuf],
    options: ReadOptions,
    filter: &RecordFilter,
) -> DayText {
    let mut out = DayText::default();
    let mut scanner = FileScanner::new(options, filter);
    let unreadable = scan_each(
        files,
        |path, part: &mut DayText| scanner.scan(path, 0, part),
        |part| {
            out.text.push_str(&part.text);
            out.lines += part.lines;
        },
    );
    out.warnings = scanner.into_warnings();
    out.warnings.extend(unreadable);
    out
}

/// Exact number of lines in `files` matching `filter`.
///
/// Files that fail to read count zero, as in [`collect_day_text`].
pub fn count_matching(
    files: &[PathBuf],
    options: ReadOptions,
    filter: &RecordFilter,
) -> (u64, Vec<Warning>) {
    let mut total = 0u64;
    let mut scanner = FileScanner::new(options, filter);
    let unreadable = scan_each(
        files,
        |path, part: &mut Counter| scanner.scan(path, 0, part),
        |part| total += part.0,
    );
    let mut warnings = scanner.into_warnings();
    warnings.extend(unreadable);
    (total, warnings)
}

/// Scans each file into a fresh sink and hands it to `commit` only when the
/// whole file was read.
fn scan_each<S: LineSink + Default>(
    files: &[PathBuf],
    mut scan: impl FnMut(&Path, &mut S) -> Result<ScanEnd>,
    mut commit: impl FnMut(S),
) -> Vec<Warning> {
    let mut unreadable = Vec::new();
    for path in files {
        let mut part = S::default();
        match scan(path.as_path(), &mut part) {
            Ok(_) => commit(part),
            Err(err) => unreadable.push(unreadable_warning(path, err)),
        }
    }
    unreadable
}

/// Lines `offset..offset + limit` of `text`, each followed by `\n`.
///
/// A `limit` of zero means "to the end". At most [`DAY_RANGE_CAP`] lines are
/// returned whatever `limit` asks for.
pub fn get_day_range(text: &str, offset: usize, limit: usize) -> String {
    get_day_range_capped(text, offset, limit, DAY_RANGE_CAP)
}

pub fn get_day_range_capped(text: &str, offset: usize, limit: usize, cap: usize) -> String {
    let take = if limit == 0 { cap } else { limit.min(cap) };
    let mut out = String::new();
    for line in text.lines().skip(offset).take(take) {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn unreadable_warning(path: &Path, err: Error) -> Warning {
    warn!("skipping {}: {err}", path.display());
    Warning::Unreadable {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}
