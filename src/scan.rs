//! Line-by-line scan of one partition file.
//!
//! The scanner owns header handling, column resolution and filtering; what
//! happens to matching lines is decided by a [`LineSink`].

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::codec::{Columns, Dialect, Fields, BAR_START_COLUMN, TICK_TIME_COLUMN};
use crate::error::{Error, Result, Warning};
use crate::filter::RecordFilter;
use crate::granularity::RecordKind;

/// What to do with the first line of each file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderPolicy {
    /// Read it for column names, do not output it.
    #[default]
    Skip,
    /// Read it for column names and pass it to the sink verbatim.
    Emit,
    /// Files have no header; every line is data.
    Absent,
}

/// How lines are split and which columns the filter reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    pub dialect: Dialect,
    pub header: HeaderPolicy,
    pub kind: RecordKind,
    /// Fixed column positions. Required for filtering headerless files;
    /// overrides header resolution otherwise.
    pub columns: Option<Columns>,
}

impl ReadOptions {
    pub fn new(dialect: Dialect, header: HeaderPolicy, kind: RecordKind) -> Self {
        Self {
            dialect,
            header,
            kind,
            columns: None,
        }
    }

    pub fn with_columns(mut self, columns: Columns) -> Self {
        self.columns = Some(columns);
        self
    }

    fn time_column(&self) -> &'static str {
        match self.kind {
            RecordKind::Bar => BAR_START_COLUMN,
            RecordKind::Tick => TICK_TIME_COLUMN,
        }
    }
}

/// Receives the output of a scan.
pub trait LineSink {
    /// Checked before each data line; `true` stops the scan at that line.
    fn is_full(&self) -> bool;

    fn header(&mut self, _line: String) {}

    fn push(&mut self, line: String);
}

/// How a file scan ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// Every data line was consumed.
    Exhausted,
    /// The sink filled up; `next_offset` is the first unconsumed data line.
    Stopped { next_offset: usize },
}

/// Scans files with one set of options and one filter, caching the column
/// layout across files that share a header.
pub struct FileScanner<'a> {
    options: ReadOptions,
    filter: &'a RecordFilter,
    cached: Option<(String, Columns)>,
    warnings: Vec<Warning>,
}

impl<'a> FileScanner<'a> {
    pub fn new(options: ReadOptions, filter: &'a RecordFilter) -> Self {
        Self {
            options,
            filter,
            cached: None,
            warnings: Vec::new(),
        }
    }

    pub fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }

    /// Scans `path`, skipping the first `start_line` data lines.
    ///
    /// Skipped, blank, filtered-out and malformed lines all advance the
    /// position; only matching lines reach the sink. A line that is not
    /// valid UTF-8 is malformed. Lines are not decoded once the sink is
    /// full. The file is closed on every return path.
    pub fn scan(
        &mut self,
        path: &Path,
        start_line: usize,
        sink: &mut dyn LineSink,
    ) -> Result<ScanEnd> {
        let io_err = |e: io::Error| Error::io(path, e);
        let file = File::open(path).map_err(io_err)?;
        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();

        let columns = match self.options.header {
            HeaderPolicy::Absent => self.options.columns.unwrap_or_default(),
            HeaderPolicy::Skip | HeaderPolicy::Emit => {
                let Some(raw) = read_raw_line(&mut reader, &mut buf).map_err(io_err)? else {
                    debug!("{} is empty", path.display());
                    return Ok(ScanEnd::Exhausted);
                };
                let header = String::from_utf8_lossy(raw).into_owned();
                let columns = self.columns_for(&header)?;
                if self.options.header == HeaderPolicy::Emit {
                    sink.header(header);
                }
                columns
            }
        };
        for column in self.filter.missing_columns(&columns, self.options.time_column()) {
            warn!("{} has no {column} column; filter not applied", path.display());
            self.warnings.push(Warning::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            });
        }

        let unfiltered = self.filter.is_unconstrained();
        let mut malformed = 0usize;
        let mut line_no = 0usize;
        let mut end = ScanEnd::Exhausted;
        while let Some(raw) = read_raw_line(&mut reader, &mut buf).map_err(io_err)? {
            if line_no < start_line {
                line_no += 1;
                continue;
            }
            if sink.is_full() {
                end = ScanEnd::Stopped {
                    next_offset: line_no,
                };
                break;
            }
            line_no += 1;
            let line = match std::str::from_utf8(raw) {
                Ok(line) => line,
                Err(err) => {
                    debug!("{} line {line_no}: {err}", path.display());
                    malformed += 1;
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            if unfiltered {
                sink.push(line.to_string());
                continue;
            }
            let matched = Fields::split(line, self.options.dialect)
                .and_then(|fields| self.filter.matches_fields(&fields, &columns));
            match matched {
                Ok(true) => sink.push(line.to_string()),
                Ok(false) => {}
                Err(err) => {
                    debug!("{} line {line_no}: {err}", path.display());
                    malformed += 1;
                }
            }
        }

        if malformed > 0 {
            warn!("skipped {malformed} malformed rows in {}", path.display());
            self.warnings.push(Warning::MalformedRows {
                path: path.to_path_buf(),
                count: malformed,
            });
        }
        Ok(end)
    }

    fn columns_for(&mut self, header: &str) -> Result<Columns> {
        if let Some(columns) = self.options.columns {
            return Ok(columns);
        }
        if let Some((cached_header, columns)) = &self.cached {
            if cached_header == header {
                return Ok(*columns);
            }
        }
        let columns = Columns::resolve(header, self.options.dialect, self.options.kind)?;
        self.cached = Some((header.to_string(), columns));
        Ok(columns)
    }
}

/// Next line without its `\n` or `\r\n` terminator, undecoded.
fn read_raw_line<'b>(
    reader: &mut impl BufRead,
    buf: &'b mut Vec<u8>,
) -> io::Result<Option<&'b [u8]>> {
    buf.clear();
    if reader.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    let mut line = buf.as_slice();
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    Ok(Some(line))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::TimeRange;
    use tempfile::TempDir;
    use time::macros::datetime;

    struct Collect {
        limit: usize,
        headers: Vec<String>,
        lines: Vec<String>,
    }

    impl LineSink for Collect {
        fn is_full(&self) -> bool {
            self.lines.len() >= self.limit
        }

        fn header(&mut self, line: String) {
            self.headers.push(line);
        }

        fn push(&mut self, line: String) {
            self.lines.push(line);
        }
    }

    fn collect(limit: usize) -> Collect {
        Collect {
            limit,
            headers: Vec::new(),
            lines: Vec::new(),
        }
    }

    fn bar_options() -> ReadOptions {
        ReadOptions::new(Dialect::Plain, HeaderPolicy::Skip, RecordKind::Bar)
    }

    #[test]
    fn stops_before_the_first_unconsumed_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.csv");
        std::fs::write(&path, "h\nl0\nl1\nl2\nl3\n").unwrap();

        let filter = RecordFilter::default();
        let mut scanner = FileScanner::new(bar_options(), &filter);
        let mut sink = collect(2);
        let end = scanner.scan(&path, 1, &mut sink).unwrap();
        assert_eq!(sink.lines, vec!["l1", "l2"]);
        assert_eq!(end, ScanEnd::Stopped { next_offset: 3 });

        let mut sink = collect(2);
        let end = scanner.scan(&path, 3, &mut sink).unwrap();
        assert_eq!(sink.lines, vec!["l3"]);
        assert_eq!(end, ScanEnd::Exhausted);
    }

    #[test]
    fn full_at_end_of_file_is_exhausted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.csv");
        std::fs::write(&path, "h\nl0\nl1\n").unwrap();
        let filter = RecordFilter::default();
        let mut scanner = FileScanner::new(bar_options(), &filter);
        let mut sink = collect(2);
        assert_eq!(scanner.scan(&path, 0, &mut sink).unwrap(), ScanEnd::Exhausted);
    }

    #[test]
    fn emits_header_and_counts_malformed_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        std::fs::write(
            &path,
            "id,price,created_at\n\
             1,10.0,2025-04-28 09:15:00+0800\n\
             2,10.1,garbage\n\
             3,\"10,2\",2025-04-28 09:16:00+0800\n\
             \n\
             4,10.3,2025-04-28 09:14:00+0800\n",
        )
        .unwrap();

        let filter = RecordFilter::new(
            None,
            Some(TimeRange::new(Some(datetime!(2025-04-28 09:15:00)), None)),
        );
        let options = ReadOptions::new(Dialect::Quoted, HeaderPolicy::Emit, RecordKind::Tick);
        let mut scanner = FileScanner::new(options, &filter);
        let mut sink = collect(10);
        scanner.scan(&path, 0, &mut sink).unwrap();

        assert_eq!(sink.headers, vec!["id,price,created_at"]);
        assert_eq!(sink.lines.len(), 2);
        assert!(sink.lines[1].starts_with("3,"));
        assert_eq!(
            scanner.into_warnings(),
            vec![Warning::MalformedRows {
                path: path.clone(),
                count: 1
            }]
        );
    }

    #[test]
    fn headerless_files_use_fixed_columns() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("raw.csv");
        std::fs::write(&path, "A,x\nB,y\nA,z\n").unwrap();
        let filter = RecordFilter::new(Some("A".into()), None);
        let options = ReadOptions::new(Dialect::Plain, HeaderPolicy::Absent, RecordKind::Bar)
            .with_columns(Columns {
                symbol: Some(0),
                start: None,
                end: None,
            });
        let mut scanner = FileScanner::new(options, &filter);
        let mut sink = collect(10);
        scanner.scan(&path, 0, &mut sink).unwrap();
        assert_eq!(sink.lines, vec!["A,x", "A,z"]);
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.csv");
        std::fs::write(&path, "code,close\nA,1\n").unwrap();
        let filter = RecordFilter::new(Some("B".into()), None);
        let mut scanner = FileScanner::new(bar_options(), &filter);
        let mut sink = collect(10);
        scanner.scan(&path, 0, &mut sink).unwrap();
        assert_eq!(sink.lines, vec!["A,1"]);
        assert!(matches!(
            scanner.into_warnings().as_slice(),
            [Warning::MissingColumn { column, .. }] if column == "symbol"
        ));
    }

    #[test]
    fn non_utf8_row_is_malformed_and_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gbk.csv");
        std::fs::write(&path, b"h\r\nA,1\r\nA,2\r\nA,\xd6\xd0\xce\xc4\r\nA,4\r\n").unwrap();
        let filter = RecordFilter::default();
        let mut scanner = FileScanner::new(bar_options(), &filter);

        let mut sink = collect(2);
        let end = scanner.scan(&path, 0, &mut sink).unwrap();
        assert_eq!(sink.lines, vec!["A,1", "A,2"]);
        assert_eq!(end, ScanEnd::Stopped { next_offset: 2 });

        let mut sink = collect(2);
        let end = scanner.scan(&path, 2, &mut sink).unwrap();
        assert_eq!(sink.lines, vec!["A,4"]);
        assert_eq!(end, ScanEnd::Exhausted);
        assert_eq!(
            scanner.into_warnings(),
            vec![Warning::MalformedRows { path, count: 1 }]
        );
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let filter = RecordFilter::default();
        let mut scanner = FileScanner::new(bar_options(), &filter);
        let mut sink = collect(1);
        let err = scanner
            .scan(&dir.path().join("missing.csv"), 0, &mut sink)
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
