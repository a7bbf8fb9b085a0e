//! Line counting and size-based record estimates.
//!
//! Size estimates use a fixed average on-disk record size per granularity.
//! They are capacity hints for planning how many windows a query will take,
//! not record counts.

use std::fs;
use std::path::PathBuf;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::Warning;
use crate::granularity::Granularity;

/// Average bytes per record, by granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeHints {
    /// Shared by 1-minute and 15-minute bars.
    pub minute: u64,
    pub tick: u64,
}

impl Default for SizeHints {
    fn default() -> Self {
        Self {
            minute: 120,
            tick: 232,
        }
    }
}

impl SizeHints {
    /// `None` for daily bars, which are always counted exactly.
    pub fn for_granularity(&self, granularity: Granularity) -> Option<u64> {
        match granularity {
            Granularity::Day => None,
            Granularity::Minute | Granularity::Minute15 => Some(self.minute),
            Granularity::Tick => Some(self.tick),
        }
    }
}

/// Number of newline-delimited lines in `text`.
///
/// `text` is expected to already exclude the header. A trailing newline does
/// not start an extra line.
pub fn count_lines(text: &str) -> usize {
    text.lines().count()
}

/// Approximate record count for `total_bytes` of data.
pub fn estimate_record_count(total_bytes: u64, record_size_hint: u64) -> u64 {
    if record_size_hint == 0 {
        return 0;
    }
    total_bytes / record_size_hint
}

/// Aggregate on-disk size of a file set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SizeTotal {
    pub bytes: u64,
    pub warnings: Vec<Warning>,
}

/// Sums the sizes of `files`.
///
/// Entries that are not regular files are skipped. A file whose metadata
/// cannot be read contributes zero and is reported as a warning.
pub fn total_byte_size(files: &[PathBuf]) -> SizeTotal {
    let mut total = SizeTotal::default();
    for path in files {
        match fs::metadata(path) {
            Ok(meta) if meta.is_file() => total.bytes += meta.len(),
            Ok(_) => debug!("skipping non-regular entry {}", path.display()),
            Err(err) => {
                warn!("cannot stat {}: {err}", path.display());
                total.warnings.push(Warning::Unreadable {
                    path: path.clone(),
                    message: err.to_string(),
                });
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn counts_lines() {
        assert_eq!(count_lines(""), 0);
        assert_eq!(count_lines("a"), 1);
        assert_eq!(count_lines("a\nb"), 2);
        assert_eq!(count_lines("a\nb\n"), 2);
        assert_eq!(count_lines("a\r\nb\r\n"), 2);
    }

    #[test]
    fn estimates_from_hints() {
        let hints = SizeHints::default();
        assert_eq!(hints.for_granularity(Granularity::Day), None);
        assert_eq!(hints.for_granularity(Granularity::Minute15), Some(120));
        assert_eq!(hints.for_granularity(Granularity::Tick), Some(232));
        assert_eq!(estimate_record_count(1200, 120), 10);
        assert_eq!(estimate_record_count(1199, 120), 9);
        assert_eq!(estimate_record_count(1000, 0), 0);
    }

    #[test]
    fn total_size_tolerates_missing_and_directories() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        std::fs::write(&a, vec![b'x'; 100]).unwrap();
        std::fs::write(&b, vec![b'y'; 20]).unwrap();
        let files = vec![
            a,
            dir.path().to_path_buf(),
            dir.path().join("gone.csv"),
            b,
        ];
        let total = total_byte_size(&files);
        assert_eq!(total.bytes, 120);
        assert_eq!(total.warnings.len(), 1);
        assert!(matches!(total.warnings[0], Warning::Unreadable { .. }));
    }
}
