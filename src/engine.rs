//! Configured entry point tying discovery, windowed reads and counting
//! together.
//!
//! The engine holds only configuration. Every read is a fresh, blocking
//! scan; pagination state lives in the [`Cursor`] the caller keeps.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::Serialize;

use crate::config::EngineConfig;
use crate::cursor::Cursor;
use crate::day::{self, DayText};
use crate::error::{Result, Warning};
use crate::estimate::{estimate_record_count, total_byte_size};
use crate::filter::RecordFilter;
use crate::granularity::{Granularity, RecordKind};
use crate::layout::{DatasetLayout, FileQuery};
use crate::scan::ReadOptions;
use crate::window::{Window, WindowReader};

/// Arguments of one windowed read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowRequest {
    pub granularity: Granularity,
    /// Candidate files in date order. Ignored when `cursor` is set.
    pub files: Vec<PathBuf>,
    /// Requested record count; zero or anything above the cap means the cap.
    pub budget: usize,
    pub symbol: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub cursor: Option<Cursor>,
}

impl WindowRequest {
    pub fn new(granularity: Granularity, files: Vec<PathBuf>) -> Self {
        Self {
            granularity,
            files,
            budget: 0,
            symbol: None,
            start: None,
            end: None,
            cursor: None,
        }
    }

    pub fn budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn range(mut self, start: Option<&str>, end: Option<&str>) -> Self {
        self.start = start.map(str::to_string);
        self.end = end.map(str::to_string);
        self
    }

    pub fn resume(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }
}

/// Record count for a file set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountEstimate {
    pub count: u64,
    /// False when `count` is derived from file sizes and is only a
    /// capacity hint.
    pub exact: bool,
    pub warnings: Vec<Warning>,
}

pub struct Engine {
    config: EngineConfig,
    layout: DatasetLayout,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let layout = DatasetLayout::new(config.root.clone());
        Self { config, layout }
    }

    /// Loads the configuration file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self::new(EngineConfig::load(path)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Creates the directory skeleton for every configured asset class.
    pub fn bootstrap(&self) -> Result<Vec<PathBuf>> {
        self.layout.bootstrap(&self.config.asset_classes)
    }

    pub fn discover(&self, query: &FileQuery) -> Result<Vec<PathBuf>> {
        self.layout.discover(query)
    }

    /// Dialect, header policy and record kind for `granularity`.
    pub fn read_options(&self, granularity: Granularity) -> ReadOptions {
        ReadOptions::new(
            self.config.dialect(granularity),
            granularity.header_policy(),
            granularity.kind(),
        )
    }

    /// Reads the next window of `request`.
    ///
    /// The budget is clamped to the granularity cap. Tick files are one per
    /// symbol, so a symbol filter on a tick read is dropped with an
    /// [`Warning::IgnoredFilter`]. Unparsable time bounds degrade to no time
    /// filter with an [`Warning::InvalidFilter`].
    pub fn get_window(&self, request: &WindowRequest) -> Result<Window> {
        let granularity = request.granularity;
        let budget = self.config.caps.clamp(granularity, request.budget);
        let (mut filter, mut warnings) = RecordFilter::from_args(
            request.symbol.as_deref(),
            request.start.as_deref(),
            request.end.as_deref(),
        );
        if granularity.kind() == RecordKind::Tick {
            if let Some(symbol) = filter.symbol().map(str::to_string) {
                warnings.push(Warning::IgnoredFilter {
                    filter: format!("symbol={symbol}"),
                    reason: "tick files hold a single symbol".to_string(),
                });
                filter = filter.without_symbol();
            }
        }

        debug!(
            "window {granularity} budget={budget} (requested {}) resume={}",
            request.budget,
            request.cursor.is_some()
        );
        let reader = WindowReader::new(self.read_options(granularity));
        let mut window = reader.read(&request.files, request.cursor.as_ref(), budget, &filter)?;
        warnings.append(&mut window.warnings);
        window.warnings = warnings;
        Ok(window)
    }

    /// Every daily bar line in `files` matching the arguments.
    pub fn collect_day_text(
        &self,
        files: &[PathBuf],
        symbol: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> DayText {
        let (filter, mut warnings) = RecordFilter::from_args(symbol, start, end);
        let mut text = day::collect_day_text(files, self.read_options(Granularity::Day), &filter);
        warnings.append(&mut text.warnings);
        text.warnings = warnings;
        text
    }

    /// Index page of a collected day text, capped by the configured
    /// `day_range_cap`.
    pub fn get_day_range(&self, text: &str, offset: usize, limit: usize) -> String {
        day::get_day_range_capped(text, offset, limit, self.config.day_range_cap)
    }

    /// Counts records in `files`.
    ///
    /// Daily bars are counted exactly, honouring `symbol`. Other
    /// granularities are estimated from total file size and the configured
    /// size hint; the symbol is implied by the file names there.
    pub fn estimate_count(
        &self,
        files: &[PathBuf],
        granularity: Granularity,
        symbol: Option<&str>,
    ) -> CountEstimate {
        let Some(hint) = self.config.size_hints.for_granularity(granularity) else {
            let filter = RecordFilter::new(symbol.map(str::to_string), None);
            let (count, warnings) =
                day::count_matching(files, self.read_options(granularity), &filter);
            return CountEstimate {
                count,
                exact: true,
                warnings,
            };
        };

        let total = total_byte_size(files);
        if hint == 0 {
            warn!("size hint for {granularity} is zero; estimate is 0");
        }
        CountEstimate {
            count: estimate_record_count(total.bytes, hint),
            exact: false,
            warnings: total.warnings,
        }
    }
}
