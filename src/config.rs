//! Engine configuration.
//!
//! Stored as JSON; every field has a default so a partial file is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::Dialect;
use crate::day::DAY_RANGE_CAP;
use crate::error::{Error, Result};
use crate::estimate::SizeHints;
use crate::granularity::Granularity;

/// Maximum records per window, by granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetCaps {
    pub day: usize,
    /// Shared by 1-minute and 15-minute bars.
    pub minute: usize,
    pub tick: usize,
}

impl Default for BudgetCaps {
    fn default() -> Self {
        Self {
            day: 3000,
            minute: 3000,
            tick: 180,
        }
    }
}

impl BudgetCaps {
    pub fn for_granularity(&self, granularity: Granularity) -> usize {
        match granularity {
            Granularity::Day => self.day,
            Granularity::Minute | Granularity::Minute15 => self.minute,
            Granularity::Tick => self.tick,
        }
    }

    /// Requested budget clamped to the cap; zero asks for the full cap.
    pub fn clamp(&self, granularity: Granularity, requested: usize) -> usize {
        let cap = self.for_granularity(granularity);
        if requested == 0 {
            cap
        } else {
            requested.min(cap)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Dataset root: `{root}/{asset_class}/{granularity}/...`.
    pub root: PathBuf,
    pub caps: BudgetCaps,
    /// Maximum lines per day-range page.
    pub day_range_cap: usize,
    pub size_hints: SizeHints,
    pub bar_dialect: Dialect,
    pub tick_dialect: Dialect,
    /// Asset classes created by bootstrap.
    pub asset_classes: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            caps: BudgetCaps::default(),
            day_range_cap: DAY_RANGE_CAP,
            size_hints: SizeHints::default(),
            bar_dialect: Dialect::Plain,
            tick_dialect: Dialect::Quoted,
            asset_classes: [
                "A-shares", "Futures", "Funds", "Indices", "US-Stocks", "Options", "Crypto",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

impl EngineConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        serde_json::from_slice(&data).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn dialect(&self, granularity: Granularity) -> Dialect {
        match granularity {
            Granularity::Tick => self.tick_dialect,
            _ => self.bar_dialect,
        }
    }
}
