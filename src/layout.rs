//! Dataset directory layout and partition file discovery.
//!
//! ```text
//! {root}/
//! └── {asset_class}/            e.g. Funds, Crypto
//!     └── {granularity}/        1d, 1m, 15m, tick
//!         └── .../{yyyyMMdd}/   any nesting above the date directory
//!             └── {file}.csv    daily: any name; others: {symbol}.csv
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{Error, Result};
use crate::granularity::Granularity;

/// Rejects empty components, separators, `.`/`..` and NUL bytes.
pub fn validate_component(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::EmptyComponent { field });
    }
    if value == "."
        || value == ".."
        || value.contains('/')
        || value.contains('\\')
        || value.contains('\0')
    {
        return Err(Error::InvalidComponent {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn is_date_dir(name: &str) -> bool {
    name.len() == 8 && name.bytes().all(|b| b.is_ascii_digit())
}

fn date_bound(field: &'static str, value: Option<&str>) -> Result<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) if is_date_dir(v) => Ok(Some(v.to_string())),
        Some(v) => Err(Error::InvalidComponent {
            field,
            value: v.to_string(),
        }),
    }
}

/// Which partition files to locate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    pub asset_class: String,
    pub granularity: Granularity,
    /// Matched against the file stem; ignored for daily files.
    pub symbol: Option<String>,
    /// Inclusive `yyyyMMdd` bounds.
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl FileQuery {
    pub fn new(asset_class: impl Into<String>, granularity: Granularity) -> Self {
        Self {
            asset_class: asset_class.into(),
            granularity,
            symbol: None,
            start_date: None,
            end_date: None,
        }
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn dates(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.start_date = Some(start.into());
        self.end_date = Some(end.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path: `{root}/{asset_class}/{granularity}`
    pub fn granularity_dir(&self, asset_class: &str, granularity: Granularity) -> Result<PathBuf> {
        validate_component("asset_class", asset_class)?;
        Ok(self.root.join(asset_class).join(granularity.dir_name()))
    }

    /// Partition files matching `query`, sorted by date directory then path.
    pub fn discover(&self, query: &FileQuery) -> Result<Vec<PathBuf>> {
        let dir = self.granularity_dir(&query.asset_class, query.granularity)?;
        let start = date_bound("start_date", query.start_date.as_deref())?;
        let end = date_bound("end_date", query.end_date.as_deref())?;
        let symbol = match query.symbol.as_deref().filter(|s| !s.is_empty()) {
            Some(s) if !query.granularity.is_multi_symbol() => {
                validate_component("symbol", s)?;
                Some(s)
            }
            _ => None,
        };

        if !dir.is_dir() {
            debug!("{} does not exist", dir.display());
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        collect_csv_files(&dir, &mut found)?;

        let mut files: Vec<(String, PathBuf)> = found
            .into_iter()
            .filter_map(|path| {
                let date = path.parent()?.file_name()?.to_str()?.to_string();
                if !is_date_dir(&date) {
                    return None;
                }
                if start.as_deref().is_some_and(|s| date.as_str() < s)
                    || end.as_deref().is_some_and(|e| date.as_str() > e)
                {
                    return None;
                }
                if let Some(symbol) = symbol {
                    if path.file_stem()?.to_str()? != symbol {
                        return None;
                    }
                }
                Some((date, path))
            })
            .collect();
        files.sort();

        debug!(
            "discovered {} files under {} for {:?}",
            files.len(),
            dir.display(),
            query
        );
        Ok(files.into_iter().map(|(_, path)| path).collect())
    }

    /// Creates `{root}/{asset}/{granularity}` for every asset class and
    /// granularity. Returns the directories that were created.
    pub fn bootstrap(&self, asset_classes: &[String]) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for asset in asset_classes {
            for granularity in Granularity::ALL {
                let dir = self.granularity_dir(asset, granularity)?;
                if dir.is_dir() {
                    debug!("{} already exists", dir.display());
                    continue;
                }
                fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
                info!("created {}", dir.display());
                created.push(dir);
            }
        }
        Ok(created)
    }
}

fn collect_csv_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                warn!("skipping entry in {}: {err}", dir.display());
                continue;
            }
        };
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        if file_type.is_dir() {
            collect_csv_files(&path, out)?;
        } else if file_type.is_file()
            && path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        {
            out.push(path);
        }
    }
    Ok(())
}
