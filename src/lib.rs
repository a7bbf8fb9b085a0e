//! Windowed, resumable reads over date-partitioned CSV market data.
//!
//! Datasets are many small files laid out as
//! `{root}/{asset_class}/{granularity}/.../{yyyyMMdd}/{file}.csv`. Callers
//! locate files with [`DatasetLayout`], then page through them with
//! [`Engine::get_window`], handing the returned [`Cursor`] back on each call
//! until it is exhausted.

pub mod codec;
pub mod config;
pub mod cursor;
pub mod day;
pub mod engine;
pub mod error;
pub mod estimate;
pub mod filter;
pub mod granularity;
pub mod layout;
pub mod scan;
pub mod window;

pub use codec::{Bar, Columns, Dialect};
pub use config::{BudgetCaps, EngineConfig};
pub use cursor::Cursor;
pub use day::{collect_day_text, get_day_range, DayText, DAY_RANGE_CAP};
pub use engine::{CountEstimate, Engine, WindowRequest};
pub use error::{Error, Result, Warning};
pub use estimate::{count_lines, estimate_record_count, total_byte_size, SizeHints};
pub use filter::{RecordFilter, TimeRange};
pub use granularity::{Granularity, RecordKind};
pub use layout::{DatasetLayout, FileQuery};
pub use scan::{HeaderPolicy, ReadOptions};
pub use window::{Window, WindowReader};
