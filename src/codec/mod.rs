//! Line codec: field splitting, header resolution and typed bar decoding.

mod bar;
mod fields;
mod header;
mod timestamp;

pub use bar::{Bar, BAR_FIELD_COUNT};
pub use fields::{parse_field, Dialect, Fields};
pub use header::{
    read_header, resolve_column, Columns, BAR_END_COLUMN, BAR_START_COLUMN, SYMBOL_COLUMN,
    TICK_TIME_COLUMN,
};
pub use timestamp::{parse_bound, parse_timestamp};
