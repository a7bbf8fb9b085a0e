//! Symbol and time-range predicate applied to raw or decoded records.

use log::warn;
use time::PrimitiveDateTime;

use crate::codec::{parse_bound, parse_timestamp, Bar, Columns, Fields};
use crate::codec::SYMBOL_COLUMN;
use crate::error::{Error, Result, Warning};

/// Inclusive time bounds. An absent bound does not constrain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeRange {
    pub start: Option<PrimitiveDateTime>,
    pub end: Option<PrimitiveDateTime>,
}

impl TimeRange {
    pub fn new(start: Option<PrimitiveDateTime>, end: Option<PrimitiveDateTime>) -> Self {
        Self { start, end }
    }

    /// Parses textual bounds; empty strings count as absent.
    ///
    /// If any supplied bound fails to parse the whole range is dropped and
    /// an [`Warning::InvalidFilter`] is returned instead, so the read
    /// behaves as if no time filter had been given.
    pub fn parse(start: Option<&str>, end: Option<&str>) -> (Option<TimeRange>, Option<Warning>) {
        let start = start.map(str::trim).filter(|s| !s.is_empty());
        let end = end.map(str::trim).filter(|s| !s.is_empty());
        if start.is_none() && end.is_none() {
            return (None, None);
        }

        let parsed = (
            start.map(|s| parse_bound(s, false).map_err(|e| (s, e))).transpose(),
            end.map(|s| parse_bound(s, true).map_err(|e| (s, e))).transpose(),
        );
        match parsed {
            (Ok(start), Ok(end)) => (Some(TimeRange { start, end }), None),
            (Err((input, reason)), _) | (_, Err((input, reason))) => {
                warn!(
                    "time filter {input:?} unparsable ({reason}); reading without time constraint"
                );
                (
                    None,
                    Some(Warning::InvalidFilter {
                        input: input.to_string(),
                        reason,
                    }),
                )
            }
        }
    }

    pub fn contains(&self, ts: PrimitiveDateTime) -> bool {
        self.start.map_or(true, |s| ts >= s) && self.end.map_or(true, |e| ts <= e)
    }

    /// True when `[rec_start, rec_end]` touches the range.
    pub fn overlaps(&self, rec_start: PrimitiveDateTime, rec_end: PrimitiveDateTime) -> bool {
        self.end.map_or(true, |e| rec_start <= e) && self.start.map_or(true, |s| rec_end >= s)
    }
}

/// Combined symbol and time predicate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    symbol: Option<String>,
    range: Option<TimeRange>,
}

impl RecordFilter {
    pub fn new(symbol: Option<String>, range: Option<TimeRange>) -> Self {
        Self {
            symbol: symbol.filter(|s| !s.is_empty()),
            range,
        }
    }

    /// Builds a filter from caller arguments, collecting degradation warnings.
    pub fn from_args(
        symbol: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> (Self, Vec<Warning>) {
        let (range, warning) = TimeRange::parse(start, end);
        (
            RecordFilter::new(symbol.map(str::to_string), range),
            warning.into_iter().collect(),
        )
    }

    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    pub fn range(&self) -> Option<&TimeRange> {
        self.range.as_ref()
    }

    pub fn without_symbol(mut self) -> Self {
        self.symbol = None;
        self
    }

    pub fn is_unconstrained(&self) -> bool {
        self.symbol.is_none() && self.range.is_none()
    }

    /// Names of the columns this filter needs but `columns` lacks.
    pub fn missing_columns(
        &self,
        columns: &Columns,
        time_column: &'static str,
    ) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.symbol.is_some() && columns.symbol.is_none() {
            missing.push(SYMBOL_COLUMN);
        }
        if self.range.is_some() && columns.start.is_none() {
            missing.push(time_column);
        }
        missing
    }

    /// Evaluates the filter on split fields.
    ///
    /// A dimension whose column is absent is not applied. Errors when a
    /// needed field is missing or its timestamp does not parse.
    pub fn matches_fields(&self, fields: &Fields<'_>, columns: &Columns) -> Result<bool> {
        if let (Some(symbol), Some(idx)) = (self.symbol.as_deref(), columns.symbol) {
            let value = field(fields, idx, SYMBOL_COLUMN)?;
            if value != symbol {
                return Ok(false);
            }
        }

        let (Some(range), Some(start_idx)) = (self.range.as_ref(), columns.start) else {
            return Ok(true);
        };
        let rec_start = time_field(fields, start_idx)?;
        match columns.end {
            Some(end_idx) => {
                let rec_end = time_field(fields, end_idx)?;
                Ok(range.overlaps(rec_start, rec_end))
            }
            None => Ok(range.contains(rec_start)),
        }
    }

    pub fn matches_bar(&self, bar: &Bar) -> bool {
        if let Some(symbol) = self.symbol.as_deref() {
            if bar.symbol != symbol {
                return false;
            }
        }
        self.range
            .map_or(true, |r| r.overlaps(bar.period_start, bar.period_end))
    }
}

fn field<'f>(fields: &'f Fields<'_>, idx: usize, name: &str) -> Result<&'f str> {
    fields
        .get(idx)
        .ok_or_else(|| Error::malformed(format!("missing field {name} at column {idx}")))
}

fn time_field(fields: &Fields<'_>, idx: usize) -> Result<PrimitiveDateTime> {
    let value = field(fields, idx, "timestamp")?;
    parse_timestamp(value).ok_or_else(|| Error::malformed(format!("invalid timestamp: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Dialect;
    use time::macros::datetime;

    fn bar_line(symbol: &str, bob: &str, eob: &str) -> String {
        format!("{symbol},1,1,1,1,1,1,{bob},{eob},1")
    }

    #[test]
    fn absent_filter_matches_everything() {
        let filter = RecordFilter::default();
        assert!(filter.is_unconstrained());
        let line = "garbage";
        let fields = Fields::split(line, Dialect::Plain).unwrap();
        assert!(filter.matches_fields(&fields, &Columns::CANONICAL_BAR).unwrap());
    }

    #[test]
    fn symbol_match_is_exact() {
        let filter = RecordFilter::new(Some("SHSE.600000".into()), None);
        let hit = bar_line("SHSE.600000", "2024-01-02 09:30:00", "2024-01-02 09:31:00");
        let miss = bar_line("SHSE.6000001", "2024-01-02 09:30:00", "2024-01-02 09:31:00");
        let cols = Columns::CANONICAL_BAR;
        assert!(filter
            .matches_fields(&Fields::split(&hit, Dialect::Plain).unwrap(), &cols)
            .unwrap());
        assert!(!filter
            .matches_fields(&Fields::split(&miss, Dialect::Plain).unwrap(), &cols)
            .unwrap());
    }

    #[test]
    fn bars_match_on_overlap() {
        let range = TimeRange::new(
            Some(datetime!(2024-01-02 09:31:00)),
            Some(datetime!(2024-01-02 09:32:00)),
        );
        let filter = RecordFilter::new(None, Some(range));
        let cols = Columns::CANONICAL_BAR;
        let check = |bob: &str, eob: &str| {
            let line = bar_line("A", bob, eob);
            filter
                .matches_fields(&Fields::split(&line, Dialect::Plain).unwrap(), &cols)
                .unwrap()
        };
        assert!(check("2024-01-02 09:30:00", "2024-01-02 09:31:00"));
        assert!(check("2024-01-02 09:32:00", "2024-01-02 09:33:00"));
        assert!(!check("2024-01-02 09:29:00", "2024-01-02 09:30:59"));
        assert!(!check("2024-01-02 09:32:01", "2024-01-02 09:33:00"));
    }

    #[test]
    fn ticks_match_inclusive_single_timestamp() {
        let (range, warning) = TimeRange::parse(Some("2025-04-28 09:15:00"), None);
        assert!(warning.is_none());
        let filter = RecordFilter::new(None, range);
        let cols = Columns {
            symbol: None,
            start: Some(1),
            end: None,
        };
        let at = Fields::split("1,\"2025-04-28 09:15:00+0800\"", Dialect::Quoted).unwrap();
        let before = Fields::split("1,2025-04-28 09:14:59", Dialect::Quoted).unwrap();
        assert!(filter.matches_fields(&at, &cols).unwrap());
        assert!(!filter.matches_fields(&before, &cols).unwrap());
    }

    #[test]
    fn unparsable_bound_degrades_to_no_constraint() {
        let (range, warning) = TimeRange::parse(Some("2024-01-01 00:00:00"), Some("soon"));
        assert!(range.is_none());
        match warning {
            Some(Warning::InvalidFilter { input, .. }) => assert_eq!(input, "soon"),
            other => panic!("expected InvalidFilter, got {other:?}"),
        }

        let (filter, warnings) = RecordFilter::from_args(None, Some("bad"), None);
        assert!(filter.is_unconstrained());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn empty_strings_are_absent() {
        let (filter, warnings) = RecordFilter::from_args(Some(""), Some(""), Some(" "));
        assert!(filter.is_unconstrained());
        assert!(warnings.is_empty());
    }

    #[test]
    fn missing_column_disables_dimension() {
        let filter = RecordFilter::new(
            Some("A".into()),
            Some(TimeRange::new(Some(datetime!(2030-01-01 00:00:00)), None)),
        );
        let cols = Columns::default();
        assert_eq!(filter.missing_columns(&cols, "bob"), vec!["symbol", "bob"]);
        let fields = Fields::split("B,whatever", Dialect::Plain).unwrap();
        assert!(filter.matches_fields(&fields, &cols).unwrap());
    }

    #[test]
    fn unparsable_record_time_is_an_error() {
        let filter = RecordFilter::new(
            None,
            Some(TimeRange::new(Some(datetime!(2024-01-01 00:00:00)), None)),
        );
        let line = bar_line("A", "not-a-time", "2024-01-02 09:31:00");
        let fields = Fields::split(&line, Dialect::Plain).unwrap();
        let err = filter
            .matches_fields(&fields, &Columns::CANONICAL_BAR)
            .unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn matches_decoded_bars() {
        let bar = Bar::parse_line(&bar_line("A", "2024-01-02 09:30:00", "2024-01-02 09:31:00"))
            .unwrap();
        let filter = RecordFilter::new(
            Some("A".into()),
            Some(TimeRange::new(None, Some(datetime!(2024-01-02 09:30:00)))),
        );
        assert!(filter.matches_bar(&bar));
        assert!(!filter.clone().without_symbol().matches_bar(&Bar {
            period_start: datetime!(2024-01-02 09:30:01),
            period_end: datetime!(2024-01-02 09:31:00),
            ..bar
        }));
    }
}
