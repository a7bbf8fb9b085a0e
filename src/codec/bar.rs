//! Typed OHLCV bar decoding.

use std::str::FromStr;

use time::PrimitiveDateTime;

use crate::codec::timestamp::parse_timestamp;
use crate::codec::{Dialect, Fields};
use crate::error::{Error, Result};

/// Minimum number of fields in a bar line; extra trailing fields are ignored.
pub const BAR_FIELD_COUNT: usize = 10;

/// One OHLCV bar covering `[period_start, period_end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub amount: f64,
    pub volume: f64,
    pub period_start: PrimitiveDateTime,
    pub period_end: PrimitiveDateTime,
    pub kind: i32,
}

impl Bar {
    /// Strict decode of one line in the canonical bar layout.
    ///
    /// Fields are split on commas and tabs without quoting.
    pub fn parse_line(line: &str) -> Result<Bar> {
        let fields = Fields::split(line, Dialect::Plain)?;
        if fields.len() < BAR_FIELD_COUNT {
            return Err(Error::malformed(format!(
                "expected at least {BAR_FIELD_COUNT} fields, got {}: {line}",
                fields.len()
            )));
        }
        let text = |idx: usize| fields.get(idx).unwrap_or_default();

        let period_start = timestamp(text(7), "bob")?;
        let period_end = timestamp(text(8), "eob")?;
        if period_start > period_end {
            return Err(Error::malformed(format!(
                "bob {period_start} is after eob {period_end}"
            )));
        }

        Ok(Bar {
            symbol: text(0).to_string(),
            open: float(text(1), "open")?,
            high: float(text(2), "high")?,
            low: float(text(3), "low")?,
            close: float(text(4), "close")?,
            amount: float(text(5), "amount")?,
            volume: float(text(6), "volume")?,
            period_start,
            period_end,
            kind: text(9)
                .trim()
                .parse::<i32>()
                .map_err(|_| Error::malformed(format!("invalid type: {}", text(9))))?,
        })
    }

    /// Decodes every non-blank line of `text`, failing on the first bad one.
    pub fn parse_lines(text: &str) -> Result<Vec<Bar>> {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(Bar::parse_line)
            .collect()
    }
}

impl FromStr for Bar {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        Bar::parse_line(line)
    }
}

fn float(value: &str, name: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::malformed(format!("invalid {name}: {value}")))
}

fn timestamp(value: &str, name: &str) -> Result<PrimitiveDateTime> {
    parse_timestamp(value).ok_or_else(|| Error::malformed(format!("invalid {name}: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn decodes_canonical_line() {
        let bar = Bar::parse_line(
            "SHSE.600000,10.1,10.5,9.9,10.2,1020000.5,100000,2024-01-02 09:30:00,2024-01-02 09:31:00,1",
        )
        .unwrap();
        assert_eq!(bar.symbol, "SHSE.600000");
        assert_eq!(bar.open, 10.1);
        assert_eq!(bar.volume, 100000.0);
        assert_eq!(bar.period_start, datetime!(2024-01-02 09:30:00));
        assert_eq!(bar.period_end, datetime!(2024-01-02 09:31:00));
        assert_eq!(bar.kind, 1);
    }

    #[test]
    fn accepts_tabs_slashed_dates_and_extra_fields() {
        let bar: Bar = "X:BTCUSD\t1\t2\t0.5\t1.5\t10\t20\t2023/05/01 00:00\t2023/05/01 00:01\t3\textra"
            .parse()
            .unwrap();
        assert_eq!(bar.symbol, "X:BTCUSD");
        assert_eq!(bar.period_end, datetime!(2023-05-01 00:01:00));
        assert_eq!(bar.kind, 3);
    }

    #[test]
    fn rejects_short_lines() {
        let err = Bar::parse_line("A,1,2,3").unwrap_err();
        assert!(matches!(err, Error::MalformedRecord { .. }));
    }

    #[test]
    fn rejects_bad_numbers_and_dates() {
        assert!(Bar::parse_line("A,x,1,1,1,1,1,2024-01-02 09:30:00,2024-01-02 09:31:00,1").is_err());
        assert!(Bar::parse_line("A,1,1,1,1,1,1,2024-01-02,2024-01-02 09:31:00,1").is_err());
        assert!(Bar::parse_line("A,1,1,1,1,1,1,2024-01-02 09:30:00,2024-01-02 09:31:00,1.5").is_err());
    }

    #[test]
    fn rejects_inverted_period() {
        let err =
            Bar::parse_line("A,1,1,1,1,1,1,2024-01-02 09:31:00,2024-01-02 09:30:00,1").unwrap_err();
        assert!(err.to_string().contains("after"));
    }

    #[test]
    fn parse_lines_skips_blank_lines() {
        let text = "A,1,1,1,1,1,1,2024-01-02 09:30:00,2024-01-02 09:31:00,1\n\n\
                    B,1,1,1,1,1,1,2024-01-02 09:31:00,2024-01-02 09:32:00,1\r\n";
        let bars = Bar::parse_lines(text).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[1].symbol, "B");
    }
}
