//! Date/time normalization.
//!
//! Raw exports mix ISO, slash-separated and US month-first layouts, with and
//! without a 12-hour clock. [`DateTimeNormalizer`] tries an ordered list of
//! chrono patterns and returns the first successful parse. Order is the
//! tie-break for ambiguous inputs: `04/05/2016` is April 5th because the
//! month-first layout is the only slash layout with a trailing year.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use fitpanel_model::{DateTimeConfig, DateTimePattern};

use crate::error::DateTimeParseError;

const CANONICAL_DATE: &str = "%Y-%m-%d";
const CANONICAL_INSTANT: &str = "%Y-%m-%d %H:%M:%S";

/// Parses free-text date/time strings into UTC-anchored instants.
#[derive(Debug, Clone)]
pub struct DateTimeNormalizer {
    patterns: Vec<DateTimePattern>,
}

impl DateTimeNormalizer {
    pub fn new(patterns: Vec<DateTimePattern>) -> Self {
        Self { patterns }
    }

    pub fn from_config(config: &DateTimeConfig) -> Self {
        Self::new(config.patterns.clone())
    }

    /// Parses `raw` with the first matching pattern.
    ///
    /// Whitespace runs (including embedded newlines) collapse to a single
    /// space before matching. Date-only layouts resolve to midnight.
    pub fn parse(&self, raw: &str) -> Result<DateTime<Utc>, DateTimeParseError> {
        let cleaned = collapse_whitespace(raw);
        if !cleaned.is_empty() {
            for pattern in &self.patterns {
                if let Some(parsed) = try_pattern(&cleaned, pattern) {
                    return Ok(parsed.and_utc());
                }
            }
        }
        Err(DateTimeParseError {
            value: raw.to_string(),
        })
    }

    /// Index of the pattern that accepts `raw`, if any.
    pub fn matching_pattern(&self, raw: &str) -> Option<usize> {
        let cleaned = collapse_whitespace(raw);
        self.patterns
            .iter()
            .position(|pattern| try_pattern(&cleaned, pattern).is_some())
    }
}

impl Default for DateTimeNormalizer {
    fn default() -> Self {
        Self::from_config(&DateTimeConfig::default())
    }
}

fn try_pattern(value: &str, pattern: &DateTimePattern) -> Option<NaiveDateTime> {
    if pattern.has_time {
        NaiveDateTime::parse_from_str(value, &pattern.format).ok()
    } else {
        NaiveDate::parse_from_str(value, &pattern.format)
            .ok()
            .map(|date| date.and_time(NaiveTime::MIN))
    }
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE).to_string()
}

pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.format(CANONICAL_INSTANT).to_string()
}

/// Parses a canonical `YYYY-MM-DD` value written by the cleaning stage.
pub fn parse_canonical_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), CANONICAL_DATE).ok()
}

/// Parses a canonical `YYYY-MM-DD HH:MM:SS` value written by the cleaning stage.
pub fn parse_canonical_instant(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), CANONICAL_INSTANT)
        .ok()
        .map(|instant| instant.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instant(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
            .and_utc()
    }

    #[test]
    fn parses_us_twelve_hour_clock() {
        let normalizer = DateTimeNormalizer::default();
        assert_eq!(
            normalizer.parse("4/12/2016 1:05:30 PM").unwrap(),
            instant(2016, 4, 12, 13, 5, 30)
        );
        assert_eq!(
            normalizer.parse("4/12/2016 12:00:00 AM").unwrap(),
            instant(2016, 4, 12, 0, 0, 0)
        );
    }

    #[test]
    fn parses_iso_and_date_only_layouts() {
        let normalizer = DateTimeNormalizer::default();
        assert_eq!(
            normalizer.parse("2016-04-12 08:30:00").unwrap(),
            instant(2016, 4, 12, 8, 30, 0)
        );
        assert_eq!(
            normalizer.parse("2016-04-12T08:30:00").unwrap(),
            instant(2016, 4, 12, 8, 30, 0)
        );
        assert_eq!(
            normalizer.parse("2016/04/12").unwrap(),
            instant(2016, 4, 12, 0, 0, 0)
        );
        assert_eq!(
            normalizer.parse("4/12/2016").unwrap(),
            instant(2016, 4, 12, 0, 0, 0)
        );
        assert_eq!(
            normalizer.parse("04-12-2016").unwrap(),
            instant(2016, 4, 12, 0, 0, 0)
        );
    }

    #[test]
    fn collapses_whitespace_and_newlines() {
        let normalizer = DateTimeNormalizer::default();
        assert_eq!(
            normalizer.parse("  4/12/2016\n   1:00:00  PM ").unwrap(),
            instant(2016, 4, 12, 13, 0, 0)
        );
    }

    #[test]
    fn first_matching_pattern_wins() {
        let normalizer = DateTimeNormalizer::default();
        assert_eq!(normalizer.matching_pattern("2016-04-12"), Some(3));
        assert_eq!(normalizer.matching_pattern("04/05/2016"), Some(9));

        let day_first = DateTimeNormalizer::new(vec![
            DateTimePattern::date_only("%d/%m/%Y"),
            DateTimePattern::date_only("%m/%d/%Y"),
        ]);
        assert_eq!(
            day_first.parse("04/05/2016").unwrap(),
            instant(2016, 5, 4, 0, 0, 0)
        );
    }

    #[test]
    fn rejects_garbage() {
        let normalizer = DateTimeNormalizer::default();
        assert!(normalizer.parse("").is_err());
        assert!(normalizer.parse("yesterday").is_err());
        assert!(normalizer.parse("13/45/2016").is_err());
        let err = normalizer.parse("not a date").unwrap_err();
        assert_eq!(err.value, "not a date");
    }

    #[test]
    fn canonical_round_trip() {
        let value = instant(2016, 5, 1, 23, 59, 59);
        assert_eq!(format_instant(value), "2016-05-01 23:59:59");
        assert_eq!(parse_canonical_instant("2016-05-01 23:59:59"), Some(value));
        let date = NaiveDate::from_ymd_opt(2016, 5, 1).unwrap();
        assert_eq!(format_date(date), "2016-05-01");
        assert_eq!(parse_canonical_date("2016-05-01"), Some(date));
        assert_eq!(parse_canonical_date("5/1/2016"), None);
    }
}
