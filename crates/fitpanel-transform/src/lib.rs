//! Value-level transformations shared by the loader and the validator.
//!
//! - [`datetime`]: ordered-pattern datetime normalization.
//! - [`value`]: numeric and boolean cell coercion.
//! - [`derive`]: derived columns added to cleaned tables.

pub mod datetime;
pub mod derive;
pub mod error;
pub mod value;

pub use datetime::{
    DateTimeNormalizer, format_date, format_instant, parse_canonical_date,
    parse_canonical_instant,
};
pub use derive::{
    ActivityTotals, SleepMetrics, activity_totals, derive_metrics, minutes_sum, round_distance,
    sleep_metrics,
};
pub use error::DateTimeParseError;
pub use value::{parse_flag, parse_numeric};
