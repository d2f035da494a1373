//! Shared utilities for fitpanel crates.
//!
//! Polars `AnyValue` conversions plus small helpers for pulling typed vectors
//! out of frames and building columns back from them.

pub mod frame;

pub use frame::{
    any_to_string, bool_column, column_bools, column_f64s, column_strings, f64_column,
    format_numeric, has_column, int_column, optional_f64s, parse_f64, row_key, string_column,
};
