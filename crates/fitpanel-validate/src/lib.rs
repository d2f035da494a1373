//! Row-level validation for loaded tables.
//!
//! The [`Validator`] applies a table's bound rules, then exact-duplicate
//! removal, then key-duplicate removal, recording every dropped row in the
//! table's [`TableReport`](fitpanel_model::TableReport).

pub mod dedupe;
pub mod quality;
pub mod rules;
pub mod validator;

pub use dedupe::{exact_duplicate_mask, key_duplicate_mask};
pub use quality::sleep_efficiency_outliers;
pub use rules::{BoundRule, rules_for};
pub use validator::Validator;
