//! Aggregations over cleaned fitness tables.
//!
//! The [`Aggregator`] reads every table from a
//! [`CleanedStore`](fitpanel_store::CleanedStore), lifts daily activity and
//! sleep into typed records once, and runs each [`Analysis`] whose required
//! datasets are present. Analyses with missing inputs produce an empty table
//! with the right columns; only a missing `daily_activity` table is fatal.

pub mod aggregator;
pub mod analyses;
pub mod analysis;
pub mod classify;
pub mod error;
pub mod extract;
pub mod fields;
pub mod stats;

#[cfg(test)]
mod testing;

pub use aggregator::{AggregateOutput, Aggregator, ResultTable};
pub use analysis::{Analysis, AnalysisInputs};
pub use classify::{
    ActivityLevel, Bound, Classifier, CorrelationStrength, EngagementLevel, SleepPattern,
    StrengthClassifier,
};
pub use error::{AnalysisError, Result};
pub use fields::{ActivityField, SleepField};
