//! The result tables, one analysis per module.

pub mod correlation;
pub mod coverage;
pub mod engagement;
pub mod features;
pub mod insights;
pub mod segments;
pub mod sleep;
pub mod temporal;

pub use correlation::{
    CorrelationMatrixAnalysis, KEY_PAIRINGS, KeyCorrelation, KeyCorrelationsAnalysis, Pairing,
    correlation_matrix, paired_samples,
};
pub use coverage::CoverageAnalysis;
pub use engagement::EngagementAnalysis;
pub use features::FeatureUtilizationAnalysis;
pub use insights::{Insight, InsightsAnalysis};
pub use segments::{SegmentationAnalysis, UserSegment};
pub use sleep::{SleepAnalysis, UserSleep};
pub use temporal::{
    DayOfWeekAnalysis, HourlySummaryAnalysis, WeekSummary, WeeklyTrendAnalysis, weekly_summaries,
};
