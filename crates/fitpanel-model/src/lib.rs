pub mod config;
pub mod dataset;
pub mod error;
pub mod records;
pub mod report;

pub use config::{
    CorrelationConfig, DateTimeConfig, DateTimePattern, EngagementConfig, GoalConfig,
    PipelineConfig, SegmentationConfig, ValidationConfig,
};
pub use dataset::{
    ColumnKind, Dataset, DatasetFamily, DatasetRegistry, DatasetSpec, TimeKind, columns,
};
pub use error::{ConfigError, Result};
pub use records::{DailyActivityRecord, HeartRateSample, IntradayObservation, SleepRecord, UserId};
pub use report::{
    DropCategory, DropReason, FailedDataset, QualityNote, ResultSummary, RunReport, TableReport,
};
