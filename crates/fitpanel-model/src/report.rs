//! Per-table drop accounting and the run report.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

/// Error taxonomy bucket a drop belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropCategory {
    ParseFailure,
    ValidationViolation,
    Duplicate,
}

/// Why a row was removed from a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    InvalidEncoding,
    UnparseableTimestamp,
    MissingId,
    NonNumericValue,
    InvalidBoolean,
    TotalMinutesExceeded,
    NonPositiveSleep,
    HeartRateOutOfRange,
    NonPositiveWeight,
    ExactDuplicate,
    DuplicateKey,
}

impl DropReason {
    pub fn category(self) -> DropCategory {
        match self {
            DropReason::InvalidEncoding
            | DropReason::UnparseableTimestamp
            | DropReason::MissingId
            | DropReason::NonNumericValue
            | DropReason::InvalidBoolean => DropCategory::ParseFailure,
            DropReason::TotalMinutesExceeded
            | DropReason::NonPositiveSleep
            | DropReason::HeartRateOutOfRange
            | DropReason::NonPositiveWeight => DropCategory::ValidationViolation,
            DropReason::ExactDuplicate | DropReason::DuplicateKey => DropCategory::Duplicate,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DropReason::InvalidEncoding => "invalid UTF-8",
            DropReason::UnparseableTimestamp => "unparseable timestamp",
            DropReason::MissingId => "missing id",
            DropReason::NonNumericValue => "non-numeric value",
            DropReason::InvalidBoolean => "invalid boolean",
            DropReason::TotalMinutesExceeded => "total minutes above daily maximum",
            DropReason::NonPositiveSleep => "non-positive sleep minutes",
            DropReason::HeartRateOutOfRange => "heart rate out of range",
            DropReason::NonPositiveWeight => "non-positive weight",
            DropReason::ExactDuplicate => "exact duplicate",
            DropReason::DuplicateKey => "duplicate key",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row accounting for one cleaned table.
///
/// `input_rows == total_dropped() + output_rows` once cleaning finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableReport {
    pub dataset: Dataset,
    pub source: Option<PathBuf>,
    pub input_rows: usize,
    pub dropped: BTreeMap<DropReason, usize>,
    pub output_rows: usize,
}

impl TableReport {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            source: None,
            input_rows: 0,
            dropped: BTreeMap::new(),
            output_rows: 0,
        }
    }

    /// Adds `count` drops under `reason`. Zero counts are not recorded.
    pub fn record_drops(&mut self, reason: DropReason, count: usize) {
        if count > 0 {
            *self.dropped.entry(reason).or_insert(0) += count;
        }
    }

    pub fn total_dropped(&self) -> usize {
        self.dropped.values().sum()
    }

    pub fn dropped_in(&self, category: DropCategory) -> usize {
        self.dropped
            .iter()
            .filter(|(reason, _)| reason.category() == category)
            .map(|(_, count)| count)
            .sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.input_rows == self.total_dropped() + self.output_rows
    }
}

/// A kept-but-suspicious observation surfaced in the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityNote {
    pub dataset: Dataset,
    pub message: String,
    pub count: usize,
}

/// Row count of one written result table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub name: String,
    pub rows: usize,
    /// True when a required dataset was absent and the table is empty.
    pub skipped: bool,
}

/// Everything a run did, written as `run_report.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub tables: Vec<TableReport>,
    pub missing_datasets: Vec<Dataset>,
    pub failed_datasets: Vec<FailedDataset>,
    pub quality_notes: Vec<QualityNote>,
    pub results: Vec<ResultSummary>,
}

/// A dataset whose raw file was found but could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedDataset {
    pub dataset: Dataset,
    pub message: String,
}

impl RunReport {
    pub fn table(&self, dataset: Dataset) -> Option<&TableReport> {
        self.tables.iter().find(|table| table.dataset == dataset)
    }

    pub fn total_dropped(&self) -> usize {
        self.tables.iter().map(TableReport::total_dropped).sum()
    }
}
