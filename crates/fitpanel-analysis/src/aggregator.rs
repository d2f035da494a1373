use std::collections::BTreeSet;
use std::time::Instant;

use fitpanel_model::{Dataset, PipelineConfig, ResultSummary};
use fitpanel_store::CleanedStore;
use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};

use crate::analyses::{
    CorrelationMatrixAnalysis, CoverageAnalysis, DayOfWeekAnalysis, EngagementAnalysis,
    FeatureUtilizationAnalysis, HourlySummaryAnalysis, InsightsAnalysis, KeyCorrelationsAnalysis,
    SegmentationAnalysis, SleepAnalysis, WeeklyTrendAnalysis,
};
use crate::analysis::{Analysis, AnalysisInputs};
use crate::error::{AnalysisError, Result};

/// One computed (or skipped) result table.
#[derive(Debug, Clone)]
pub struct ResultTable {
    pub name: &'static str,
    pub frame: DataFrame,
    /// Required datasets that were absent. Non-empty means the table was skipped.
    pub missing: Vec<Dataset>,
}

impl ResultTable {
    pub fn skipped(&self) -> bool {
        !self.missing.is_empty()
    }

    pub fn summary(&self) -> ResultSummary {
        ResultSummary {
            name: self.name.to_string(),
            rows: self.frame.height(),
            skipped: self.skipped(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AggregateOutput {
    pub tables: Vec<ResultTable>,
}

impl AggregateOutput {
    pub fn table(&self, name: &str) -> Option<&ResultTable> {
        self.tables.iter().find(|table| table.name == name)
    }

    pub fn summaries(&self) -> Vec<ResultSummary> {
        self.tables.iter().map(ResultTable::summary).collect()
    }
}

/// Runs every registered analysis against a cleaned store.
pub struct Aggregator {
    analyses: Vec<Box<dyn Analysis>>,
}

impl Aggregator {
    /// The standard result tables, in output order.
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_analyses(vec![
            Box::new(CoverageAnalysis),
            Box::new(EngagementAnalysis::new(&config.engagement)),
            Box::new(FeatureUtilizationAnalysis),
            Box::new(SegmentationAnalysis::new(
                &config.segmentation,
                &config.engagement,
            )),
            Box::new(CorrelationMatrixAnalysis),
            Box::new(KeyCorrelationsAnalysis::new(&config.correlation)),
            Box::new(HourlySummaryAnalysis),
            Box::new(DayOfWeekAnalysis),
            Box::new(WeeklyTrendAnalysis),
            Box::new(SleepAnalysis::new(&config.segmentation, &config.goals)),
            Box::new(InsightsAnalysis::new(&config.goals)),
        ])
    }

    pub fn with_analyses(analyses: Vec<Box<dyn Analysis>>) -> Self {
        Self { analyses }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.analyses.iter().map(|analysis| analysis.name()).collect()
    }

    /// Datasets some registered analysis reads whole.
    pub fn reads(&self) -> BTreeSet<Dataset> {
        self.analyses
            .iter()
            .flat_map(|analysis| analysis.reads().iter().copied())
            .collect()
    }

    /// Computes every result table from `store`.
    ///
    /// # Errors
    ///
    /// [`AnalysisError::MissingMandatoryTable`] when `daily_activity` is
    /// absent; store and frame errors otherwise. A missing optional dataset
    /// only skips the analyses that require it.
    pub fn run(&self, store: &dyn CleanedStore) -> Result<AggregateOutput> {
        let _span = info_span!("aggregate").entered();
        let started = Instant::now();
        if !store.contains(Dataset::DailyActivity) {
            return Err(AnalysisError::MissingMandatoryTable {
                dataset: Dataset::DailyActivity,
            });
        }
        let inputs = AnalysisInputs::from_store(store, &self.reads())?;
        let output = self.run_inputs(&inputs)?;
        info!(
            tables = output.tables.len(),
            skipped = output.tables.iter().filter(|table| table.skipped()).count(),
            duration_ms = started.elapsed().as_millis() as u64,
            "aggregation complete"
        );
        Ok(output)
    }

    pub fn run_inputs(&self, inputs: &AnalysisInputs) -> Result<AggregateOutput> {
        let mut tables = Vec::with_capacity(self.analyses.len());
        for analysis in &self.analyses {
            let name = analysis.name();
            let missing: Vec<Dataset> = analysis
                .requires()
                .iter()
                .copied()
                .filter(|dataset| !inputs.contains(*dataset))
                .collect();
            let frame = if missing.is_empty() {
                let frame = analysis.compute(inputs)?;
                info!(table = name, rows = frame.height(), "computed result table");
                frame
            } else {
                let missing_names: Vec<&str> = missing.iter().map(|d| d.as_str()).collect();
                warn!(table = name, missing = ?missing_names, "skipped analysis, required data absent");
                analysis.empty()?
            };
            tables.push(ResultTable {
                name,
                frame,
                missing,
            });
        }
        Ok(AggregateOutput { tables })
    }
}
