use std::collections::BTreeSet;

use fitpanel_common::{int_column, string_column};
use fitpanel_model::{DailyActivityRecord, Dataset, EngagementConfig};
use polars::prelude::{DataFrame, PolarsResult};

use crate::analysis::{Analysis, AnalysisInputs};
use crate::classify::{Classifier, EngagementLevel, engagement_classifier};
use crate::error::Result;
use crate::extract::by_user;

/// Distinct activity dates of one user's records.
pub(crate) fn days_tracked(records: &[&DailyActivityRecord]) -> usize {
    records
        .iter()
        .map(|record| record.date)
        .collect::<BTreeSet<_>>()
        .len()
}

/// Per-user engagement level from the number of tracked days.
#[derive(Debug, Clone)]
pub struct EngagementAnalysis {
    classifier: Classifier<EngagementLevel>,
}

impl EngagementAnalysis {
    pub fn new(config: &EngagementConfig) -> Self {
        Self {
            classifier: engagement_classifier(config),
        }
    }

    fn frame(rows: &[(String, usize, EngagementLevel)]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            string_column("id", rows.iter().map(|row| Some(row.0.clone())).collect()),
            int_column(
                "days_tracked",
                rows.iter().map(|row| Some(row.1 as i64)).collect(),
            ),
            string_column(
                "engagement_level",
                rows.iter().map(|row| Some(row.2.to_string())).collect(),
            ),
        ])
    }
}

impl Analysis for EngagementAnalysis {
    fn name(&self) -> &'static str {
        "engagement"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        let rows: Vec<_> = by_user(inputs.activity(), |record| &record.id)
            .into_iter()
            .map(|(id, records)| {
                let days = days_tracked(&records);
                (id.to_string(), days, self.classifier.classify(days as f64))
            })
            .collect();
        Ok(Self::frame(&rows)?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[])?)
    }
}
