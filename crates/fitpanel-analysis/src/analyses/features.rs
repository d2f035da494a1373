use std::collections::BTreeSet;

use fitpanel_common::{bool_column, int_column, string_column};
use fitpanel_model::{Dataset, UserId};
use polars::prelude::{DataFrame, PolarsResult};

use crate::analysis::{Analysis, AnalysisInputs};
use crate::error::Result;
use crate::extract::{by_user, user_ids};

/// Optional datasets counted as tracker features, in column order.
const FEATURES: [(&str, Dataset); 4] = [
    ("sleep", Dataset::SleepDay),
    ("weight", Dataset::WeightLog),
    ("heart_rate", Dataset::HeartRateSeconds),
    ("hourly", Dataset::HourlySteps),
];

/// Which tracker features each daily-activity user produced data for.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureUtilizationAnalysis;

impl FeatureUtilizationAnalysis {
    fn frame(ids: &[String], flags: &[[bool; 4]]) -> PolarsResult<DataFrame> {
        let mut columns = vec![
            string_column("id", ids.iter().cloned().map(Some).collect()),
            bool_column("activity", vec![Some(true); ids.len()]),
        ];
        for (idx, (name, _)) in FEATURES.iter().enumerate() {
            columns.push(bool_column(
                name,
                flags.iter().map(|row| Some(row[idx])).collect(),
            ));
        }
        columns.push(int_column(
            "features_used",
            flags
                .iter()
                .map(|row| Some(1 + row.iter().filter(|used| **used).count() as i64))
                .collect(),
        ));
        DataFrame::new(columns)
    }
}

impl Analysis for FeatureUtilizationAnalysis {
    fn name(&self) -> &'static str {
        "feature_utilization"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        let mut feature_users: Vec<BTreeSet<UserId>> = Vec::with_capacity(FEATURES.len());
        for (_, dataset) in FEATURES {
            feature_users.push(match inputs.keys(dataset) {
                Some(frame) => user_ids(frame)?,
                None => BTreeSet::new(),
            });
        }

        let users = by_user(inputs.activity(), |record| &record.id);
        let ids: Vec<String> = users.keys().map(ToString::to_string).collect();
        let flags: Vec<[bool; 4]> = users
            .keys()
            .map(|id| std::array::from_fn(|idx| feature_users[idx].contains(*id)))
            .collect();
        Ok(Self::frame(&ids, &flags)?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[], &[])?)
    }
}

#[cfg(test)]
mod tests {
    use fitpanel_common::{column_bools, column_f64s};

    use super::*;
    use crate::testing::{activity_frame, day, inputs, intraday_frame, names, sleep_frame};

    #[test]
    fn counts_features_per_user() {
        let inputs = inputs(vec![
            (
                Dataset::DailyActivity,
                activity_frame(&[day("1", "2016-04-12", 100.0), day("2", "2016-04-12", 100.0)]),
            ),
            (
                Dataset::SleepDay,
                sleep_frame(&[("1", "2016-04-12", 400.0, 420.0)]),
            ),
            (
                Dataset::HourlySteps,
                intraday_frame("steps", &[("1", "2016-04-12 08:00:00", 300.0)]),
            ),
        ]);
        let result = FeatureUtilizationAnalysis.compute(&inputs).unwrap();
        assert_eq!(
            names(&result),
            ["id", "activity", "sleep", "weight", "heart_rate", "hourly", "features_used"]
        );
        assert_eq!(
            column_bools(&result, "sleep").unwrap(),
            vec![Some(true), Some(false)]
        );
        assert_eq!(
            column_bools(&result, "weight").unwrap(),
            vec![Some(false), Some(false)]
        );
        assert_eq!(
            column_f64s(&result, "features_used").unwrap(),
            vec![Some(3.0), Some(1.0)]
        );
    }
}
