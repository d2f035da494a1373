use fitpanel_common::{f64_column, int_column, string_column};
use fitpanel_model::Dataset;
use polars::prelude::{DataFrame, PolarsResult};

use crate::analysis::{Analysis, AnalysisInputs};
use crate::error::Result;
use crate::extract::{date_range, user_ids};
use crate::stats::percent;

struct CoverageRow {
    dataset: Dataset,
    rows: usize,
    users: usize,
    first_date: Option<String>,
    last_date: Option<String>,
    user_pct: Option<f64>,
}

/// Rows, users and date span of every present dataset.
///
/// `user_pct` is the dataset's user count relative to daily-activity users.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoverageAnalysis;

impl CoverageAnalysis {
    fn frame(rows: &[CoverageRow]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            string_column(
                "dataset",
                rows.iter().map(|row| Some(row.dataset.to_string())).collect(),
            ),
            int_column("rows", rows.iter().map(|row| Some(row.rows as i64)).collect()),
            int_column("users", rows.iter().map(|row| Some(row.users as i64)).collect()),
            string_column(
                "first_date",
                rows.iter().map(|row| row.first_date.clone()).collect(),
            ),
            string_column(
                "last_date",
                rows.iter().map(|row| row.last_date.clone()).collect(),
            ),
            f64_column("user_pct", rows.iter().map(|row| row.user_pct).collect()),
        ])
    }
}

impl Analysis for CoverageAnalysis {
    fn name(&self) -> &'static str {
        "user_coverage"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        let activity_users = match inputs.keys(Dataset::DailyActivity) {
            Some(frame) => user_ids(frame)?.len(),
            None => 0,
        };
        let mut rows = Vec::new();
        for (dataset, frame) in inputs.datasets() {
            let users = user_ids(frame)?.len();
            let range = date_range(dataset, frame)?;
            rows.push(CoverageRow {
                dataset,
                rows: frame.height(),
                users,
                first_date: range.map(|(first, _)| first.to_string()),
                last_date: range.map(|(_, last)| last.to_string()),
                user_pct: percent(users, activity_users),
            });
        }
        Ok(Self::frame(&rows)?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[])?)
    }
}

#[cfg(test)]
mod tests {
    use fitpanel_common::{column_f64s, column_strings};

    use super::*;
    use crate::testing::{activity_frame, day, inputs, sleep_frame};

    #[test]
    fn one_row_per_present_dataset() {
        let inputs = inputs(vec![
            (
                Dataset::DailyActivity,
                activity_frame(&[
                    day("1", "2016-04-12", 100.0),
                    day("2", "2016-04-14", 100.0),
                    day("3", "2016-04-13", 100.0),
                    day("4", "2016-04-13", 100.0),
                ]),
            ),
            (
                Dataset::SleepDay,
                sleep_frame(&[("1", "2016-04-12", 400.0, 420.0)]),
            ),
        ]);
        let result = CoverageAnalysis.compute(&inputs).unwrap();
        assert_eq!(
            column_strings(&result, "dataset").unwrap(),
            vec![Some("daily_activity".to_string()), Some("sleep_day".to_string())]
        );
        assert_eq!(
            column_strings(&result, "first_date").unwrap()[0].as_deref(),
            Some("2016-04-12")
        );
        assert_eq!(
            column_strings(&result, "last_date").unwrap()[0].as_deref(),
            Some("2016-04-14")
        );
        assert_eq!(
            column_f64s(&result, "user_pct").unwrap(),
            vec![Some(100.0), Some(25.0)]
        );
    }
}
