//! Pearson correlations over daily activity, and between sleep and activity.

use std::collections::HashMap;

use chrono::{Days, NaiveDate};
use fitpanel_common::{f64_column, int_column, string_column};
use fitpanel_model::{CorrelationConfig, DailyActivityRecord, Dataset, UserId};
use polars::prelude::{DataFrame, PolarsResult};

use crate::analysis::{Analysis, AnalysisInputs};
use crate::classify::StrengthClassifier;
use crate::error::Result;
use crate::fields::{ActivityField, SleepField};
use crate::stats::pearson;

/// Correlation matrix over rows where every field is present.
///
/// With fewer than two complete rows every cell is NaN, the diagonal
/// included; otherwise the diagonal is 1.0.
pub fn correlation_matrix(records: &[DailyActivityRecord], fields: &[ActivityField]) -> Vec<Vec<f64>> {
    let complete: Vec<Vec<f64>> = records
        .iter()
        .filter_map(|record| fields.iter().map(|field| field.get(record)).collect())
        .collect();

    let n = fields.len();
    if complete.len() < 2 {
        return vec![vec![f64::NAN; n]; n];
    }
    let mut matrix = vec![vec![1.0; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let pairs: Vec<(f64, f64)> = complete.iter().map(|row| (row[i], row[j])).collect();
            let r = pearson(&pairs);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    matrix
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CorrelationMatrixAnalysis;

impl CorrelationMatrixAnalysis {
    fn frame(matrix: &[Vec<f64>]) -> PolarsResult<DataFrame> {
        let mut columns = vec![string_column(
            "field",
            ActivityField::ALL
                .iter()
                .take(matrix.len())
                .map(|field| Some(field.name().to_string()))
                .collect(),
        )];
        for (j, field) in ActivityField::ALL.iter().enumerate() {
            columns.push(f64_column(
                field.name(),
                matrix.iter().map(|row| Some(row[j])).collect(),
            ));
        }
        DataFrame::new(columns)
    }
}

impl Analysis for CorrelationMatrixAnalysis {
    fn name(&self) -> &'static str {
        "correlation_matrix"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        let matrix = correlation_matrix(inputs.activity(), &ActivityField::ALL);
        Ok(Self::frame(&matrix)?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[])?)
    }
}

/// How the two sides of a key correlation are paired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Two fields of the same activity day.
    Activity(ActivityField, ActivityField),
    /// A night's sleep against the activity `lag_days` later, same user.
    SleepActivity {
        sleep: SleepField,
        activity: ActivityField,
        lag_days: u64,
    },
}

impl Pairing {
    pub fn names(self) -> (&'static str, &'static str) {
        match self {
            Pairing::Activity(left, right) => (left.name(), right.name()),
            Pairing::SleepActivity {
                sleep, activity, ..
            } => (sleep.name(), activity.name()),
        }
    }

    pub fn lag_days(self) -> u64 {
        match self {
            Pairing::Activity(..) => 0,
            Pairing::SleepActivity { lag_days, .. } => lag_days,
        }
    }

    fn needs_sleep(self) -> bool {
        matches!(self, Pairing::SleepActivity { .. })
    }
}

pub const KEY_PAIRINGS: [Pairing; 10] = [
    Pairing::Activity(ActivityField::TotalSteps, ActivityField::Calories),
    Pairing::Activity(ActivityField::VeryActiveMinutes, ActivityField::Calories),
    Pairing::Activity(ActivityField::TotalActiveMinutes, ActivityField::Calories),
    Pairing::Activity(ActivityField::SedentaryMinutes, ActivityField::Calories),
    Pairing::Activity(ActivityField::TotalDistance, ActivityField::Calories),
    Pairing::Activity(ActivityField::TotalSteps, ActivityField::TotalDistance),
    Pairing::SleepActivity {
        sleep: SleepField::MinutesAsleep,
        activity: ActivityField::TotalSteps,
        lag_days: 0,
    },
    Pairing::SleepActivity {
        sleep: SleepField::MinutesAsleep,
        activity: ActivityField::SedentaryMinutes,
        lag_days: 0,
    },
    Pairing::SleepActivity {
        sleep: SleepField::SleepEfficiency,
        activity: ActivityField::VeryActiveMinutes,
        lag_days: 0,
    },
    Pairing::SleepActivity {
        sleep: SleepField::SleepHours,
        activity: ActivityField::TotalSteps,
        lag_days: 1,
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct KeyCorrelation {
    pub pairing: Pairing,
    pub n: usize,
    pub r: f64,
}

/// Pairwise-complete samples for one pairing.
///
/// Sleep pairings join on exact `(id, date + lag_days)` equality.
pub fn paired_samples(pairing: Pairing, inputs: &AnalysisInputs) -> Vec<(f64, f64)> {
    match pairing {
        Pairing::Activity(left, right) => inputs
            .activity()
            .iter()
            .filter_map(|record| Some((left.get(record)?, right.get(record)?)))
            .collect(),
        Pairing::SleepActivity {
            sleep,
            activity,
            lag_days,
        } => {
            let days: HashMap<(&UserId, NaiveDate), &DailyActivityRecord> = inputs
                .activity()
                .iter()
                .map(|record| ((&record.id, record.date), record))
                .collect();
            inputs
                .sleep()
                .iter()
                .filter_map(|night| {
                    let date = night.date.checked_add_days(Days::new(lag_days))?;
                    let day = days.get(&(&night.id, date))?;
                    Some((sleep.get(night), activity.get(day)?))
                })
                .collect()
        }
    }
}

/// The fixed list of headline correlations with strength labels.
///
/// Sleep pairings are listed only when `sleep_day` is present.
#[derive(Debug, Clone)]
pub struct KeyCorrelationsAnalysis {
    strength: StrengthClassifier,
}

impl KeyCorrelationsAnalysis {
    pub fn new(config: &CorrelationConfig) -> Self {
        Self {
            strength: StrengthClassifier::new(config),
        }
    }

    pub fn correlations(&self, inputs: &AnalysisInputs) -> Vec<KeyCorrelation> {
        let has_sleep = inputs.contains(Dataset::SleepDay);
        KEY_PAIRINGS
            .into_iter()
            .filter(|pairing| has_sleep || !pairing.needs_sleep())
            .map(|pairing| {
                let samples = paired_samples(pairing, inputs);
                KeyCorrelation {
                    pairing,
                    n: samples.len(),
                    r: pearson(&samples),
                }
            })
            .collect()
    }

    fn frame(&self, rows: &[KeyCorrelation]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            string_column(
                "variable_1",
                rows.iter()
                    .map(|row| Some(row.pairing.names().0.to_string()))
                    .collect(),
            ),
            string_column(
                "variable_2",
                rows.iter()
                    .map(|row| Some(row.pairing.names().1.to_string()))
                    .collect(),
            ),
            int_column(
                "lag_days",
                rows.iter()
                    .map(|row| Some(row.pairing.lag_days() as i64))
                    .collect(),
            ),
            int_column("n", rows.iter().map(|row| Some(row.n as i64)).collect()),
            f64_column("correlation", rows.iter().map(|row| Some(row.r)).collect()),
            string_column(
                "strength",
                rows.iter()
                    .map(|row| Some(self.strength.classify(row.r).to_string()))
                    .collect(),
            ),
        ])
    }
}

impl Analysis for KeyCorrelationsAnalysis {
    fn name(&self) -> &'static str {
        "key_correlations"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        Ok(self.frame(&self.correlations(inputs))?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(self.frame(&[])?)
    }
}

#[cfg(test)]
mod tests {
    use fitpanel_common::column_strings;
    use proptest::prelude::*;

    use super::*;
    use crate::classify::CorrelationStrength;
    use crate::testing::{Day, activity_frame, day, inputs, sleep_frame};

    fn record(steps: Option<f64>, calories: Option<f64>, sedentary: f64) -> DailyActivityRecord {
        DailyActivityRecord {
            id: UserId::from("1"),
            date: NaiveDate::from_ymd_opt(2016, 4, 12).unwrap(),
            total_steps: steps,
            total_distance: steps.map(|s| s / 1300.0),
            calories,
            very_active_minutes: Some(sedentary / 10.0),
            fairly_active_minutes: Some(5.0),
            lightly_active_minutes: Some(100.0),
            sedentary_minutes: Some(sedentary),
            total_minutes: Some(sedentary + 105.0),
            total_active_minutes: Some(105.0 + sedentary / 10.0),
            active_ratio: None,
            non_wear: false,
        }
    }

    #[test]
    fn matrix_needs_two_complete_rows() {
        let records = vec![
            record(Some(1000.0), Some(2000.0), 600.0),
            record(None, Some(2100.0), 700.0),
        ];
        let matrix = correlation_matrix(&records, &ActivityField::ALL);
        assert!(matrix.iter().flatten().all(|cell| cell.is_nan()));
    }

    #[test]
    fn zero_variance_field_is_nan_off_diagonal() {
        let records = vec![
            record(Some(1000.0), Some(2000.0), 600.0),
            record(Some(2000.0), Some(2500.0), 700.0),
            record(Some(3000.0), Some(2600.0), 650.0),
        ];
        let matrix = correlation_matrix(&records, &ActivityField::ALL);
        // fairly_active_minutes is constant
        assert_eq!(matrix[4][4], 1.0);
        assert!(matrix[0][4].is_nan());
        assert!((matrix[0][1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn sleep_pairings_only_with_sleep_table() {
        let days: Vec<Day> = [
            ("2016-04-12", 5000.0),
            ("2016-04-13", 8000.0),
            ("2016-04-14", 6000.0),
            ("2016-04-15", 9000.0),
        ]
        .into_iter()
        .map(|(date, steps)| day("1", date, steps))
        .collect();
        let activity = activity_frame(&days);
        let analysis = KeyCorrelationsAnalysis::new(&CorrelationConfig::default());

        let without = inputs(vec![(Dataset::DailyActivity, activity.clone())]);
        assert_eq!(analysis.correlations(&without).len(), 6);

        let with = inputs(vec![
            (Dataset::DailyActivity, activity),
            (
                Dataset::SleepDay,
                sleep_frame(&[
                    ("1", "2016-04-12", 300.0, 320.0),
                    ("1", "2016-04-13", 420.0, 450.0),
                    ("1", "2016-04-14", 360.0, 400.0),
                ]),
            ),
        ]);
        let correlations = analysis.correlations(&with);
        assert_eq!(correlations.len(), 10);
        let lag = correlations.last().unwrap();
        assert_eq!(lag.pairing.lag_days(), 1);
        assert_eq!(lag.pairing.names(), ("sleep_hours", "total_steps"));
        // nights of 12th, 13th, 14th pair with days 13th, 14th, 15th
        assert_eq!(lag.n, 3);
        assert_eq!(correlations[6].n, 3);

        let frame = analysis.compute(&with).unwrap();
        let strengths = column_strings(&frame, "strength").unwrap();
        assert_eq!(strengths.len(), 10);
        // constant minutes leave very_active_minutes-calories undefined
        assert_eq!(
            strengths[1].as_deref(),
            Some(CorrelationStrength::Undefined.as_str())
        );
    }

    proptest! {
        #[test]
        fn matrix_is_symmetric_with_unit_diagonal(
            rows in prop::collection::vec(
                (0.0f64..30000.0, 1000.0f64..4000.0, 0.0f64..1000.0),
                2..40,
            )
        ) {
            let records: Vec<_> = rows
                .iter()
                .map(|(steps, calories, sedentary)| record(Some(*steps), Some(*calories), *sedentary))
                .collect();
            let matrix = correlation_matrix(&records, &ActivityField::ALL);
            for i in 0..matrix.len() {
                prop_assert_eq!(matrix[i][i], 1.0);
                for j in 0..matrix.len() {
                    let (a, b) = (matrix[i][j], matrix[j][i]);
                    prop_assert!(a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan()));
                    prop_assert!(a.is_nan() || (-1.0..=1.0).contains(&a));
                }
            }
        }
    }
}
