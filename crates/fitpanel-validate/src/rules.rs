//! Physical bound rules per dataset family.

use fitpanel_common::column_f64s;
use fitpanel_model::{Dataset, DatasetFamily, DropReason, ValidationConfig, columns};
use fitpanel_transform::minutes_sum;
use polars::prelude::{DataFrame, PolarsResult};

/// A row-level bound. A null in a bounded field counts as a violation,
/// except for the minute fields summed by [`BoundRule::MaxDailyMinutes`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundRule {
    /// Sum of the four intensity-minute fields must not exceed `max`.
    MaxDailyMinutes { max: f64 },
    /// Minutes asleep and minutes in bed must both be positive.
    PositiveSleep,
    /// Heart rate must lie strictly inside `(min, max)`.
    HeartRateRange { min: f64, max: f64 },
    /// Weight must be positive.
    PositiveWeight,
}

impl BoundRule {
    pub fn reason(self) -> DropReason {
        match self {
            BoundRule::MaxDailyMinutes { .. } => DropReason::TotalMinutesExceeded,
            BoundRule::PositiveSleep => DropReason::NonPositiveSleep,
            BoundRule::HeartRateRange { .. } => DropReason::HeartRateOutOfRange,
            BoundRule::PositiveWeight => DropReason::NonPositiveWeight,
        }
    }

    /// One flag per row, `true` where the row breaks the rule.
    pub fn violations(self, df: &DataFrame) -> PolarsResult<Vec<bool>> {
        match self {
            BoundRule::MaxDailyMinutes { max } => {
                let fields = columns::INTENSITY_MINUTES
                    .iter()
                    .map(|name| column_f64s(df, name))
                    .collect::<PolarsResult<Vec<_>>>()?;
                Ok((0..df.height())
                    .map(|idx| {
                        let row: Vec<Option<f64>> = fields.iter().map(|field| field[idx]).collect();
                        minutes_sum(&row) > max
                    })
                    .collect())
            }
            BoundRule::PositiveSleep => {
                let asleep = column_f64s(df, columns::MINUTES_ASLEEP)?;
                let in_bed = column_f64s(df, columns::MINUTES_IN_BED)?;
                Ok(asleep
                    .iter()
                    .zip(&in_bed)
                    .map(|(asleep, in_bed)| !is_positive(*asleep) || !is_positive(*in_bed))
                    .collect())
            }
            BoundRule::HeartRateRange { min, max } => Ok(column_f64s(df, columns::BPM)?
                .into_iter()
                .map(|bpm| !bpm.is_some_and(|bpm| bpm > min && bpm < max))
                .collect()),
            BoundRule::PositiveWeight => Ok(column_f64s(df, columns::WEIGHT_KG)?
                .into_iter()
                .map(|weight| !is_positive(weight))
                .collect()),
        }
    }
}

fn is_positive(value: Option<f64>) -> bool {
    value.is_some_and(|value| value > 0.0)
}

/// Bound rules for `dataset`, in evaluation order.
pub fn rules_for(dataset: Dataset, config: &ValidationConfig) -> Vec<BoundRule> {
    match dataset.family() {
        DatasetFamily::DailyActivity => vec![BoundRule::MaxDailyMinutes {
            max: config.max_daily_minutes,
        }],
        DatasetFamily::Sleep => vec![BoundRule::PositiveSleep],
        DatasetFamily::HeartRate => vec![BoundRule::HeartRateRange {
            min: config.min_bpm_exclusive,
            max: config.max_bpm_exclusive,
        }],
        DatasetFamily::Weight => vec![BoundRule::PositiveWeight],
        DatasetFamily::General => Vec::new(),
    }
}
