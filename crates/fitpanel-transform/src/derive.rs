//! Derived columns for cleaned tables.
//!
//! Row arithmetic lives in small pure functions ([`activity_totals`],
//! [`sleep_metrics`], [`round_distance`]) so it can be tested without frames;
//! [`derive_metrics`] applies them column-wise to a validated table.

use fitpanel_common::{bool_column, column_f64s, f64_column, optional_f64s};
use fitpanel_model::{Dataset, DatasetFamily, columns};
use polars::prelude::{DataFrame, PolarsResult};
use tracing::debug;

/// Derived fields for one daily activity row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivityTotals {
    pub total_minutes: Option<f64>,
    pub total_active_minutes: Option<f64>,
    pub active_ratio: Option<f64>,
    pub non_wear: bool,
}

/// Derived fields for one sleep row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SleepMetrics {
    pub sleep_efficiency: Option<f64>,
    pub time_awake_in_bed: Option<f64>,
}

/// Sum of minute fields with nulls counted as zero.
pub fn minutes_sum(minutes: &[Option<f64>]) -> f64 {
    minutes.iter().map(|value| value.unwrap_or(0.0)).sum()
}

/// Computes totals from `[very, fairly, lightly, sedentary]` minutes.
///
/// `steps` is `None` for tables without a step column; non-wear is then judged
/// on intensity minutes alone. A row with every minute field null has a null
/// total.
pub fn activity_totals(minutes: [Option<f64>; 4], steps: Option<Option<f64>>) -> ActivityTotals {
    let total_minutes = minutes
        .iter()
        .any(Option::is_some)
        .then(|| minutes_sum(&minutes));
    let sedentary = minutes[3].unwrap_or(0.0);
    let total_active_minutes = total_minutes.map(|total| total - sedentary);
    let active_ratio = match (total_active_minutes, total_minutes) {
        (Some(active), Some(total)) if total != 0.0 => Some(active / total),
        _ => None,
    };

    let idle_minutes = minutes.iter().all(|value| value.unwrap_or(0.0) == 0.0);
    let idle_steps = steps.is_none_or(|value| value.unwrap_or(0.0) == 0.0);

    ActivityTotals {
        total_minutes,
        total_active_minutes,
        active_ratio,
        non_wear: idle_minutes && idle_steps,
    }
}

pub fn sleep_metrics(minutes_asleep: Option<f64>, minutes_in_bed: Option<f64>) -> SleepMetrics {
    match (minutes_asleep, minutes_in_bed) {
        (Some(asleep), Some(in_bed)) => SleepMetrics {
            sleep_efficiency: (in_bed != 0.0).then(|| asleep / in_bed),
            time_awake_in_bed: Some(in_bed - asleep),
        },
        _ => SleepMetrics {
            sleep_efficiency: None,
            time_awake_in_bed: None,
        },
    }
}

/// Rounds to two decimals, half-to-even on the value scaled by 100.
pub fn round_distance(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Adds the derived columns for `dataset`'s family.
///
/// Tables outside the activity and sleep families are returned unchanged.
pub fn derive_metrics(dataset: Dataset, df: DataFrame) -> PolarsResult<DataFrame> {
    match dataset.family() {
        DatasetFamily::DailyActivity => {
            let mut df = round_distances(df)?;
            add_activity_totals(&mut df)?;
            Ok(df)
        }
        DatasetFamily::Sleep => {
            let mut df = df;
            add_sleep_metrics(&mut df)?;
            Ok(df)
        }
        _ => Ok(df),
    }
}

fn add_activity_totals(df: &mut DataFrame) -> PolarsResult<()> {
    let [very, fairly, lightly, sedentary] = columns::INTENSITY_MINUTES;
    let very = column_f64s(df, very)?;
    let fairly = column_f64s(df, fairly)?;
    let lightly = column_f64s(df, lightly)?;
    let sedentary = column_f64s(df, sedentary)?;
    let steps = optional_f64s(df, columns::TOTAL_STEPS)?;

    let height = df.height();
    let mut total_minutes = Vec::with_capacity(height);
    let mut total_active = Vec::with_capacity(height);
    let mut ratio = Vec::with_capacity(height);
    let mut non_wear = Vec::with_capacity(height);
    for idx in 0..height {
        let row_steps = steps.as_ref().map(|values| values[idx]);
        let totals = activity_totals(
            [very[idx], fairly[idx], lightly[idx], sedentary[idx]],
            row_steps,
        );
        total_minutes.push(totals.total_minutes);
        total_active.push(totals.total_active_minutes);
        ratio.push(totals.active_ratio);
        non_wear.push(Some(totals.non_wear));
    }

    df.with_column(f64_column(columns::TOTAL_MINUTES, total_minutes))?;
    df.with_column(f64_column(columns::TOTAL_ACTIVE_MINUTES, total_active))?;
    df.with_column(f64_column(columns::ACTIVE_RATIO, ratio))?;
    df.with_column(bool_column(columns::NON_WEAR, non_wear))?;
    Ok(())
}

fn add_sleep_metrics(df: &mut DataFrame) -> PolarsResult<()> {
    let asleep = column_f64s(df, columns::MINUTES_ASLEEP)?;
    let in_bed = column_f64s(df, columns::MINUTES_IN_BED)?;

    let (efficiency, awake): (Vec<_>, Vec<_>) = asleep
        .iter()
        .zip(&in_bed)
        .map(|(asleep, in_bed)| {
            let metrics = sleep_metrics(*asleep, *in_bed);
            (metrics.sleep_efficiency, metrics.time_awake_in_bed)
        })
        .unzip();

    df.with_column(f64_column(columns::SLEEP_EFFICIENCY, efficiency))?;
    df.with_column(f64_column(columns::TIME_AWAKE_IN_BED, awake))?;
    Ok(())
}

fn round_distances(mut df: DataFrame) -> PolarsResult<DataFrame> {
    let distance_columns: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str().to_string())
        .filter(|name| name.ends_with(columns::DISTANCE_SUFFIX))
        .collect();

    for name in &distance_columns {
        let rounded = column_f64s(&df, name)?
            .into_iter()
            .map(|value| value.map(round_distance))
            .collect();
        df.with_column(f64_column(name, rounded))?;
    }
    debug!(columns = distance_columns.len(), "rounded distance columns");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitpanel_common::{column_bools, string_column};
    use proptest::prelude::*;

    #[test]
    fn full_day_boundary_row() {
        let totals = activity_totals(
            [Some(30.0), Some(20.0), Some(200.0), Some(1190.0)],
            Some(Some(8000.0)),
        );
        assert_eq!(totals.total_minutes, Some(1440.0));
        assert_eq!(totals.total_active_minutes, Some(250.0));
        let ratio = totals.active_ratio.unwrap();
        assert!((ratio - 250.0 / 1440.0).abs() < 1e-12);
        assert!((ratio - 0.1736).abs() < 1e-4);
        assert!(!totals.non_wear);
    }

    #[test]
    fn zero_day_is_non_wear_with_null_ratio() {
        let totals = activity_totals([Some(0.0); 4], Some(Some(0.0)));
        assert_eq!(totals.total_minutes, Some(0.0));
        assert_eq!(totals.active_ratio, None);
        assert!(totals.non_wear);

        let with_steps = activity_totals([Some(0.0); 4], Some(Some(12.0)));
        assert!(!with_steps.non_wear);

        let without_step_column = activity_totals([Some(0.0); 4], None);
        assert!(without_step_column.non_wear);
    }

    #[test]
    fn all_null_minutes_have_null_total() {
        let totals = activity_totals([None; 4], None);
        assert_eq!(totals.total_minutes, None);
        assert_eq!(totals.total_active_minutes, None);
    }

    #[test]
    fn sleep_efficiency_and_awake_time() {
        let metrics = sleep_metrics(Some(420.0), Some(480.0));
        assert_eq!(metrics.sleep_efficiency, Some(0.875));
        assert_eq!(metrics.time_awake_in_bed, Some(60.0));
        assert_eq!(sleep_metrics(None, Some(480.0)).sleep_efficiency, None);
    }

    #[test]
    fn distance_rounding_is_half_to_even() {
        assert_eq!(round_distance(2.5), 2.5);
        assert_eq!(round_distance(1.234), 1.23);
        assert_eq!(round_distance(1.236), 1.24);
        assert_eq!(round_distance(0.125), 0.12);
        assert_eq!(round_distance(0.375), 0.38);
    }

    #[test]
    fn derives_activity_columns_on_frame() {
        let df = DataFrame::new(vec![
            string_column("id", vec![Some("1".into()), Some("2".into())]),
            f64_column("total_steps", vec![Some(8000.0), Some(0.0)]),
            f64_column("total_distance", vec![Some(5.456), Some(0.0)]),
            f64_column("very_active_minutes", vec![Some(30.0), Some(0.0)]),
            f64_column("fairly_active_minutes", vec![Some(20.0), Some(0.0)]),
            f64_column("lightly_active_minutes", vec![Some(200.0), Some(0.0)]),
            f64_column("sedentary_minutes", vec![Some(1190.0), Some(0.0)]),
        ])
        .unwrap();

        let out = derive_metrics(Dataset::DailyActivity, df).unwrap();
        assert_eq!(
            column_f64s(&out, "total_minutes").unwrap(),
            vec![Some(1440.0), Some(0.0)]
        );
        assert_eq!(
            column_f64s(&out, "total_active_minutes").unwrap(),
            vec![Some(250.0), Some(0.0)]
        );
        assert_eq!(column_f64s(&out, "active_ratio").unwrap()[1], None);
        assert_eq!(
            column_bools(&out, "non_wear").unwrap(),
            vec![Some(false), Some(true)]
        );
        assert_eq!(
            column_f64s(&out, "total_distance").unwrap(),
            vec![Some(5.46), Some(0.0)]
        );
    }

    #[test]
    fn other_families_are_untouched() {
        let df = DataFrame::new(vec![f64_column("bpm", vec![Some(70.0)])]).unwrap();
        let out = derive_metrics(Dataset::HeartRateSeconds, df.clone()).unwrap();
        assert!(out.equals_missing(&df));
    }

    proptest! {
        #[test]
        fn active_plus_sedentary_equals_total(
            very in 0u32..300,
            fairly in 0u32..300,
            lightly in 0u32..500,
            sedentary in 0u32..1440,
        ) {
            let totals = activity_totals(
                [
                    Some(f64::from(very)),
                    Some(f64::from(fairly)),
                    Some(f64::from(lightly)),
                    Some(f64::from(sedentary)),
                ],
                None,
            );
            let total = totals.total_minutes.unwrap();
            let active = totals.total_active_minutes.unwrap();
            prop_assert_eq!(active + f64::from(sedentary), total);
        }
    }
}
