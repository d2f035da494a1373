//! Lifting cleaned frames into typed records.
//!
//! Rows without an id or with an unreadable time value are skipped; the
//! cleaning stage never writes such rows, so a skip means the frame came from
//! somewhere else and is logged at debug level.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use fitpanel_common::{column_bools, column_strings, has_column, optional_f64s};
use fitpanel_model::{
    DailyActivityRecord, Dataset, HeartRateSample, IntradayObservation, SleepRecord, TimeKind,
    UserId, columns,
};
use fitpanel_transform::{parse_canonical_date, parse_canonical_instant};
use polars::prelude::{DataFrame, PolarsResult};
use tracing::debug;

fn floats_or_null(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    Ok(optional_f64s(df, name)?.unwrap_or_else(|| vec![None; df.height()]))
}

fn ids(df: &DataFrame) -> PolarsResult<Vec<Option<UserId>>> {
    if !has_column(df, columns::ID) {
        return Ok(vec![None; df.height()]);
    }
    Ok(column_strings(df, columns::ID)?
        .into_iter()
        .map(|id| id.filter(|id| !id.is_empty()).map(UserId::new))
        .collect())
}

fn dates(df: &DataFrame) -> PolarsResult<Vec<Option<NaiveDate>>> {
    if !has_column(df, columns::DATE) {
        return Ok(vec![None; df.height()]);
    }
    Ok(column_strings(df, columns::DATE)?
        .into_iter()
        .map(|value| value.as_deref().and_then(parse_canonical_date))
        .collect())
}

fn log_skipped(kind: &str, total: usize, kept: usize) {
    if kept < total {
        debug!(kind, skipped = total - kept, "skipped rows without id or time");
    }
}

pub fn activity_records(df: &DataFrame) -> PolarsResult<Vec<DailyActivityRecord>> {
    let ids = ids(df)?;
    let dates = dates(df)?;
    let total_steps = floats_or_null(df, columns::TOTAL_STEPS)?;
    let total_distance = floats_or_null(df, columns::TOTAL_DISTANCE)?;
    let calories = floats_or_null(df, columns::CALORIES)?;
    let very = floats_or_null(df, columns::VERY_ACTIVE_MINUTES)?;
    let fairly = floats_or_null(df, columns::FAIRLY_ACTIVE_MINUTES)?;
    let lightly = floats_or_null(df, columns::LIGHTLY_ACTIVE_MINUTES)?;
    let sedentary = floats_or_null(df, columns::SEDENTARY_MINUTES)?;
    let total_minutes = floats_or_null(df, columns::TOTAL_MINUTES)?;
    let total_active = floats_or_null(df, columns::TOTAL_ACTIVE_MINUTES)?;
    let active_ratio = floats_or_null(df, columns::ACTIVE_RATIO)?;
    let non_wear = if has_column(df, columns::NON_WEAR) {
        column_bools(df, columns::NON_WEAR)?
    } else {
        vec![None; df.height()]
    };

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(id), Some(date)) = (ids[idx].clone(), dates[idx]) else {
            continue;
        };
        records.push(DailyActivityRecord {
            id,
            date,
            total_steps: total_steps[idx],
            total_distance: total_distance[idx],
            calories: calories[idx],
            very_active_minutes: very[idx],
            fairly_active_minutes: fairly[idx],
            lightly_active_minutes: lightly[idx],
            sedentary_minutes: sedentary[idx],
            total_minutes: total_minutes[idx],
            total_active_minutes: total_active[idx],
            active_ratio: active_ratio[idx],
            non_wear: non_wear[idx].unwrap_or(false),
        });
    }
    log_skipped("daily_activity", df.height(), records.len());
    Ok(records)
}

/// Nights with positive asleep and in-bed minutes.
///
/// Efficiency and time awake fall back to being computed from the base
/// minutes when the derived columns are absent.
pub fn sleep_records(df: &DataFrame) -> PolarsResult<Vec<SleepRecord>> {
    let ids = ids(df)?;
    let dates = dates(df)?;
    let asleep = floats_or_null(df, columns::MINUTES_ASLEEP)?;
    let in_bed = floats_or_null(df, columns::MINUTES_IN_BED)?;
    let efficiency = floats_or_null(df, columns::SLEEP_EFFICIENCY)?;
    let awake = floats_or_null(df, columns::TIME_AWAKE_IN_BED)?;

    let mut records = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let (Some(id), Some(date)) = (ids[idx].clone(), dates[idx]) else {
            continue;
        };
        let (Some(minutes_asleep), Some(minutes_in_bed)) = (asleep[idx], in_bed[idx]) else {
            continue;
        };
        if minutes_asleep <= 0.0 || minutes_in_bed <= 0.0 {
            continue;
        }
        records.push(SleepRecord {
            id,
            date,
            minutes_asleep,
            minutes_in_bed,
            sleep_efficiency: efficiency[idx].unwrap_or(minutes_asleep / minutes_in_bed),
            time_awake_in_bed: awake[idx].unwrap_or(minutes_in_bed - minutes_asleep),
        });
    }
    log_skipped("sleep_day", df.height(), records.len());
    Ok(records)
}

/// Observations of `value_column` in a timestamped table.
pub fn intraday_observations(
    df: &DataFrame,
    value_column: &str,
) -> PolarsResult<Vec<IntradayObservation>> {
    let ids = ids(df)?;
    let values = floats_or_null(df, value_column)?;
    let timestamps = if has_column(df, columns::TIMESTAMP) {
        column_strings(df, columns::TIMESTAMP)?
    } else {
        vec![None; df.height()]
    };

    let mut observations = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let Some(id) = ids[idx].clone() else { continue };
        let Some(timestamp) = timestamps[idx].as_deref().and_then(parse_canonical_instant) else {
            continue;
        };
        let Some(value) = values[idx] else { continue };
        observations.push(IntradayObservation {
            id,
            timestamp,
            value,
        });
    }
    log_skipped(value_column, df.height(), observations.len());
    Ok(observations)
}

pub fn heart_rate_samples(df: &DataFrame) -> PolarsResult<Vec<HeartRateSample>> {
    Ok(intraday_observations(df, columns::BPM)?
        .into_iter()
        .map(|observation| HeartRateSample {
            id: observation.id,
            timestamp: observation.timestamp,
            bpm: observation.value,
        })
        .collect())
}

/// Distinct user ids of a frame.
pub fn user_ids(df: &DataFrame) -> PolarsResult<BTreeSet<UserId>> {
    Ok(ids(df)?.into_iter().flatten().collect())
}

/// Earliest and latest calendar date of `dataset`'s time column.
pub fn date_range(dataset: Dataset, df: &DataFrame) -> PolarsResult<Option<(NaiveDate, NaiveDate)>> {
    let column = dataset.time_column();
    if !has_column(df, column) {
        return Ok(None);
    }
    let dates = column_strings(df, column)?
        .into_iter()
        .flatten()
        .filter_map(|value| match dataset.time_kind() {
            TimeKind::Date => parse_canonical_date(&value),
            TimeKind::DateTime => parse_canonical_instant(&value).map(|instant| instant.date_naive()),
        });
    Ok(dates.fold(None, |range, date| match range {
        None => Some((date, date)),
        Some((first, last)) => Some((first.min(date), last.max(date))),
    }))
}

/// Groups records by user id, users in id order, records in input order.
pub fn by_user<'a, T>(
    records: &'a [T],
    id: impl Fn(&T) -> &UserId,
) -> BTreeMap<&'a UserId, Vec<&'a T>> {
    let mut groups: BTreeMap<&UserId, Vec<&T>> = BTreeMap::new();
    for record in records {
        groups.entry(id(record)).or_default().push(record);
    }
    groups
}

#[cfg(test)]
mod tests {
    use fitpanel_common::{bool_column, f64_column, string_column};

    use super::*;

    fn strings(values: &[&str]) -> Vec<Option<String>> {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[test]
    fn activity_rows_without_date_are_skipped() {
        let df = DataFrame::new(vec![
            string_column("id", strings(&["1", "1", "2"])),
            string_column("date", vec![Some("2016-04-12".into()), None, Some("2016-04-12".into())]),
            f64_column("total_steps", vec![Some(100.0), Some(200.0), None]),
            bool_column("non_wear", vec![Some(false), Some(false), Some(true)]),
        ])
        .unwrap();
        let records = activity_records(&df).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].total_steps, Some(100.0));
        assert_eq!(records[0].calories, None);
        assert!(records[1].non_wear);
        assert_eq!(records[1].id.as_str(), "2");
    }

    #[test]
    fn sleep_efficiency_falls_back_to_ratio() {
        let df = DataFrame::new(vec![
            string_column("id", strings(&["1"])),
            string_column("date", strings(&["2016-04-12"])),
            f64_column("minutes_asleep", vec![Some(420.0)]),
            f64_column("minutes_in_bed", vec![Some(480.0)]),
        ])
        .unwrap();
        let records = sleep_records(&df).unwrap();
        assert_eq!(records[0].sleep_efficiency, 0.875);
        assert_eq!(records[0].time_awake_in_bed, 60.0);
    }

    #[test]
    fn date_range_of_timestamped_table() {
        let df = DataFrame::new(vec![
            string_column("id", strings(&["1", "2"])),
            string_column(
                "timestamp",
                strings(&["2016-04-13 23:00:00", "2016-04-12 01:00:00"]),
            ),
        ])
        .unwrap();
        let range = date_range(Dataset::HourlySteps, &df).unwrap().unwrap();
        assert_eq!(range.0.to_string(), "2016-04-12");
        assert_eq!(range.1.to_string(), "2016-04-13");
        assert_eq!(user_ids(&df).unwrap().len(), 2);
    }
}
