//! Hour-of-day, day-of-week and weekly summaries.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Timelike};
use fitpanel_common::{bool_column, f64_column, int_column, string_column};
use fitpanel_model::{DailyActivityRecord, Dataset, IntradayObservation, UserId, columns};
use polars::prelude::{DataFrame, PolarsResult};

use crate::analysis::{Analysis, AnalysisInputs};
use crate::error::Result;
use crate::extract::intraday_observations;
use crate::stats::{mean, mean_present, percent};

fn hourly_means(observations: &[IntradayObservation]) -> [Vec<f64>; 24] {
    let mut by_hour: [Vec<f64>; 24] = std::array::from_fn(|_| Vec::new());
    for observation in observations {
        by_hour[observation.timestamp.hour() as usize].push(observation.value);
    }
    by_hour
}

/// Means of hourly steps, calories and intensity for each hour 0-23.
///
/// Hours come from the instant as parsed; no timezone shift is applied.
/// Hours without observations keep their row with null means. Only hourly
/// steps are required; an absent calories or intensities table leaves its
/// column null. `observations` counts step observations.
#[derive(Debug, Clone, Copy, Default)]
pub struct HourlySummaryAnalysis;

impl HourlySummaryAnalysis {
    fn frame(
        steps: &[Vec<f64>],
        calories: &[Vec<f64>],
        intensity: &[Vec<f64>],
    ) -> PolarsResult<DataFrame> {
        let hours = steps.len();
        DataFrame::new(vec![
            int_column("hour", (0..hours).map(|hour| Some(hour as i64)).collect()),
            f64_column("avg_steps", steps.iter().map(|values| mean(values)).collect()),
            f64_column("avg_calories", calories.iter().map(|values| mean(values)).collect()),
            f64_column("avg_intensity", intensity.iter().map(|values| mean(values)).collect()),
            int_column(
                "observations",
                steps.iter().map(|values| Some(values.len() as i64)).collect(),
            ),
        ])
    }
}

impl Analysis for HourlySummaryAnalysis {
    fn name(&self) -> &'static str {
        "hourly_summary"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::HourlySteps]
    }

    fn reads(&self) -> &'static [Dataset] {
        &[
            Dataset::HourlySteps,
            Dataset::HourlyCalories,
            Dataset::HourlyIntensities,
        ]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        let observe = |dataset: Dataset, column: &str| -> Result<[Vec<f64>; 24]> {
            let observations = match inputs.frame(dataset) {
                Some(frame) => intraday_observations(frame, column)?,
                None => Vec::new(),
            };
            Ok(hourly_means(&observations))
        };
        let steps = observe(Dataset::HourlySteps, columns::STEPS)?;
        let calories = observe(Dataset::HourlyCalories, columns::CALORIES)?;
        let intensity = observe(Dataset::HourlyIntensities, columns::TOTAL_INTENSITY)?;
        Ok(Self::frame(&steps, &calories, &intensity)?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[], &[], &[])?)
    }
}

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Activity means per weekday, Monday first, Saturday and Sunday flagged
/// as weekend. Always seven rows when computed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DayOfWeekAnalysis;

impl DayOfWeekAnalysis {
    fn frame(groups: &[Vec<&DailyActivityRecord>]) -> PolarsResult<DataFrame> {
        let avg = |f: fn(&DailyActivityRecord) -> Option<f64>| -> Vec<Option<f64>> {
            groups
                .iter()
                .map(|days| mean_present(days.iter().map(|day| f(day))))
                .collect()
        };
        let indices = 0..groups.len();
        DataFrame::new(vec![
            int_column("day_index", indices.clone().map(|idx| Some(idx as i64)).collect()),
            string_column(
                "day_of_week",
                indices.clone().map(|idx| Some(WEEKDAYS[idx].to_string())).collect(),
            ),
            bool_column("is_weekend", indices.map(|idx| Some(idx >= 5)).collect()),
            int_column(
                "days",
                groups.iter().map(|days| Some(days.len() as i64)).collect(),
            ),
            f64_column("avg_steps", avg(|day| day.total_steps)),
            f64_column("avg_calories", avg(|day| day.calories)),
            f64_column("avg_active_minutes", avg(|day| day.total_active_minutes)),
            f64_column("avg_sedentary_minutes", avg(|day| day.sedentary_minutes)),
        ])
    }
}

impl Analysis for DayOfWeekAnalysis {
    fn name(&self) -> &'static str {
        "day_of_week_summary"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        let mut groups: Vec<Vec<&DailyActivityRecord>> = vec![Vec::new(); 7];
        for record in inputs.activity() {
            groups[record.date.weekday().num_days_from_monday() as usize].push(record);
        }
        Ok(Self::frame(&groups)?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[])?)
    }
}

/// One week of the study period.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekSummary {
    pub week: u32,
    pub active_users: usize,
    pub avg_steps: Option<f64>,
    pub avg_calories: Option<f64>,
    pub avg_active_minutes: Option<f64>,
    /// Share of week 1's users also active this week.
    pub retention_pct: Option<f64>,
}

/// Weeks numbered `floor((date - first date) / 7) + 1`; only weeks with
/// records are listed.
pub fn weekly_summaries(records: &[DailyActivityRecord]) -> Vec<WeekSummary> {
    let Some(start) = records.iter().map(|record| record.date).min() else {
        return Vec::new();
    };
    let mut weeks: BTreeMap<u32, Vec<&DailyActivityRecord>> = BTreeMap::new();
    for record in records {
        let offset = (record.date - start).num_days();
        let week = u32::try_from(offset / 7).unwrap_or(u32::MAX).saturating_add(1);
        weeks.entry(week).or_default().push(record);
    }

    let users = |days: &[&DailyActivityRecord]| -> BTreeSet<UserId> {
        days.iter().map(|day| day.id.clone()).collect()
    };
    let baseline = weeks.get(&1).map(|days| users(days)).unwrap_or_default();
    weeks
        .iter()
        .map(|(week, days)| {
            let active = users(days);
            let retained = active.intersection(&baseline).count();
            WeekSummary {
                week: *week,
                active_users: active.len(),
                avg_steps: mean_present(days.iter().map(|day| day.total_steps)),
                avg_calories: mean_present(days.iter().map(|day| day.calories)),
                avg_active_minutes: mean_present(days.iter().map(|day| day.total_active_minutes)),
                retention_pct: percent(retained, baseline.len()),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WeeklyTrendAnalysis;

impl WeeklyTrendAnalysis {
    fn frame(weeks: &[WeekSummary]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            int_column("week", weeks.iter().map(|w| Some(i64::from(w.week))).collect()),
            int_column(
                "active_users",
                weeks.iter().map(|w| Some(w.active_users as i64)).collect(),
            ),
            f64_column("avg_steps", weeks.iter().map(|w| w.avg_steps).collect()),
            f64_column("avg_calories", weeks.iter().map(|w| w.avg_calories).collect()),
            f64_column(
                "avg_active_minutes",
                weeks.iter().map(|w| w.avg_active_minutes).collect(),
            ),
            f64_column("retention_pct", weeks.iter().map(|w| w.retention_pct).collect()),
        ])
    }
}

impl Analysis for WeeklyTrendAnalysis {
    fn name(&self) -> &'static str {
        "weekly_trend"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        Ok(Self::frame(&weekly_summaries(inputs.activity()))?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[])?)
    }
}
