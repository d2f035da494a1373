//! Frame builders for analysis tests.

use fitpanel_common::{f64_column, string_column};
use fitpanel_model::Dataset;
use fitpanel_transform::derive_metrics;
use polars::prelude::DataFrame;

use crate::analysis::AnalysisInputs;

#[derive(Debug, Clone, Copy)]
pub struct Day {
    pub id: &'static str,
    pub date: &'static str,
    pub steps: f64,
    pub calories: f64,
    /// very, fairly, lightly, sedentary
    pub minutes: [f64; 4],
}

pub fn day(id: &'static str, date: &'static str, steps: f64) -> Day {
    Day {
        id,
        date,
        steps,
        calories: 1500.0 + steps * 0.05,
        minutes: [10.0, 10.0, 200.0, 700.0],
    }
}

pub fn activity_frame(days: &[Day]) -> DataFrame {
    let text = |f: fn(&Day) -> &'static str| -> Vec<Option<String>> {
        days.iter().map(|d| Some(f(d).to_string())).collect()
    };
    let num = |f: fn(&Day) -> f64| -> Vec<Option<f64>> { days.iter().map(|d| Some(f(d))).collect() };
    let df = DataFrame::new(vec![
        string_column("id", text(|d| d.id)),
        string_column("date", text(|d| d.date)),
        f64_column("total_steps", num(|d| d.steps)),
        f64_column("total_distance", num(|d| d.steps / 1300.0)),
        f64_column("calories", num(|d| d.calories)),
        f64_column("very_active_minutes", num(|d| d.minutes[0])),
        f64_column("fairly_active_minutes", num(|d| d.minutes[1])),
        f64_column("lightly_active_minutes", num(|d| d.minutes[2])),
        f64_column("sedentary_minutes", num(|d| d.minutes[3])),
    ])
    .unwrap();
    derive_metrics(Dataset::DailyActivity, df).unwrap()
}

/// `(id, date, minutes_asleep, minutes_in_bed)` nights.
pub fn sleep_frame(nights: &[(&str, &str, f64, f64)]) -> DataFrame {
    let df = DataFrame::new(vec![
        string_column("id", nights.iter().map(|n| Some(n.0.to_string())).collect()),
        string_column("date", nights.iter().map(|n| Some(n.1.to_string())).collect()),
        f64_column("minutes_asleep", nights.iter().map(|n| Some(n.2)).collect()),
        f64_column("minutes_in_bed", nights.iter().map(|n| Some(n.3)).collect()),
    ])
    .unwrap();
    derive_metrics(Dataset::SleepDay, df).unwrap()
}

/// `(id, timestamp, value)` rows of an intraday table.
pub fn intraday_frame(value_column: &str, rows: &[(&str, &str, f64)]) -> DataFrame {
    DataFrame::new(vec![
        string_column("id", rows.iter().map(|r| Some(r.0.to_string())).collect()),
        string_column("timestamp", rows.iter().map(|r| Some(r.1.to_string())).collect()),
        f64_column(value_column, rows.iter().map(|r| Some(r.2)).collect()),
    ])
    .unwrap()
}

pub fn inputs(frames: Vec<(Dataset, DataFrame)>) -> AnalysisInputs {
    AnalysisInputs::from_frames(frames.into_iter().collect()).unwrap()
}

pub fn names(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|name| name.as_str().to_string())
        .collect()
}
