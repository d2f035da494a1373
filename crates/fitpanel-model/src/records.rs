//! Typed views over cleaned rows.
//!
//! The cleaned layer stores frames; analyses lift the rows they need into
//! these structs before computing anything.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Opaque per-user identifier. Never parsed as a number.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// One user-day of daily activity, including derived fields.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyActivityRecord {
    pub id: UserId,
    pub date: NaiveDate,
    pub total_steps: Option<f64>,
    pub total_distance: Option<f64>,
    pub calories: Option<f64>,
    pub very_active_minutes: Option<f64>,
    pub fairly_active_minutes: Option<f64>,
    pub lightly_active_minutes: Option<f64>,
    pub sedentary_minutes: Option<f64>,
    pub total_minutes: Option<f64>,
    pub total_active_minutes: Option<f64>,
    pub active_ratio: Option<f64>,
    pub non_wear: bool,
}

/// One night of sleep. Both base minute fields are positive.
#[derive(Debug, Clone, PartialEq)]
pub struct SleepRecord {
    pub id: UserId,
    pub date: NaiveDate,
    pub minutes_asleep: f64,
    pub minutes_in_bed: f64,
    pub sleep_efficiency: f64,
    pub time_awake_in_bed: f64,
}

impl SleepRecord {
    pub fn sleep_hours(&self) -> f64 {
        self.minutes_asleep / 60.0
    }
}

/// One heart-rate reading.
#[derive(Debug, Clone, PartialEq)]
pub struct HeartRateSample {
    pub id: UserId,
    pub timestamp: DateTime<Utc>,
    pub bpm: f64,
}

/// One value of an intraday table (hourly steps, calories or intensity).
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayObservation {
    pub id: UserId,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
}
