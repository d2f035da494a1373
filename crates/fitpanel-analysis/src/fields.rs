//! Named numeric fields of activity and sleep records.

use fitpanel_model::{DailyActivityRecord, SleepRecord, columns};

/// Daily activity fields entering the correlation matrix, in matrix order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityField {
    TotalSteps,
    TotalDistance,
    Calories,
    VeryActiveMinutes,
    FairlyActiveMinutes,
    LightlyActiveMinutes,
    SedentaryMinutes,
    TotalActiveMinutes,
}

impl ActivityField {
    pub const ALL: [ActivityField; 8] = [
        ActivityField::TotalSteps,
        ActivityField::TotalDistance,
        ActivityField::Calories,
        ActivityField::VeryActiveMinutes,
        ActivityField::FairlyActiveMinutes,
        ActivityField::LightlyActiveMinutes,
        ActivityField::SedentaryMinutes,
        ActivityField::TotalActiveMinutes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActivityField::TotalSteps => columns::TOTAL_STEPS,
            ActivityField::TotalDistance => columns::TOTAL_DISTANCE,
            ActivityField::Calories => columns::CALORIES,
            ActivityField::VeryActiveMinutes => columns::VERY_ACTIVE_MINUTES,
            ActivityField::FairlyActiveMinutes => columns::FAIRLY_ACTIVE_MINUTES,
            ActivityField::LightlyActiveMinutes => columns::LIGHTLY_ACTIVE_MINUTES,
            ActivityField::SedentaryMinutes => columns::SEDENTARY_MINUTES,
            ActivityField::TotalActiveMinutes => columns::TOTAL_ACTIVE_MINUTES,
        }
    }

    pub fn get(self, record: &DailyActivityRecord) -> Option<f64> {
        match self {
            ActivityField::TotalSteps => record.total_steps,
            ActivityField::TotalDistance => record.total_distance,
            ActivityField::Calories => record.calories,
            ActivityField::VeryActiveMinutes => record.very_active_minutes,
            ActivityField::FairlyActiveMinutes => record.fairly_active_minutes,
            ActivityField::LightlyActiveMinutes => record.lightly_active_minutes,
            ActivityField::SedentaryMinutes => record.sedentary_minutes,
            ActivityField::TotalActiveMinutes => record.total_active_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SleepField {
    MinutesAsleep,
    SleepEfficiency,
    SleepHours,
}

impl SleepField {
    pub fn name(self) -> &'static str {
        match self {
            SleepField::MinutesAsleep => columns::MINUTES_ASLEEP,
            SleepField::SleepEfficiency => columns::SLEEP_EFFICIENCY,
            SleepField::SleepHours => "sleep_hours",
        }
    }

    pub fn get(self, record: &SleepRecord) -> f64 {
        match self {
            SleepField::MinutesAsleep => record.minutes_asleep,
            SleepField::SleepEfficiency => record.sleep_efficiency,
            SleepField::SleepHours => record.sleep_hours(),
        }
    }
}
