//! Registry of the known panel datasets.
//!
//! Every raw export belongs to one of eighteen fixed table shapes. The
//! [`Dataset`] enum names them; the [`DatasetRegistry`] carries the lookup data
//! (raw file patterns, time columns, column aliases) that the loader and the
//! discovery step are constructed with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical column names shared by the cleaned tables.
pub mod columns {
    pub const ID: &str = "id";
    pub const DATE: &str = "date";
    pub const TIMESTAMP: &str = "timestamp";
    pub const LOG_ID: &str = "log_id";

    pub const TOTAL_STEPS: &str = "total_steps";
    pub const TOTAL_DISTANCE: &str = "total_distance";
    pub const CALORIES: &str = "calories";
    pub const VERY_ACTIVE_MINUTES: &str = "very_active_minutes";
    pub const FAIRLY_ACTIVE_MINUTES: &str = "fairly_active_minutes";
    pub const LIGHTLY_ACTIVE_MINUTES: &str = "lightly_active_minutes";
    pub const SEDENTARY_MINUTES: &str = "sedentary_minutes";

    pub const TOTAL_MINUTES: &str = "total_minutes";
    pub const TOTAL_ACTIVE_MINUTES: &str = "total_active_minutes";
    pub const ACTIVE_RATIO: &str = "active_ratio";
    pub const NON_WEAR: &str = "non_wear";

    pub const MINUTES_ASLEEP: &str = "minutes_asleep";
    pub const MINUTES_IN_BED: &str = "minutes_in_bed";
    pub const SLEEP_EFFICIENCY: &str = "sleep_efficiency";
    pub const TIME_AWAKE_IN_BED: &str = "time_awake_in_bed";

    pub const BPM: &str = "bpm";
    pub const WEIGHT_KG: &str = "weight_kg";
    pub const IS_MANUAL_REPORT: &str = "is_manual_report";
    pub const STEPS: &str = "steps";
    pub const TOTAL_INTENSITY: &str = "total_intensity";

    /// The four per-intensity minute fields of the daily activity family.
    pub const INTENSITY_MINUTES: [&str; 4] = [
        VERY_ACTIVE_MINUTES,
        FAIRLY_ACTIVE_MINUTES,
        LIGHTLY_ACTIVE_MINUTES,
        SEDENTARY_MINUTES,
    ];

    /// Suffix shared by every distance column.
    pub const DISTANCE_SUFFIX: &str = "_distance";
}

/// One of the eighteen known raw tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    DailyActivity,
    DailyCalories,
    DailyIntensities,
    DailySteps,
    SleepDay,
    WeightLog,
    HourlyCalories,
    HourlyIntensities,
    HourlySteps,
    HeartRateSeconds,
    MinuteCaloriesNarrow,
    MinuteCaloriesWide,
    MinuteIntensitiesNarrow,
    MinuteIntensitiesWide,
    MinuteMetsNarrow,
    MinuteSleep,
    MinuteStepsNarrow,
    MinuteStepsWide,
}

/// Granularity of a dataset's time column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeKind {
    /// One row per user per calendar day.
    Date,
    /// One row per user per instant (hour, minute or second).
    DateTime,
}

impl TimeKind {
    /// Name of the canonical time column in the cleaned table.
    pub fn column_name(self) -> &'static str {
        match self {
            TimeKind::Date => columns::DATE,
            TimeKind::DateTime => columns::TIMESTAMP,
        }
    }
}

/// Rule family a dataset is validated and derived under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetFamily {
    /// Daily activity and daily intensities: intensity minutes and distances.
    DailyActivity,
    Sleep,
    HeartRate,
    Weight,
    /// No family-specific rules beyond parsing and duplicates.
    General,
}

/// Storage type of a cleaned column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Opaque string token (`id`, `log_id`).
    Text,
    /// Canonical date or instant rendering.
    Time,
    Boolean,
    Numeric,
}

impl Dataset {
    pub const ALL: [Dataset; 18] = [
        Dataset::DailyActivity,
        Dataset::DailyCalories,
        Dataset::DailyIntensities,
        Dataset::DailySteps,
        Dataset::SleepDay,
        Dataset::WeightLog,
        Dataset::HourlyCalories,
        Dataset::HourlyIntensities,
        Dataset::HourlySteps,
        Dataset::HeartRateSeconds,
        Dataset::MinuteCaloriesNarrow,
        Dataset::MinuteCaloriesWide,
        Dataset::MinuteIntensitiesNarrow,
        Dataset::MinuteIntensitiesWide,
        Dataset::MinuteMetsNarrow,
        Dataset::MinuteSleep,
        Dataset::MinuteStepsNarrow,
        Dataset::MinuteStepsWide,
    ];

    /// Canonical snake-case name, also the cleaned file stem.
    pub fn as_str(self) -> &'static str {
        match self {
            Dataset::DailyActivity => "daily_activity",
            Dataset::DailyCalories => "daily_calories",
            Dataset::DailyIntensities => "daily_intensities",
            Dataset::DailySteps => "daily_steps",
            Dataset::SleepDay => "sleep_day",
            Dataset::WeightLog => "weight_log",
            Dataset::HourlyCalories => "hourly_calories",
            Dataset::HourlyIntensities => "hourly_intensities",
            Dataset::HourlySteps => "hourly_steps",
            Dataset::HeartRateSeconds => "heart_rate_seconds",
            Dataset::MinuteCaloriesNarrow => "minute_calories_narrow",
            Dataset::MinuteCaloriesWide => "minute_calories_wide",
            Dataset::MinuteIntensitiesNarrow => "minute_intensities_narrow",
            Dataset::MinuteIntensitiesWide => "minute_intensities_wide",
            Dataset::MinuteMetsNarrow => "minute_mets_narrow",
            Dataset::MinuteSleep => "minute_sleep",
            Dataset::MinuteStepsNarrow => "minute_steps_narrow",
            Dataset::MinuteStepsWide => "minute_steps_wide",
        }
    }

    /// Human-readable description for listings.
    pub fn description(self) -> &'static str {
        match self {
            Dataset::DailyActivity => "Daily steps, distances, intensity minutes and calories",
            Dataset::DailyCalories => "Daily calories burned",
            Dataset::DailyIntensities => "Daily intensity minutes and distances",
            Dataset::DailySteps => "Daily step totals",
            Dataset::SleepDay => "Nightly minutes asleep and in bed",
            Dataset::WeightLog => "Weight and BMI log entries",
            Dataset::HourlyCalories => "Hourly calories burned",
            Dataset::HourlyIntensities => "Hourly total and average intensity",
            Dataset::HourlySteps => "Hourly step totals",
            Dataset::HeartRateSeconds => "Heart rate samples at seconds resolution",
            Dataset::MinuteCaloriesNarrow => "Per-minute calories (long format)",
            Dataset::MinuteCaloriesWide => "Per-minute calories (one row per hour)",
            Dataset::MinuteIntensitiesNarrow => "Per-minute intensity (long format)",
            Dataset::MinuteIntensitiesWide => "Per-minute intensity (one row per hour)",
            Dataset::MinuteMetsNarrow => "Per-minute METs (long format)",
            Dataset::MinuteSleep => "Per-minute sleep state",
            Dataset::MinuteStepsNarrow => "Per-minute steps (long format)",
            Dataset::MinuteStepsWide => "Per-minute steps (one row per hour)",
        }
    }

    pub fn time_kind(self) -> TimeKind {
        match self {
            Dataset::DailyActivity
            | Dataset::DailyCalories
            | Dataset::DailyIntensities
            | Dataset::DailySteps
            | Dataset::SleepDay => TimeKind::Date,
            _ => TimeKind::DateTime,
        }
    }

    /// Canonical time column (`date` or `timestamp`).
    pub fn time_column(self) -> &'static str {
        self.time_kind().column_name()
    }

    /// Columns that identify a row: user and time.
    pub fn key_columns(self) -> [&'static str; 2] {
        [columns::ID, self.time_column()]
    }

    pub fn family(self) -> DatasetFamily {
        match self {
            Dataset::DailyActivity | Dataset::DailyIntensities => DatasetFamily::DailyActivity,
            Dataset::SleepDay => DatasetFamily::Sleep,
            Dataset::HeartRateSeconds => DatasetFamily::HeartRate,
            Dataset::WeightLog => DatasetFamily::Weight,
            _ => DatasetFamily::General,
        }
    }

    /// Daily activity anchors user identity and date ranges; nothing else is required.
    pub fn is_mandatory(self) -> bool {
        self == Dataset::DailyActivity
    }

    /// Canonical columns a raw file must provide, key columns first.
    pub fn required_columns(self) -> Vec<&'static str> {
        let mut required = self.key_columns().to_vec();
        match self.family() {
            DatasetFamily::DailyActivity => required.extend(columns::INTENSITY_MINUTES),
            DatasetFamily::Sleep => {
                required.extend([columns::MINUTES_ASLEEP, columns::MINUTES_IN_BED]);
            }
            DatasetFamily::HeartRate => required.push(columns::BPM),
            DatasetFamily::Weight => required.push(columns::WEIGHT_KG),
            DatasetFamily::General => {}
        }
        required
    }

    /// Storage kind of a canonical column in this dataset.
    pub fn column_kind(self, column: &str) -> ColumnKind {
        if column == self.time_column() {
            return ColumnKind::Time;
        }
        match column {
            columns::ID | columns::LOG_ID => ColumnKind::Text,
            columns::IS_MANUAL_REPORT | columns::NON_WEAR => ColumnKind::Boolean,
            _ => ColumnKind::Numeric,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dataset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Dataset::ALL
            .into_iter()
            .find(|dataset| dataset.as_str() == normalized)
            .ok_or_else(|| format!("unknown dataset: {s}"))
    }
}

/// Loader-facing description of one dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetSpec {
    pub dataset: Dataset,
    /// Lowercase substring identifying the raw file (matched case-insensitively).
    pub file_pattern: String,
    /// Normalized raw name of the column holding the date or instant.
    pub raw_time_column: String,
    /// Normalized raw name -> canonical name.
    pub aliases: Vec<(String, String)>,
}

impl DatasetSpec {
    fn new(dataset: Dataset, file_pattern: &str, raw_time_column: &str) -> Self {
        Self {
            dataset,
            file_pattern: file_pattern.to_string(),
            raw_time_column: raw_time_column.to_string(),
            aliases: Vec::new(),
        }
    }

    fn alias(mut self, raw: &str, canonical: &str) -> Self {
        self.aliases.push((raw.to_string(), canonical.to_string()));
        self
    }

    /// Canonical name for a normalized raw column.
    pub fn canonical_column(&self, normalized: &str) -> String {
        if normalized == self.raw_time_column {
            return self.dataset.time_column().to_string();
        }
        self.aliases
            .iter()
            .find(|(raw, _)| raw == normalized)
            .map(|(_, canonical)| canonical.clone())
            .unwrap_or_else(|| normalized.to_string())
    }
}

/// Immutable lookup data for all known datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRegistry {
    specs: Vec<DatasetSpec>,
}

impl DatasetRegistry {
    /// The registry for the standard eighteen-file panel export.
    pub fn standard() -> Self {
        use Dataset as D;
        let specs = vec![
            DatasetSpec::new(D::DailyActivity, "dailyactivity", "activity_date"),
            DatasetSpec::new(D::DailyCalories, "dailycalories", "activity_day"),
            DatasetSpec::new(D::DailyIntensities, "dailyintensities", "activity_day"),
            DatasetSpec::new(D::DailySteps, "dailysteps", "activity_day")
                .alias("step_total", columns::TOTAL_STEPS),
            DatasetSpec::new(D::SleepDay, "sleepday", "sleep_day")
                .alias("total_minutes_asleep", columns::MINUTES_ASLEEP)
                .alias("total_time_in_bed", columns::MINUTES_IN_BED),
            DatasetSpec::new(D::WeightLog, "weightloginfo", "date"),
            DatasetSpec::new(D::HourlyCalories, "hourlycalories", "activity_hour"),
            DatasetSpec::new(D::HourlyIntensities, "hourlyintensities", "activity_hour"),
            DatasetSpec::new(D::HourlySteps, "hourlysteps", "activity_hour")
                .alias("step_total", columns::STEPS),
            DatasetSpec::new(D::HeartRateSeconds, "heartrate_seconds", "time")
                .alias("value", columns::BPM),
            DatasetSpec::new(D::MinuteCaloriesNarrow, "minutecaloriesnarrow", "activity_minute"),
            DatasetSpec::new(D::MinuteCaloriesWide, "minutecalorieswide", "activity_hour"),
            DatasetSpec::new(
                D::MinuteIntensitiesNarrow,
                "minuteintensitiesnarrow",
                "activity_minute",
            ),
            DatasetSpec::new(D::MinuteIntensitiesWide, "minuteintensitieswide", "activity_hour"),
            DatasetSpec::new(D::MinuteMetsNarrow, "minutemetsnarrow", "activity_minute"),
            DatasetSpec::new(D::MinuteSleep, "minutesleep", "date").alias("value", "sleep_state"),
            DatasetSpec::new(D::MinuteStepsNarrow, "minutestepsnarrow", "activity_minute"),
            DatasetSpec::new(D::MinuteStepsWide, "minutestepswide", "activity_hour"),
        ];
        Self { specs }
    }

    pub fn specs(&self) -> &[DatasetSpec] {
        &self.specs
    }

    pub fn get(&self, dataset: Dataset) -> Option<&DatasetSpec> {
        self.specs.iter().find(|spec| spec.dataset == dataset)
    }

    /// Finds the dataset whose file pattern occurs in `file_stem`.
    ///
    /// Matching is case-insensitive; when several patterns occur the longest one wins.
    pub fn match_file_stem(&self, file_stem: &str) -> Option<Dataset> {
        let lowered = file_stem.to_lowercase();
        self.specs
            .iter()
            .filter(|spec| lowered.contains(&spec.file_pattern))
            .max_by_key(|spec| spec.file_pattern.len())
            .map(|spec| spec.dataset)
    }
}

impl Default for DatasetRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_dataset_once() {
        let registry = DatasetRegistry::standard();
        assert_eq!(registry.specs().len(), Dataset::ALL.len());
        for dataset in Dataset::ALL {
            assert!(registry.get(dataset).is_some(), "missing {dataset}");
        }
    }

    #[test]
    fn matches_raw_export_names() {
        let registry = DatasetRegistry::standard();
        assert_eq!(
            registry.match_file_stem("dailyActivity_merged"),
            Some(Dataset::DailyActivity)
        );
        assert_eq!(
            registry.match_file_stem("heartrate_seconds_merged"),
            Some(Dataset::HeartRateSeconds)
        );
        assert_eq!(
            registry.match_file_stem("minuteSleep_merged"),
            Some(Dataset::MinuteSleep)
        );
        assert_eq!(
            registry.match_file_stem("SLEEPDAY_MERGED"),
            Some(Dataset::SleepDay)
        );
        assert_eq!(
            registry.match_file_stem("minuteStepsWide_merged"),
            Some(Dataset::MinuteStepsWide)
        );
        assert_eq!(registry.match_file_stem("notes"), None);
    }

    #[test]
    fn canonical_column_applies_time_rename_and_aliases() {
        let registry = DatasetRegistry::standard();
        let sleep = registry.get(Dataset::SleepDay).unwrap();
        assert_eq!(sleep.canonical_column("sleep_day"), "date");
        assert_eq!(sleep.canonical_column("total_minutes_asleep"), "minutes_asleep");
        assert_eq!(sleep.canonical_column("total_sleep_records"), "total_sleep_records");

        let heart = registry.get(Dataset::HeartRateSeconds).unwrap();
        assert_eq!(heart.canonical_column("time"), "timestamp");
        assert_eq!(heart.canonical_column("value"), "bpm");
    }

    #[test]
    fn column_kinds() {
        assert_eq!(Dataset::WeightLog.column_kind("id"), ColumnKind::Text);
        assert_eq!(Dataset::WeightLog.column_kind("log_id"), ColumnKind::Text);
        assert_eq!(Dataset::WeightLog.column_kind("timestamp"), ColumnKind::Time);
        assert_eq!(
            Dataset::WeightLog.column_kind("is_manual_report"),
            ColumnKind::Boolean
        );
        assert_eq!(Dataset::WeightLog.column_kind("weight_kg"), ColumnKind::Numeric);
        assert_eq!(Dataset::DailyActivity.column_kind("date"), ColumnKind::Time);
    }

    #[test]
    fn required_columns_follow_family() {
        assert_eq!(
            Dataset::SleepDay.required_columns(),
            vec!["id", "date", "minutes_asleep", "minutes_in_bed"]
        );
        assert_eq!(
            Dataset::HeartRateSeconds.required_columns(),
            vec!["id", "timestamp", "bpm"]
        );
        assert_eq!(Dataset::DailyIntensities.required_columns().len(), 6);
        assert_eq!(Dataset::HourlySteps.required_columns(), vec!["id", "timestamp"]);
    }

    #[test]
    fn dataset_round_trips_through_name() {
        for dataset in Dataset::ALL {
            assert_eq!(dataset.as_str().parse::<Dataset>(), Ok(dataset));
        }
        assert!("nope".parse::<Dataset>().is_err());
    }
}
