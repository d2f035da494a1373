//! Pipeline configuration.
//!
//! Every threshold and lookup list the pipeline uses lives here so loaders,
//! validators and analyses receive them at construction time. Defaults match
//! the published report; a TOML file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Top-level configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub validation: ValidationConfig,
    pub segmentation: SegmentationConfig,
    pub engagement: EngagementConfig,
    pub correlation: CorrelationConfig,
    pub goals: GoalConfig,
    pub datetime: DateTimeConfig,
}

impl PipelineConfig {
    /// Parses a TOML document, filling anything not given with defaults.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Checks that thresholds are ordered and lists are non-empty.
    pub fn validate(&self) -> Result<()> {
        let cutoffs = &self.segmentation.activity_step_cutoffs;
        if cutoffs.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(ConfigError::invalid(
                "segmentation.activity_step_cutoffs must be strictly increasing",
            ));
        }
        if self.segmentation.under_sleep_hours > self.segmentation.over_sleep_hours {
            return Err(ConfigError::invalid(
                "segmentation.under_sleep_hours must not exceed over_sleep_hours",
            ));
        }
        let engagement = &self.engagement;
        if !(engagement.everyday_days >= engagement.heavy_days
            && engagement.heavy_days >= engagement.moderate_days)
        {
            return Err(ConfigError::invalid(
                "engagement thresholds must satisfy everyday >= heavy >= moderate",
            ));
        }
        let correlation = &self.correlation;
        if !(correlation.strong >= correlation.moderate && correlation.moderate >= correlation.weak)
        {
            return Err(ConfigError::invalid(
                "correlation thresholds must satisfy strong >= moderate >= weak",
            ));
        }
        if self.goals.sleep_hours_min > self.goals.sleep_hours_max {
            return Err(ConfigError::invalid(
                "goals.sleep_hours_min must not exceed goals.sleep_hours_max",
            ));
        }
        if !(0.0..=1.0).contains(&self.goals.goal_share) {
            return Err(ConfigError::invalid("goals.goal_share must lie in [0, 1]"));
        }
        if self.datetime.patterns.is_empty() {
            return Err(ConfigError::invalid("datetime.patterns must not be empty"));
        }
        Ok(())
    }
}

/// Physical bounds applied by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Maximum recorded minutes in one day (inclusive).
    pub max_daily_minutes: f64,
    /// Heart-rate samples must lie strictly between these bounds.
    pub min_bpm_exclusive: f64,
    pub max_bpm_exclusive: f64,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_daily_minutes: 1440.0,
            min_bpm_exclusive: 0.0,
            max_bpm_exclusive: 220.0,
        }
    }
}

/// Cutoffs for activity level and sleep pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    /// Upper (exclusive) mean-step bounds of Sedentary, Low Active,
    /// Somewhat Active and Active. Anything above is Highly Active.
    pub activity_step_cutoffs: [f64; 4],
    /// Mean sleep hours below this are Under-sleeper.
    pub under_sleep_hours: f64,
    /// Mean sleep hours above this are Over-sleeper.
    pub over_sleep_hours: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            activity_step_cutoffs: [5000.0, 7500.0, 10000.0, 12500.0],
            under_sleep_hours: 6.0,
            over_sleep_hours: 8.0,
        }
    }
}

/// Minimum tracked days per engagement level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub everyday_days: u32,
    pub heavy_days: u32,
    pub moderate_days: u32,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            everyday_days: 25,
            heavy_days: 21,
            moderate_days: 11,
        }
    }
}

/// Minimum |r| per correlation strength label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub strong: f64,
    pub moderate: f64,
    pub weak: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            strong: 0.7,
            moderate: 0.4,
            weak: 0.2,
        }
    }
}

/// Goal definitions behind the business KPIs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalConfig {
    pub daily_steps: f64,
    pub sleep_hours_min: f64,
    pub sleep_hours_max: f64,
    /// Fraction of days a user must meet a goal to count as meeting it.
    pub goal_share: f64,
    /// Week compared against week 1 for retention. `None` means the last week.
    pub retention_week: Option<u32>,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            daily_steps: 10_000.0,
            sleep_hours_min: 7.0,
            sleep_hours_max: 9.0,
            goal_share: 0.5,
            retention_week: None,
        }
    }
}

/// One accepted date/time layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTimePattern {
    /// chrono format string.
    pub format: String,
    /// Date-only layouts resolve to midnight.
    pub has_time: bool,
}

impl DateTimePattern {
    pub fn date_time(format: &str) -> Self {
        Self {
            format: format.to_string(),
            has_time: true,
        }
    }

    pub fn date_only(format: &str) -> Self {
        Self {
            format: format.to_string(),
            has_time: false,
        }
    }
}

/// Ordered datetime layouts. The first layout that parses wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateTimeConfig {
    pub patterns: Vec<DateTimePattern>,
}

impl Default for DateTimeConfig {
    fn default() -> Self {
        Self {
            patterns: vec![
                DateTimePattern::date_time("%Y-%m-%d %H:%M:%S"),
                DateTimePattern::date_time("%Y-%m-%dT%H:%M:%S"),
                DateTimePattern::date_time("%Y-%m-%d %H:%M"),
                DateTimePattern::date_only("%Y-%m-%d"),
                DateTimePattern::date_time("%Y/%m/%d %H:%M:%S"),
                DateTimePattern::date_only("%Y/%m/%d"),
                DateTimePattern::date_time("%m/%d/%Y %I:%M:%S %p"),
                DateTimePattern::date_time("%m/%d/%Y %H:%M:%S"),
                DateTimePattern::date_time("%m/%d/%Y %H:%M"),
                DateTimePattern::date_only("%m/%d/%Y"),
                DateTimePattern::date_time("%m-%d-%Y %I:%M:%S %p"),
                DateTimePattern::date_time("%m-%d-%Y %H:%M:%S"),
                DateTimePattern::date_only("%m-%d-%Y"),
            ],
        }
    }
}
