use fitpanel_common::{f64_column, int_column, string_column};
use fitpanel_model::{Dataset, GoalConfig, SegmentationConfig, SleepRecord};
use polars::prelude::{DataFrame, PolarsResult};

use crate::analysis::{Analysis, AnalysisInputs};
use crate::classify::{Classifier, SleepPattern, sleep_classifier};
use crate::error::Result;
use crate::extract::by_user;
use crate::stats::{mean, percent};

/// Whether a night's sleep hours fall in the goal band, bounds inclusive.
pub(crate) fn in_sleep_goal(night: &SleepRecord, goals: &GoalConfig) -> bool {
    (goals.sleep_hours_min..=goals.sleep_hours_max).contains(&night.sleep_hours())
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserSleep {
    pub id: String,
    pub nights: usize,
    pub avg_minutes_asleep: Option<f64>,
    pub avg_minutes_in_bed: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub avg_efficiency: Option<f64>,
    pub avg_time_awake: Option<f64>,
    pub goal_nights_pct: Option<f64>,
    pub sleep_pattern: Option<SleepPattern>,
    /// Nights with efficiency above 1, kept but suspicious.
    pub efficiency_outliers: usize,
}

#[derive(Debug, Clone)]
pub struct SleepAnalysis {
    pattern: Classifier<SleepPattern>,
    goals: GoalConfig,
}

impl SleepAnalysis {
    pub fn new(segmentation: &SegmentationConfig, goals: &GoalConfig) -> Self {
        Self {
            pattern: sleep_classifier(segmentation),
            goals: goals.clone(),
        }
    }

    pub fn users(&self, nights: &[SleepRecord]) -> Vec<UserSleep> {
        by_user(nights, |night| &night.id)
            .into_iter()
            .map(|(id, nights)| {
                let values = |f: fn(&SleepRecord) -> f64| -> Vec<f64> {
                    nights.iter().map(|night| f(night)).collect()
                };
                let avg_sleep_hours = mean(&values(SleepRecord::sleep_hours));
                let in_goal = nights
                    .iter()
                    .filter(|night| in_sleep_goal(night, &self.goals))
                    .count();
                UserSleep {
                    id: id.to_string(),
                    nights: nights.len(),
                    avg_minutes_asleep: mean(&values(|night| night.minutes_asleep)),
                    avg_minutes_in_bed: mean(&values(|night| night.minutes_in_bed)),
                    avg_sleep_hours,
                    avg_efficiency: mean(&values(|night| night.sleep_efficiency)),
                    avg_time_awake: mean(&values(|night| night.time_awake_in_bed)),
                    goal_nights_pct: percent(in_goal, nights.len()),
                    sleep_pattern: avg_sleep_hours.map(|hours| self.pattern.classify(hours)),
                    efficiency_outliers: nights
                        .iter()
                        .filter(|night| night.sleep_efficiency > 1.0)
                        .count(),
                }
            })
            .collect()
    }

    fn frame(users: &[UserSleep]) -> PolarsResult<DataFrame> {
        let floats = |f: fn(&UserSleep) -> Option<f64>| -> Vec<Option<f64>> {
            users.iter().map(f).collect()
        };
        DataFrame::new(vec![
            string_column("id", users.iter().map(|u| Some(u.id.clone())).collect()),
            int_column("nights", users.iter().map(|u| Some(u.nights as i64)).collect()),
            f64_column("avg_minutes_asleep", floats(|u| u.avg_minutes_asleep)),
            f64_column("avg_minutes_in_bed", floats(|u| u.avg_minutes_in_bed)),
            f64_column("avg_sleep_hours", floats(|u| u.avg_sleep_hours)),
            f64_column("avg_efficiency", floats(|u| u.avg_efficiency)),
            f64_column("avg_time_awake", floats(|u| u.avg_time_awake)),
            f64_column("goal_nights_pct", floats(|u| u.goal_nights_pct)),
            string_column(
                "sleep_pattern",
                users
                    .iter()
                    .map(|u| u.sleep_pattern.map(|pattern| pattern.to_string()))
                    .collect(),
            ),
            int_column(
                "efficiency_outliers",
                users
                    .iter()
                    .map(|u| Some(u.efficiency_outliers as i64))
                    .collect(),
            ),
        ])
    }
}

impl Analysis for SleepAnalysis {
    fn name(&self) -> &'static str {
        "sleep_analysis"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::SleepDay]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        Ok(Self::frame(&self.users(inputs.sleep()))?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{inputs, sleep_frame};

    #[test]
    fn per_user_sleep_summary() {
        let inputs = inputs(vec![(
            Dataset::SleepDay,
            sleep_frame(&[
                ("1", "2016-04-12", 420.0, 450.0),
                ("1", "2016-04-13", 300.0, 290.0),
                ("2", "2016-04-12", 600.0, 610.0),
            ]),
        )]);
        let analysis = SleepAnalysis::new(&SegmentationConfig::default(), &GoalConfig::default());
        let users = analysis.users(inputs.sleep());
        assert_eq!(users.len(), 2);

        let first = &users[0];
        assert_eq!(first.nights, 2);
        assert_eq!(first.avg_minutes_asleep, Some(360.0));
        assert_eq!(first.avg_sleep_hours, Some(6.0));
        assert_eq!(first.goal_nights_pct, Some(50.0));
        assert_eq!(first.sleep_pattern, Some(SleepPattern::Normal));
        assert_eq!(first.efficiency_outliers, 1);

        let second = &users[1];
        assert_eq!(second.sleep_pattern, Some(SleepPattern::OverSleeper));
        assert_eq!(second.goal_nights_pct, Some(0.0));
    }
}
