use std::collections::BTreeSet;

use fitpanel_common::{f64_column, string_column};
use fitpanel_model::{Dataset, GoalConfig, UserId};
use polars::prelude::{DataFrame, PolarsResult};

use crate::analyses::sleep::in_sleep_goal;
use crate::analyses::temporal::weekly_summaries;
use crate::analysis::{Analysis, AnalysisInputs};
use crate::error::Result;
use crate::extract::{by_user, heart_rate_samples, user_ids};
use crate::stats::{mean, mean_present, percent};

/// One headline number of the business report.
#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub metric: &'static str,
    pub value: Option<f64>,
    pub description: String,
}

impl Insight {
    fn new(metric: &'static str, value: Option<f64>, description: impl Into<String>) -> Self {
        Self {
            metric,
            value,
            description: description.into(),
        }
    }
}

/// Share of users whose fraction of qualifying entries reaches `share`.
fn goal_users<'a, T: 'a>(
    groups: impl IntoIterator<Item = Vec<&'a T>>,
    meets: impl Fn(&T) -> bool,
    share: f64,
) -> (usize, usize) {
    let mut users = 0;
    let mut meeting = 0;
    for entries in groups {
        if entries.is_empty() {
            continue;
        }
        users += 1;
        let met = entries.iter().filter(|entry| meets(**entry)).count();
        if met as f64 / entries.len() as f64 >= share {
            meeting += 1;
        }
    }
    (meeting, users)
}

/// Business KPIs. Optional tables degrade their metrics to null.
#[derive(Debug, Clone)]
pub struct InsightsAnalysis {
    goals: GoalConfig,
}

impl InsightsAnalysis {
    pub fn new(goals: &GoalConfig) -> Self {
        Self {
            goals: goals.clone(),
        }
    }

    pub fn insights(&self, inputs: &AnalysisInputs) -> Result<Vec<Insight>> {
        let goals = &self.goals;
        let activity = inputs.activity();
        let users: BTreeSet<&UserId> = activity.iter().map(|day| &day.id).collect();
        let total_users = users.len();

        let (step_goal_users, _) = goal_users(
            by_user(activity, |day| &day.id).into_values(),
            |day| day.total_steps.is_some_and(|steps| steps >= goals.daily_steps),
            goals.goal_share,
        );

        let sleep = inputs.sleep();
        let sleep_hours: Vec<f64> = sleep.iter().map(|night| night.sleep_hours()).collect();
        let (sleep_goal_users, sleep_users) = goal_users(
            by_user(sleep, |night| &night.id).into_values(),
            |night| in_sleep_goal(night, goals),
            goals.goal_share,
        );

        let adoption = |dataset: Dataset| -> Result<Option<f64>> {
            let Some(frame) = inputs.keys(dataset) else {
                return Ok(None);
            };
            let adopted = user_ids(frame)?
                .iter()
                .filter(|id| users.contains(id))
                .count();
            Ok(percent(adopted, total_users))
        };

        let weeks = weekly_summaries(activity);
        let retention = match goals.retention_week {
            Some(week) => weeks.iter().find(|summary| summary.week == week),
            None => weeks.last(),
        };

        let avg_heart_rate = match inputs.frame(Dataset::HeartRateSeconds) {
            Some(frame) => {
                let bpm: Vec<f64> = heart_rate_samples(frame)?
                    .iter()
                    .map(|sample| sample.bpm)
                    .collect();
                mean(&bpm)
            }
            None => None,
        };

        let non_wear_days = activity.iter().filter(|day| day.non_wear).count();

        Ok(vec![
            Insight::new(
                "total_users",
                Some(total_users as f64),
                "Distinct users with daily activity",
            ),
            Insight::new(
                "avg_daily_steps",
                mean_present(activity.iter().map(|day| day.total_steps)),
                "Mean steps per tracked day",
            ),
            Insight::new(
                "step_goal_users_pct",
                percent(step_goal_users, total_users),
                format!(
                    "Users reaching {} steps on at least {}% of their days",
                    goals.daily_steps,
                    goals.goal_share * 100.0
                ),
            ),
            Insight::new(
                "avg_sleep_hours",
                mean(&sleep_hours),
                "Mean hours asleep per tracked night",
            ),
            Insight::new(
                "sleep_goal_users_pct",
                percent(sleep_goal_users, sleep_users),
                format!(
                    "Sleep-tracking users sleeping {}-{} hours on at least {}% of their nights",
                    goals.sleep_hours_min,
                    goals.sleep_hours_max,
                    goals.goal_share * 100.0
                ),
            ),
            Insight::new(
                "sleep_adoption_pct",
                adoption(Dataset::SleepDay)?,
                "Users with sleep records",
            ),
            Insight::new(
                "weight_adoption_pct",
                adoption(Dataset::WeightLog)?,
                "Users with weight log entries",
            ),
            Insight::new(
                "heart_rate_adoption_pct",
                adoption(Dataset::HeartRateSeconds)?,
                "Users with heart rate samples",
            ),
            Insight::new(
                "retention_week",
                retention.map(|summary| f64::from(summary.week)),
                "Week compared against week 1",
            ),
            Insight::new(
                "retention_pct",
                retention.and_then(|summary| summary.retention_pct),
                "Share of week-1 users still active in the retention week",
            ),
            Insight::new(
                "non_wear_day_pct",
                percent(non_wear_days, activity.len()),
                "Tracked days where the device was not worn",
            ),
            Insight::new(
                "avg_heart_rate_bpm",
                avg_heart_rate,
                "Mean heart rate over all samples",
            ),
        ])
    }

    fn frame(insights: &[Insight]) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            string_column(
                "metric",
                insights.iter().map(|i| Some(i.metric.to_string())).collect(),
            ),
            f64_column("value", insights.iter().map(|i| i.value).collect()),
            string_column(
                "description",
                insights.iter().map(|i| Some(i.description.clone())).collect(),
            ),
        ])
    }
}

impl Analysis for InsightsAnalysis {
    fn name(&self) -> &'static str {
        "business_insights"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn reads(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity, Dataset::HeartRateSeconds]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        Ok(Self::frame(&self.insights(inputs)?)?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{activity_frame, day, inputs, intraday_frame, sleep_frame};

    fn value(insights: &[Insight], metric: &str) -> Option<f64> {
        insights
            .iter()
            .find(|insight| insight.metric == metric)
            .and_then(|insight| insight.value)
    }

    #[test]
    fn kpis_over_activity_and_sleep() {
        let inputs = inputs(vec![
            (
                Dataset::DailyActivity,
                activity_frame(&[
                    day("1", "2016-04-12", 12000.0),
                    day("1", "2016-04-13", 4000.0),
                    day("2", "2016-04-12", 3000.0),
                    day("2", "2016-04-13", 11000.0),
                    day("2", "2016-04-14", 2000.0),
                    day("3", "2016-04-20", 2000.0),
                ]),
            ),
            (
                Dataset::SleepDay,
                sleep_frame(&[
                    ("1", "2016-04-12", 450.0, 480.0),
                    ("2", "2016-04-12", 300.0, 320.0),
                ]),
            ),
            (
                Dataset::HeartRateSeconds,
                intraday_frame(
                    "bpm",
                    &[("1", "2016-04-12 07:21:00", 70.0), ("1", "2016-04-12 07:21:05", 80.0)],
                ),
            ),
        ]);
        let insights = InsightsAnalysis::new(&GoalConfig::default())
            .insights(&inputs)
            .unwrap();

        assert_eq!(value(&insights, "total_users"), Some(3.0));
        // user 1 meets the step goal on half their days, user 2 on a third
        assert!((value(&insights, "step_goal_users_pct").unwrap() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(value(&insights, "sleep_goal_users_pct"), Some(50.0));
        assert!((value(&insights, "sleep_adoption_pct").unwrap() - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(value(&insights, "weight_adoption_pct"), None);
        assert_eq!(value(&insights, "avg_heart_rate_bpm"), Some(75.0));
        assert_eq!(value(&insights, "retention_week"), Some(2.0));
        // user 3 only appears in week 2, so no week-1 user is retained
        assert_eq!(value(&insights, "retention_pct"), Some(0.0));
        assert_eq!(value(&insights, "non_wear_day_pct"), Some(0.0));
    }
}
