use std::collections::BTreeMap;

use fitpanel_common::{f64_column, int_column, string_column};
use fitpanel_model::{Dataset, EngagementConfig, SegmentationConfig, SleepRecord, UserId};
use polars::prelude::{DataFrame, PolarsResult};

use crate::analyses::engagement::days_tracked;
use crate::analysis::{Analysis, AnalysisInputs};
use crate::classify::{
    ActivityLevel, Classifier, EngagementLevel, SleepPattern, activity_classifier,
    engagement_classifier, sleep_classifier,
};
use crate::error::Result;
use crate::extract::by_user;
use crate::stats::{mean, mean_present};

#[derive(Debug, Clone, PartialEq)]
pub struct UserSegment {
    pub id: UserId,
    pub days_tracked: usize,
    pub avg_steps: Option<f64>,
    pub avg_calories: Option<f64>,
    pub avg_distance: Option<f64>,
    pub avg_sleep_hours: Option<f64>,
    pub avg_sleep_efficiency: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub engagement_level: EngagementLevel,
    pub sleep_pattern: Option<SleepPattern>,
}

/// One row per daily-activity user joining activity means, sleep means
/// and the three segment labels.
///
/// Sleep is optional: users without nights, or runs without `sleep_day`,
/// get null sleep averages and a null sleep pattern.
#[derive(Debug, Clone)]
pub struct SegmentationAnalysis {
    activity: Classifier<ActivityLevel>,
    engagement: Classifier<EngagementLevel>,
    sleep: Classifier<SleepPattern>,
}

impl SegmentationAnalysis {
    pub fn new(segmentation: &SegmentationConfig, engagement: &EngagementConfig) -> Self {
        Self {
            activity: activity_classifier(segmentation),
            engagement: engagement_classifier(engagement),
            sleep: sleep_classifier(segmentation),
        }
    }

    pub fn segments(&self, inputs: &AnalysisInputs) -> Vec<UserSegment> {
        let nights: BTreeMap<&UserId, Vec<&SleepRecord>> =
            by_user(inputs.sleep(), |record| &record.id);

        by_user(inputs.activity(), |record| &record.id)
            .into_iter()
            .map(|(id, days)| {
                let avg_steps = mean_present(days.iter().map(|day| day.total_steps));
                let user_nights = nights.get(id).map(Vec::as_slice).unwrap_or_default();
                let hours: Vec<f64> = user_nights.iter().map(|night| night.sleep_hours()).collect();
                let efficiency: Vec<f64> =
                    user_nights.iter().map(|night| night.sleep_efficiency).collect();
                let avg_sleep_hours = mean(&hours);
                let days_tracked = days_tracked(&days);
                UserSegment {
                    id: id.clone(),
                    days_tracked,
                    avg_steps,
                    avg_calories: mean_present(days.iter().map(|day| day.calories)),
                    avg_distance: mean_present(days.iter().map(|day| day.total_distance)),
                    avg_sleep_hours,
                    avg_sleep_efficiency: mean(&efficiency),
                    activity_level: avg_steps.map(|steps| self.activity.classify(steps)),
                    engagement_level: self.engagement.classify(days_tracked as f64),
                    sleep_pattern: avg_sleep_hours.map(|hours| self.sleep.classify(hours)),
                }
            })
            .collect()
    }

    fn frame(segments: &[UserSegment]) -> PolarsResult<DataFrame> {
        let floats = |f: fn(&UserSegment) -> Option<f64>| -> Vec<Option<f64>> {
            segments.iter().map(f).collect()
        };
        DataFrame::new(vec![
            string_column("id", segments.iter().map(|s| Some(s.id.to_string())).collect()),
            int_column(
                "days_tracked",
                segments.iter().map(|s| Some(s.days_tracked as i64)).collect(),
            ),
            f64_column("avg_steps", floats(|s| s.avg_steps)),
            f64_column("avg_calories", floats(|s| s.avg_calories)),
            f64_column("avg_distance", floats(|s| s.avg_distance)),
            f64_column("avg_sleep_hours", floats(|s| s.avg_sleep_hours)),
            f64_column("avg_sleep_efficiency", floats(|s| s.avg_sleep_efficiency)),
            string_column(
                "activity_level",
                segments
                    .iter()
                    .map(|s| s.activity_level.map(|level| level.to_string()))
                    .collect(),
            ),
            string_column(
                "engagement_level",
                segments
                    .iter()
                    .map(|s| Some(s.engagement_level.to_string()))
                    .collect(),
            ),
            string_column(
                "sleep_pattern",
                segments
                    .iter()
                    .map(|s| s.sleep_pattern.map(|pattern| pattern.to_string()))
                    .collect(),
            ),
        ])
    }
}

impl Analysis for SegmentationAnalysis {
    fn name(&self) -> &'static str {
        "user_segments"
    }

    fn requires(&self) -> &'static [Dataset] {
        &[Dataset::DailyActivity]
    }

    fn compute(&self, inputs: &AnalysisInputs) -> Result<DataFrame> {
        Ok(Self::frame(&self.segments(inputs))?)
    }

    fn empty(&self) -> Result<DataFrame> {
        Ok(Self::frame(&[])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{activity_frame, day, inputs, names, sleep_frame};

    fn analysis() -> SegmentationAnalysis {
        SegmentationAnalysis::new(&SegmentationConfig::default(), &EngagementConfig::default())
    }

    #[test]
    fn joins_sleep_when_present() {
        let inputs = inputs(vec![
            (
                Dataset::DailyActivity,
                activity_frame(&[
                    day("1", "2016-04-12", 9000.0),
                    day("1", "2016-04-13", 11000.0),
                    day("2", "2016-04-12", 4000.0),
                ]),
            ),
            (
                Dataset::SleepDay,
                sleep_frame(&[
                    ("1", "2016-04-12", 300.0, 330.0),
                    ("1", "2016-04-13", 360.0, 390.0),
                ]),
            ),
        ]);
        let segments = analysis().segments(&inputs);
        assert_eq!(segments.len(), 2);

        let first = &segments[0];
        assert_eq!(first.avg_steps, Some(10000.0));
        assert_eq!(first.activity_level, Some(ActivityLevel::Active));
        assert_eq!(first.avg_sleep_hours, Some(5.5));
        assert_eq!(first.sleep_pattern, Some(SleepPattern::UnderSleeper));
        assert_eq!(first.engagement_level, EngagementLevel::Light);

        let second = &segments[1];
        assert_eq!(second.activity_level, Some(ActivityLevel::Sedentary));
        assert_eq!(second.avg_sleep_hours, None);
        assert_eq!(second.sleep_pattern, None);
    }

    #[test]
    fn sleep_is_optional() {
        let inputs = inputs(vec![(
            Dataset::DailyActivity,
            activity_frame(&[day("1", "2016-04-12", 13000.0)]),
        )]);
        let result = analysis().compute(&inputs).unwrap();
        assert_eq!(result.height(), 1);
        assert_eq!(
            names(&result),
            [
                "id",
                "days_tracked",
                "avg_steps",
                "avg_calories",
                "avg_distance",
                "avg_sleep_hours",
                "avg_sleep_efficiency",
                "activity_level",
                "engagement_level",
                "sleep_pattern",
            ]
        );
        let segment = &analysis().segments(&inputs)[0];
        assert_eq!(segment.activity_level, Some(ActivityLevel::HighlyActive));
        assert_eq!(segment.sleep_pattern, None);
    }
}
