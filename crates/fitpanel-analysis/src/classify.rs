//! Ordered threshold classifiers and the labels they produce.
//!
//! A [`Classifier`] is an explicit list of `(bound, label)` pairs evaluated
//! top-down; the first bound the value satisfies decides the label, and the
//! fallback covers everything else.

use std::fmt;

use fitpanel_model::{CorrelationConfig, EngagementConfig, SegmentationConfig};

/// A one-sided test on a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Below(f64),
    AtMost(f64),
    AtLeast(f64),
}

impl Bound {
    pub fn matches(self, value: f64) -> bool {
        match self {
            Bound::Below(limit) => value < limit,
            Bound::AtMost(limit) => value <= limit,
            Bound::AtLeast(limit) => value >= limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Classifier<T> {
    rules: Vec<(Bound, T)>,
    fallback: T,
}

impl<T: Copy> Classifier<T> {
    pub fn new(rules: Vec<(Bound, T)>, fallback: T) -> Self {
        Self { rules, fallback }
    }

    pub fn classify(&self, value: f64) -> T {
        self.rules
            .iter()
            .find(|(bound, _)| bound.matches(value))
            .map(|(_, label)| *label)
            .unwrap_or(self.fallback)
    }
}

macro_rules! label_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

label_enum!(ActivityLevel {
    Sedentary => "Sedentary",
    LowActive => "Low Active",
    SomewhatActive => "Somewhat Active",
    Active => "Active",
    HighlyActive => "Highly Active",
});

label_enum!(EngagementLevel {
    Light => "Light",
    Moderate => "Moderate",
    Heavy => "Heavy",
    Everyday => "Everyday",
});

label_enum!(SleepPattern {
    UnderSleeper => "Under-sleeper",
    Normal => "Normal",
    OverSleeper => "Over-sleeper",
});

label_enum!(CorrelationStrength {
    Strong => "Strong",
    Moderate => "Moderate",
    Weak => "Weak",
    VeryWeak => "Very Weak",
    Undefined => "Undefined",
});

/// Mean daily steps to activity level.
pub fn activity_classifier(config: &SegmentationConfig) -> Classifier<ActivityLevel> {
    let [sedentary, low, somewhat, active] = config.activity_step_cutoffs;
    Classifier::new(
        vec![
            (Bound::Below(sedentary), ActivityLevel::Sedentary),
            (Bound::Below(low), ActivityLevel::LowActive),
            (Bound::Below(somewhat), ActivityLevel::SomewhatActive),
            (Bound::Below(active), ActivityLevel::Active),
        ],
        ActivityLevel::HighlyActive,
    )
}

/// Distinct tracked days to engagement level.
pub fn engagement_classifier(config: &EngagementConfig) -> Classifier<EngagementLevel> {
    Classifier::new(
        vec![
            (
                Bound::AtLeast(f64::from(config.everyday_days)),
                EngagementLevel::Everyday,
            ),
            (
                Bound::AtLeast(f64::from(config.heavy_days)),
                EngagementLevel::Heavy,
            ),
            (
                Bound::AtLeast(f64::from(config.moderate_days)),
                EngagementLevel::Moderate,
            ),
        ],
        EngagementLevel::Light,
    )
}

/// Mean nightly sleep hours to sleep pattern.
pub fn sleep_classifier(config: &SegmentationConfig) -> Classifier<SleepPattern> {
    Classifier::new(
        vec![
            (Bound::Below(config.under_sleep_hours), SleepPattern::UnderSleeper),
            (Bound::AtMost(config.over_sleep_hours), SleepPattern::Normal),
        ],
        SleepPattern::OverSleeper,
    )
}

/// Labels |r|; NaN is [`CorrelationStrength::Undefined`].
#[derive(Debug, Clone, PartialEq)]
pub struct StrengthClassifier {
    inner: Classifier<CorrelationStrength>,
}

impl StrengthClassifier {
    pub fn new(config: &CorrelationConfig) -> Self {
        Self {
            inner: Classifier::new(
                vec![
                    (Bound::AtLeast(config.strong), CorrelationStrength::Strong),
                    (Bound::AtLeast(config.moderate), CorrelationStrength::Moderate),
                    (Bound::AtLeast(config.weak), CorrelationStrength::Weak),
                ],
                CorrelationStrength::VeryWeak,
            ),
        }
    }

    pub fn classify(&self, r: f64) -> CorrelationStrength {
        if r.is_nan() {
            CorrelationStrength::Undefined
        } else {
            self.inner.classify(r.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn engagement_boundaries() {
        let classifier = engagement_classifier(&EngagementConfig::default());
        let cases = [
            (25, EngagementLevel::Everyday),
            (24, EngagementLevel::Heavy),
            (22, EngagementLevel::Heavy),
            (21, EngagementLevel::Heavy),
            (20, EngagementLevel::Moderate),
            (11, EngagementLevel::Moderate),
            (10, EngagementLevel::Light),
            (1, EngagementLevel::Light),
        ];
        for (days, expected) in cases {
            assert_eq!(classifier.classify(f64::from(days)), expected, "{days} days");
        }
    }

    #[test]
    fn activity_boundaries_are_lower_inclusive() {
        let classifier = activity_classifier(&SegmentationConfig::default());
        assert_eq!(classifier.classify(4999.9), ActivityLevel::Sedentary);
        assert_eq!(classifier.classify(5000.0), ActivityLevel::LowActive);
        assert_eq!(classifier.classify(7500.0), ActivityLevel::SomewhatActive);
        assert_eq!(classifier.classify(10000.0), ActivityLevel::Active);
        assert_eq!(classifier.classify(12499.0), ActivityLevel::Active);
        assert_eq!(classifier.classify(12500.0), ActivityLevel::HighlyActive);
    }

    #[test]
    fn sleep_pattern_boundaries() {
        let classifier = sleep_classifier(&SegmentationConfig::default());
        assert_eq!(classifier.classify(5.9), SleepPattern::UnderSleeper);
        assert_eq!(classifier.classify(6.0), SleepPattern::Normal);
        assert_eq!(classifier.classify(8.0), SleepPattern::Normal);
        assert_eq!(classifier.classify(8.01), SleepPattern::OverSleeper);
    }

    #[test]
    fn strength_labels() {
        let classifier = StrengthClassifier::new(&CorrelationConfig::default());
        assert_eq!(classifier.classify(0.7), CorrelationStrength::Strong);
        assert_eq!(classifier.classify(-0.45), CorrelationStrength::Moderate);
        assert_eq!(classifier.classify(0.2), CorrelationStrength::Weak);
        assert_eq!(classifier.classify(0.19), CorrelationStrength::VeryWeak);
        assert_eq!(classifier.classify(f64::NAN), CorrelationStrength::Undefined);
        assert_eq!(CorrelationStrength::VeryWeak.to_string(), "Very Weak");
    }

    proptest! {
        #[test]
        fn engagement_is_a_total_partition(days in 1u32..=62) {
            let level = engagement_classifier(&EngagementConfig::default()).classify(f64::from(days));
            let expected = if days >= 25 {
                EngagementLevel::Everyday
            } else if days >= 21 {
                EngagementLevel::Heavy
            } else if days >= 11 {
                EngagementLevel::Moderate
            } else {
                EngagementLevel::Light
            };
            prop_assert_eq!(level, expected);
        }
    }
}
