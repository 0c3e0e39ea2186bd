//! Rule-Based Classifier
//!
//! Threshold heuristics used when no trained model is available.

use crate::{InferenceError, SceneClassifier, SceneLabel};
use feature_engine::FrameFeatureVector;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Thresholds for the rule classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Average time-to-collision below which the scene is unsafe
    pub ttc_threshold: f64,
    /// Vehicles inside the crossing tolerated before the scene is unsafe
    pub max_vehicles_in_crossing: u32,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            ttc_threshold: 3.0,
            max_vehicles_in_crossing: 0,
        }
    }
}

/// Rule-based scene classifier
#[derive(Debug, Clone, Default)]
pub struct RuleClassifier {
    config: RuleConfig,
}

impl RuleClassifier {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }
}

impl SceneClassifier for RuleClassifier {
    fn classify(&self, features: &FrameFeatureVector) -> Result<SceneLabel, InferenceError> {
        let ttc = features.avg_time_to_collision;
        if !ttc.is_finite() {
            return Err(InferenceError::InferenceFailed(format!(
                "non-finite time-to-collision {}",
                ttc
            )));
        }

        let occupied = features.num_in_crossing_zone > self.config.max_vehicles_in_crossing;
        let imminent = features.num_entering_crossing_zone > 0 && ttc < self.config.ttc_threshold;
        trace!("Rule classifier: occupied={}, imminent={}", occupied, imminent);

        Ok(if occupied || imminent {
            SceneLabel::Unsafe
        } else {
            SceneLabel::Safe
        })
    }

    fn name(&self) -> &str {
        "rules"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_scene_is_safe() {
        let classifier = RuleClassifier::default();
        let label = classifier.classify(&FrameFeatureVector::default()).unwrap();
        assert_eq!(label, SceneLabel::Safe);
    }

    #[test]
    fn test_vehicle_in_crossing_is_unsafe() {
        let classifier = RuleClassifier::default();
        let features = FrameFeatureVector {
            num_vehicles: 1,
            num_in_crossing_zone: 1,
            ..Default::default()
        };
        assert_eq!(classifier.classify(&features).unwrap(), SceneLabel::Unsafe);
    }

    #[test]
    fn test_approaching_vehicle() {
        let classifier = RuleClassifier::default();
        let near = FrameFeatureVector {
            num_vehicles: 1,
            num_entering_crossing_zone: 1,
            avg_vehicle_speed: 40.0,
            avg_time_to_collision: 1.5,
            ..Default::default()
        };
        assert_eq!(classifier.classify(&near).unwrap(), SceneLabel::Unsafe);

        let far = FrameFeatureVector {
            avg_time_to_collision: 12.0,
            ..near
        };
        assert_eq!(classifier.classify(&far).unwrap(), SceneLabel::Safe);
    }

    #[test]
    fn test_nan_input_is_error() {
        let classifier = RuleClassifier::default();
        let features = FrameFeatureVector {
            avg_time_to_collision: f64::NAN,
            ..Default::default()
        };
        assert!(classifier.classify(&features).is_err());
    }
}
