//! Scene Classification
//!
//! Labels a frame's feature vector as safe or unsafe to cross:
//! - ONNX classifier using tract
//! - Rule-based fallback when no model is configured
//! - Fail-safe wrapper that turns any classifier fault into "unsafe"

mod engine;
mod failsafe;
mod rules;

pub use engine::OnnxClassifier;
pub use failsafe::{Classification, FailSafeClassifier};
pub use rules::{RuleClassifier, RuleConfig};

use feature_engine::FrameFeatureVector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model load failed: {0}")]
    ModelLoadError(String),
    #[error("Inference failed: {0}")]
    InferenceFailed(String),
}

/// Binary scene label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SceneLabel {
    Safe,
    Unsafe,
}

impl SceneLabel {
    /// Interpret a raw model label: 0 is safe, anything else is unsafe
    pub fn from_raw(raw: i64) -> Self {
        if raw == 0 {
            SceneLabel::Safe
        } else {
            SceneLabel::Unsafe
        }
    }

    pub fn is_safe(&self) -> bool {
        matches!(self, SceneLabel::Safe)
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            SceneLabel::Safe => "safe",
            SceneLabel::Unsafe => "unsafe",
        }
    }
}

/// Anything that can label a frame feature vector
pub trait SceneClassifier {
    /// Classify one frame
    fn classify(&self, features: &FrameFeatureVector) -> Result<SceneLabel, InferenceError>;

    /// Short name for logs
    fn name(&self) -> &str;
}

impl<C: SceneClassifier + ?Sized> SceneClassifier for Box<C> {
    fn classify(&self, features: &FrameFeatureVector) -> Result<SceneLabel, InferenceError> {
        (**self).classify(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_labels() {
        assert_eq!(SceneLabel::from_raw(0), SceneLabel::Safe);
        assert_eq!(SceneLabel::from_raw(1), SceneLabel::Unsafe);
        assert_eq!(SceneLabel::from_raw(-3), SceneLabel::Unsafe);
        assert!(SceneLabel::Safe.is_safe());
    }

    #[test]
    fn test_error_messages() {
        let load = InferenceError::ModelLoadError("missing.onnx".to_string());
        let run = InferenceError::InferenceFailed("bad output".to_string());
        assert_eq!(load.to_string(), "Model load failed: missing.onnx");
        assert_eq!(run.to_string(), "Inference failed: bad output");
    }
}
