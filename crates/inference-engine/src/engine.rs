//! ONNX Classifier Implementation

use crate::{InferenceError, SceneClassifier, SceneLabel};
use feature_engine::{FrameFeatureVector, FEATURE_DIMENSION};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tract_onnx::prelude::*;

type OnnxPlan = TypedRunnableModel<TypedModel>;

/// Scene classifier backed by an ONNX model.
///
/// The model takes a `1 x 10` float tensor in feature order and returns the
/// predicted label as its first output.
pub struct OnnxClassifier {
    /// Model path
    model_path: PathBuf,
    /// Optimized execution plan
    plan: OnnxPlan,
}

impl OnnxClassifier {
    /// Load and optimize the ONNX model
    pub fn load(model_path: impl AsRef<Path>) -> Result<Self, InferenceError> {
        let model_path = model_path.as_ref().to_path_buf();
        info!("Loading scene classifier from {}", model_path.display());

        let plan = tract_onnx::onnx()
            .model_for_path(&model_path)
            .and_then(|model| {
                model.with_input_fact(0, f32::fact([1, FEATURE_DIMENSION]).into())
            })
            .and_then(|model| model.into_optimized())
            .and_then(|model| model.into_runnable())
            .map_err(|e| {
                InferenceError::ModelLoadError(format!("{}: {}", model_path.display(), e))
            })?;

        info!("Model loaded successfully");
        Ok(Self { model_path, plan })
    }

    /// Get model path
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn run(&self, features: &FrameFeatureVector) -> TractResult<i64> {
        let values: Vec<f32> = features.as_array().iter().map(|&v| v as f32).collect();
        let input: Tensor =
            tract_ndarray::Array2::from_shape_vec((1, FEATURE_DIMENSION), values)?.into();

        let outputs = self.plan.run(tvec!(input.into()))?;
        let label = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("model produced no outputs"))?
            .cast_to::<i64>()?;

        label
            .as_slice::<i64>()?
            .first()
            .copied()
            .ok_or_else(|| anyhow::anyhow!("empty label tensor"))
    }
}

impl SceneClassifier for OnnxClassifier {
    fn classify(&self, features: &FrameFeatureVector) -> Result<SceneLabel, InferenceError> {
        let start = std::time::Instant::now();
        let raw = self
            .run(features)
            .map_err(|e| InferenceError::InferenceFailed(e.to_string()))?;

        debug!(
            "Inference completed in {}us (raw label {})",
            start.elapsed().as_micros(),
            raw
        );
        Ok(SceneLabel::from_raw(raw))
    }

    fn name(&self) -> &str {
        "onnx"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_is_load_error() {
        let result = OnnxClassifier::load("/nonexistent/classifier.onnx");
        assert!(matches!(result, Err(InferenceError::ModelLoadError(_))));
    }
}
