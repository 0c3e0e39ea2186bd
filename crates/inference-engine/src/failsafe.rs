//! Fail-safe classification wrapper

use crate::{SceneClassifier, SceneLabel};
use feature_engine::FrameFeatureVector;
use tracing::error;

/// Outcome of a fail-safe classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub label: SceneLabel,
    /// Whether the inner classifier failed and the unsafe default was used
    pub used_fallback: bool,
}

/// Wraps a classifier so that any failure labels the frame unsafe
pub struct FailSafeClassifier<C> {
    inner: C,
    /// Number of failed classifications
    failures: u64,
}

impl<C: SceneClassifier> FailSafeClassifier<C> {
    pub fn new(inner: C) -> Self {
        Self { inner, failures: 0 }
    }

    /// Classify, defaulting to [`SceneLabel::Unsafe`] on error
    pub fn classify(&mut self, features: &FrameFeatureVector) -> Classification {
        match self.inner.classify(features) {
            Ok(label) => Classification {
                label,
                used_fallback: false,
            },
            Err(e) => {
                self.failures += 1;
                error!("Classifier '{}' failed: {}", self.inner.name(), e);
                Classification {
                    label: SceneLabel::Unsafe,
                    used_fallback: true,
                }
            }
        }
    }

    /// Number of failed classifications so far
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}
