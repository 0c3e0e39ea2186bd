//! Crossing Assist
//!
//! Frame-by-frame pedestrian crossing safety: tracked objects are reduced to
//! kinematic features, folded into a scene feature vector, classified, and
//! turned into debounced "Move"/"Stop" alerts.

pub mod collaborators;
pub mod config;
pub mod logging;
pub mod overlay;
pub mod replay;
pub mod session;

pub use collaborators::{
    filter_detections, CollaboratorError, Detection, Detector, JsonLinesRenderer, Renderer, Track,
    Tracker,
};
pub use config::{AppConfig, ConfigError, LogFormat};
pub use logging::init_logging;
pub use overlay::{plan_overlay, scene_reason, OverlayItem, OverlayPlan};
pub use replay::{ReplayFrame, SourceError, TrackReplay};
pub use session::{FrameOutcome, SafetySession, SessionStats};

use alerting::{AlertSink, AudioConfig, CommandSink, LogSink};
use inference_engine::{InferenceError, OnnxClassifier, RuleClassifier, SceneClassifier};

/// Pick the configured scene classifier
pub fn build_classifier(
    config: &config::ClassifierConfig,
) -> Result<Box<dyn SceneClassifier>, InferenceError> {
    match &config.model_path {
        Some(path) => Ok(Box::new(OnnxClassifier::load(path)?)),
        None => {
            tracing::info!("No classifier model configured, using rule classifier");
            Ok(Box::new(RuleClassifier::new(config.rules.clone())))
        }
    }
}

/// Voice sink when audio is enabled, log sink otherwise
pub fn build_sink(config: &AudioConfig) -> Box<dyn AlertSink> {
    if config.enabled {
        Box::new(CommandSink::new(config.clone()))
    } else {
        Box::new(LogSink)
    }
}
