//! Application configuration
//!
//! Layered: built-in defaults, then an optional config file, then
//! `CROSSING__SECTION__KEY` environment variables.

use alerting::{AlertConfig, AudioConfig};
use inference_engine::RuleConfig;
use kinematics::TrackerConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Scene classifier selection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// ONNX model; the rule classifier is used when unset
    pub model_path: Option<PathBuf>,
    pub rules: RuleConfig,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".to_string(),
        }
    }
}

/// Frame source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Frames buffered between the reader and the processing loop
    pub channel_capacity: usize,
    /// Frame rate used to timestamp frames that carry no timestamp
    pub fps: f64,
}

impl SourceConfig {
    /// Time between frames that carry no timestamp
    pub fn frame_period(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(1.0 / self.fps).map_err(|_| {
            ConfigError::Invalid(format!(
                "source.fps {} gives no representable frame period",
                self.fps
            ))
        })
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 64,
            fps: 30.0,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tracker: TrackerConfig,
    pub alert: AlertConfig,
    pub classifier: ClassifierConfig,
    pub audio: AudioConfig,
    pub logging: LoggingConfig,
    pub source: SourceConfig,
}

impl AppConfig {
    /// Load defaults, the optional file, then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path));
        }

        let settings = builder
            .add_source(
                ::config::Environment::with_prefix("CROSSING")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        info!("Configuration loaded: {:?}", config);
        Ok(config)
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracker.max_history < 2 {
            return Err(ConfigError::Invalid(format!(
                "tracker.max_history must be at least 2, got {}",
                self.tracker.max_history
            )));
        }
        if !self.alert.cooldown_secs.is_finite() || self.alert.cooldown_secs < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "alert.cooldown_secs must be a non-negative number, got {}",
                self.alert.cooldown_secs
            )));
        }
        if !self.classifier.rules.ttc_threshold.is_finite() {
            return Err(ConfigError::Invalid(
                "classifier.rules.ttc_threshold must be finite".to_string(),
            ));
        }
        if self.source.channel_capacity == 0 {
            return Err(ConfigError::Invalid(
                "source.channel_capacity must be positive".to_string(),
            ));
        }
        if !self.source.fps.is_finite() || self.source.fps <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "source.fps must be positive, got {}",
                self.source.fps
            )));
        }
        self.source.frame_period()?;
        Ok(())
    }
}
