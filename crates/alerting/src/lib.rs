//! Alerting System
//!
//! Debounces per-frame safety labels into stable "Move"/"Stop" alerts and
//! delivers them to voice or log sinks.

mod manager;
mod sink;

pub use manager::{AlertConfig, AlertLabel, AlertStateMachine};
pub use sink::{AlertSink, AudioConfig, CommandSink, LogSink, RecordingSink};

use std::path::PathBuf;
use thiserror::Error;

/// Errors while delivering an alert
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("No cached clip for alert at {0}")]
    MissingClip(PathBuf),

    #[error("Failed to start audio player: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Audio playback requires a running async runtime")]
    NoRuntime,
}
