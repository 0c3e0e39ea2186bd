//! Alert sinks

use crate::{AlertError, AlertLabel};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Receives emitted alerts.
///
/// Implementations must not block frame processing.
pub trait AlertSink {
    fn emit(&mut self, label: AlertLabel) -> Result<(), AlertError>;
}

/// Logs every alert
#[derive(Debug, Default)]
pub struct LogSink;

impl AlertSink for LogSink {
    fn emit(&mut self, label: AlertLabel) -> Result<(), AlertError> {
        info!(alert = label.as_str(), "Crossing alert");
        Ok(())
    }
}

/// Keeps emitted alerts in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub emitted: Vec<AlertLabel>,
}

impl AlertSink for RecordingSink {
    fn emit(&mut self, label: AlertLabel) -> Result<(), AlertError> {
        self.emitted.push(label);
        Ok(())
    }
}

/// Voice playback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Play voice alerts at all
    pub enabled: bool,
    /// Player executable
    pub player: String,
    /// Arguments placed before the clip path
    pub player_args: Vec<String>,
    /// Directory holding pre-rendered clips named `<token>.<extension>`
    pub cache_dir: PathBuf,
    /// Clip file extension
    pub extension: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            player: "ffplay".to_string(),
            player_args: vec![
                "-nodisp".to_string(),
                "-autoexit".to_string(),
                "-loglevel".to_string(),
                "quiet".to_string(),
            ],
            cache_dir: PathBuf::from("voice_cache"),
            extension: "wav".to_string(),
        }
    }
}

/// Plays cached voice clips with an external player.
///
/// Playback runs in the background; alerts arriving while a clip is still
/// playing are dropped.
pub struct CommandSink {
    config: AudioConfig,
    playing: Arc<AtomicBool>,
    started: u64,
}

impl CommandSink {
    pub fn new(config: AudioConfig) -> Self {
        info!(
            "Voice alerts via '{}' from {}",
            config.player,
            config.cache_dir.display()
        );
        Self {
            config,
            playing: Arc::new(AtomicBool::new(false)),
            started: 0,
        }
    }

    /// Cached clip location for a label
    pub fn clip_path(&self, label: AlertLabel) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{}.{}", label.as_str(), self.config.extension))
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Player processes started so far
    pub fn started(&self) -> u64 {
        self.started
    }
}

impl AlertSink for CommandSink {
    fn emit(&mut self, label: AlertLabel) -> Result<(), AlertError> {
        let clip = self.clip_path(label);
        if !clip.is_file() {
            return Err(AlertError::MissingClip(clip));
        }

        let handle = tokio::runtime::Handle::try_current().map_err(|_| AlertError::NoRuntime)?;

        if self.playing.swap(true, Ordering::AcqRel) {
            debug!("Dropping {} alert: playback in progress", label);
            return Ok(());
        }

        let spawned = tokio::process::Command::new(&self.config.player)
            .args(&self.config.player_args)
            .arg(&clip)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                self.playing.store(false, Ordering::Release);
                return Err(AlertError::Spawn(e));
            }
        };

        self.started += 1;
        let playing = Arc::clone(&self.playing);
        handle.spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => debug!("Played {}", label),
                Ok(status) => warn!("Audio player exited with {} for {}", status, label),
                Err(e) => warn!("Audio player failed for {}: {}", label, e),
            }
            playing.store(false, Ordering::Release);
        });

        Ok(())
    }
}
