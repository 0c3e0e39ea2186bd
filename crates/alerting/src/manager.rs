//! Alert State Machine Implementation

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Alert configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Repeat an unchanged alert once this many seconds have passed
    pub cooldown_secs: f64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self { cooldown_secs: 8.0 }
    }
}

impl AlertConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::try_from_secs_f64(self.cooldown_secs.max(0.0)).unwrap_or(Duration::MAX)
    }
}

/// Spoken/displayed alert token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLabel {
    /// Safe to cross
    Move,
    /// Unsafe to cross
    Stop,
}

impl AlertLabel {
    pub fn from_safe(is_safe: bool) -> Self {
        if is_safe {
            AlertLabel::Move
        } else {
            AlertLabel::Stop
        }
    }

    /// Token handed to sinks
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLabel::Move => "Move",
            AlertLabel::Stop => "Stop",
        }
    }
}

impl std::fmt::Display for AlertLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Debounces per-frame labels.
///
/// Emits when the label changes, or when the same label has not been
/// emitted for longer than the cooldown.
#[derive(Debug, Clone)]
pub struct AlertStateMachine {
    /// Repeat interval for an unchanged label
    cooldown: Duration,
    /// Last emitted label (None until the first emission)
    last_label: Option<AlertLabel>,
    /// Time of the last emission
    last_emission: Option<Instant>,
    /// Number of emissions
    emissions: u64,
}

impl AlertStateMachine {
    /// Create a new state machine
    pub fn new(config: AlertConfig) -> Self {
        info!("Creating alert state machine with cooldown {:?}", config.cooldown());
        Self {
            cooldown: config.cooldown(),
            last_label: None,
            last_emission: None,
            emissions: 0,
        }
    }

    /// Feed one frame's verdict observed at `now`; returns the label to emit, if any
    pub fn update(&mut self, is_safe: bool, now: Instant) -> Option<AlertLabel> {
        let label = AlertLabel::from_safe(is_safe);

        let changed = self.last_label != Some(label);
        let expired = self
            .last_emission
            .map_or(true, |last| now.saturating_duration_since(last) > self.cooldown);

        if !changed && !expired {
            return None;
        }

        debug!(
            "Emitting {} (changed={}, cooldown expired={})",
            label, changed, expired
        );
        self.last_label = Some(label);
        self.last_emission = Some(now);
        self.emissions += 1;
        Some(label)
    }

    /// Last emitted label
    pub fn current(&self) -> Option<AlertLabel> {
        self.last_label
    }

    pub fn last_emission(&self) -> Option<Instant> {
        self.last_emission
    }

    /// Number of emissions so far
    pub fn emissions(&self) -> u64 {
        self.emissions
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Return to the uninitialized state
    pub fn reset(&mut self) {
        self.last_label = None;
        self.last_emission = None;
    }
}

impl Default for AlertStateMachine {
    fn default() -> Self {
        Self::new(AlertConfig::default())
    }
}
