//! Tracker configuration

use serde::{Deserialize, Serialize};

/// Kinematics tracker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Center points retained per identity
    pub max_history: usize,

    /// Forget identities not updated for this many frames (0 = never)
    pub stale_after_frames: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            max_history: 5,
            stale_after_frames: 30,
        }
    }
}

impl TrackerConfig {
    /// Configuration that never evicts identities
    pub fn unbounded() -> Self {
        Self {
            stale_after_frames: 0,
            ..Default::default()
        }
    }
}
