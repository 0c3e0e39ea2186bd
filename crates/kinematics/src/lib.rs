//! Object Kinematics Tracker
//!
//! Maintains a bounded center-point history per tracked identity and derives:
//! - Speed and coarse direction over the retained window
//! - Time-to-collision and approach tests against a zone
//! - Per-track feature records (heading angle, zone overlap, stationary flag)
//! - Stale identity eviction

mod config;
mod tracker;

pub use config::TrackerConfig;
pub use tracker::{Direction, KinematicsTracker, TrackFeatures};

/// Speed below this is treated as no motion when estimating time-to-collision
pub const MIN_MOTION: f64 = 1e-5;

/// Speed below this marks a track as stationary
pub const STATIONARY_SPEED: f64 = 1.0;
