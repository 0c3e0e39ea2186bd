//! Frame Feature Vector

use serde::{Deserialize, Serialize};

/// Number of features in the vector
pub const FEATURE_DIMENSION: usize = 10;

/// Layout version of [`FrameFeatureVector`]; bump when the field order changes
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

/// Average time-to-collision reported when no vehicle is moving
pub const NO_COLLISION_SENTINEL: f64 = 999.0;

/// Feature names in classifier column order
pub const FEATURE_NAMES: [&str; FEATURE_DIMENSION] = [
    "num_vehicles",
    "num_pedestrians",
    "num_in_crossing_zone",
    "num_entering_crossing_zone",
    "avg_vehicle_speed",
    "avg_time_to_collision",
    "dir_left",
    "dir_right",
    "dir_up",
    "dir_down",
];

/// Scene-level feature vector for one frame.
///
/// Field order is the column order the classifier was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameFeatureVector {
    pub num_vehicles: u32,
    pub num_pedestrians: u32,
    /// Vehicles overlapping the CROSSING zone
    pub num_in_crossing_zone: u32,
    /// Moving vehicles outside the CROSSING zone
    pub num_entering_crossing_zone: u32,
    pub avg_vehicle_speed: f64,
    /// Mean distance/speed ratio of moving vehicles, or [`NO_COLLISION_SENTINEL`]
    pub avg_time_to_collision: f64,
    pub dir_left: u32,
    pub dir_right: u32,
    pub dir_up: u32,
    pub dir_down: u32,
}

impl Default for FrameFeatureVector {
    fn default() -> Self {
        Self {
            num_vehicles: 0,
            num_pedestrians: 0,
            num_in_crossing_zone: 0,
            num_entering_crossing_zone: 0,
            avg_vehicle_speed: 0.0,
            avg_time_to_collision: NO_COLLISION_SENTINEL,
            dir_left: 0,
            dir_right: 0,
            dir_up: 0,
            dir_down: 0,
        }
    }
}

impl FrameFeatureVector {
    /// Raw values in [`FEATURE_NAMES`] order
    pub fn as_array(&self) -> [f64; FEATURE_DIMENSION] {
        [
            self.num_vehicles as f64,
            self.num_pedestrians as f64,
            self.num_in_crossing_zone as f64,
            self.num_entering_crossing_zone as f64,
            self.avg_vehicle_speed,
            self.avg_time_to_collision,
            self.dir_left as f64,
            self.dir_right as f64,
            self.dir_up as f64,
            self.dir_down as f64,
        ]
    }

    /// `(name, value)` pairs in column order
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> {
        FEATURE_NAMES.into_iter().zip(self.as_array())
    }
}
