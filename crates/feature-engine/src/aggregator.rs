//! Frame Feature Aggregation

use crate::features::{FrameFeatureVector, NO_COLLISION_SENTINEL};
use kinematics::{Direction, KinematicsTracker};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tracing::{debug, trace};
use zones::{zones_overlapping, BBox, ZoneMap, ZoneName};

/// Detector class id for people
pub const PEDESTRIAN_CLASS_ID: i64 = 0;

/// Detector class ids counted as vehicles (car, motorcycle, bus, truck)
pub const VEHICLE_CLASS_IDS: [i64; 4] = [2, 3, 5, 7];

/// Vehicles outside the crossing faster than this count as entering it
pub const ENTERING_SPEED: f64 = 1.0;

/// Object class as used by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Vehicle,
    Pedestrian,
    Other,
}

impl ObjectClass {
    /// Map a detector class id
    pub fn from_class_id(class_id: i64) -> Self {
        if class_id == PEDESTRIAN_CLASS_ID {
            ObjectClass::Pedestrian
        } else if VEHICLE_CLASS_IDS.contains(&class_id) {
            ObjectClass::Vehicle
        } else {
            ObjectClass::Other
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectClass::Vehicle => "vehicle",
            ObjectClass::Pedestrian => "pedestrian",
            ObjectClass::Other => "other",
        }
    }
}

/// 90° heading sector of a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeadingSector {
    Left,
    Right,
    Up,
    Down,
}

impl HeadingSector {
    /// Bucket a heading angle in degrees as produced by `atan2`.
    ///
    /// Left is (135, 225], right is anything at or below 45 or above 315,
    /// up is (45, 135] and down is (225, 315].
    pub fn from_angle(angle: f64) -> Self {
        if angle > 135.0 && angle <= 225.0 {
            HeadingSector::Left
        } else if angle <= 45.0 || angle > 315.0 {
            HeadingSector::Right
        } else if angle <= 135.0 {
            HeadingSector::Up
        } else {
            HeadingSector::Down
        }
    }
}

/// A confirmed track as reported by the upstream tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedObject<K = u64> {
    pub id: K,
    pub class_id: i64,
    pub bbox: BBox,
}

/// Per-object results computed while aggregating a frame
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSummary<K = u64> {
    pub id: K,
    pub class: ObjectClass,
    pub class_id: i64,
    pub bbox: BBox,
    pub speed: f64,
    pub direction: Direction,
    /// Heading angle in degrees, once two points are known
    pub heading: Option<f64>,
    pub zones: Vec<ZoneName>,
    pub stationary: bool,
    /// Estimated frames until the CROSSING center is reached
    pub time_to_crossing: Option<f64>,
}

impl<K> ObjectSummary<K> {
    pub fn in_crossing(&self) -> bool {
        self.zones.contains(&ZoneName::Crossing)
    }
}

/// Feature vector plus the object summaries it was built from
#[derive(Debug, Clone)]
pub struct FrameAggregate<K = u64> {
    pub features: FrameFeatureVector,
    pub objects: Vec<ObjectSummary<K>>,
}

/// Folds the tracked objects of one frame into a [`FrameFeatureVector`]
#[derive(Debug, Default)]
pub struct FrameFeatureAggregator {
    /// Frames aggregated so far
    frames: u64,
}

impl FrameFeatureAggregator {
    /// Create a new aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Update kinematics for every object and reduce the frame to one feature vector
    pub fn aggregate<K>(
        &mut self,
        objects: &[TrackedObject<K>],
        zones: &ZoneMap,
        tracker: &mut KinematicsTracker<K>,
    ) -> FrameAggregate<K>
    where
        K: Eq + Hash + Clone + std::fmt::Debug,
    {
        self.frames += 1;

        let mut features = FrameFeatureVector::default();
        let mut total_speed = 0.0;
        let mut ttc_ratios = Vec::new();
        let mut summaries = Vec::with_capacity(objects.len());

        let (crossing_x, crossing_y) = zones.crossing.center();

        for object in objects {
            tracker.update(object.id.clone(), object.bbox);
            let (speed, direction) = tracker.speed_and_direction(&object.id);
            let track_features = tracker.features(&object.id, Some(zones));
            let heading = track_features.as_ref().map(|f| f.direction_angle);
            let zones_hit = zones_overlapping(&object.bbox, zones);
            let class = ObjectClass::from_class_id(object.class_id);

            match class {
                ObjectClass::Vehicle => {
                    features.num_vehicles += 1;
                    total_speed += speed;

                    if zones_hit.contains(&ZoneName::Crossing) {
                        features.num_in_crossing_zone += 1;
                    } else if speed > ENTERING_SPEED {
                        features.num_entering_crossing_zone += 1;
                    }

                    match heading.map(HeadingSector::from_angle) {
                        Some(HeadingSector::Left) => features.dir_left += 1,
                        Some(HeadingSector::Right) => features.dir_right += 1,
                        Some(HeadingSector::Up) => features.dir_up += 1,
                        Some(HeadingSector::Down) => features.dir_down += 1,
                        None => {}
                    }

                    if speed > 0.0 {
                        let (cx, cy) = object.bbox.center();
                        let distance = (cx - crossing_x).hypot(cy - crossing_y);
                        ttc_ratios.push(distance / speed);
                    }
                }
                ObjectClass::Pedestrian => features.num_pedestrians += 1,
                ObjectClass::Other => {
                    trace!("Ignoring class {} for track {:?}", object.class_id, object.id);
                }
            }

            summaries.push(ObjectSummary {
                id: object.id.clone(),
                class,
                class_id: object.class_id,
                bbox: object.bbox,
                speed,
                direction,
                heading,
                stationary: track_features.map_or(true, |f| f.is_stationary == 1),
                time_to_crossing: tracker.time_to_collision(&object.id, &zones.crossing),
                zones: zones_hit,
            });
        }

        if features.num_vehicles > 0 {
            features.avg_vehicle_speed = total_speed / features.num_vehicles as f64;
        }
        features.avg_time_to_collision = if ttc_ratios.is_empty() {
            NO_COLLISION_SENTINEL
        } else {
            ttc_ratios.iter().sum::<f64>() / ttc_ratios.len() as f64
        };

        debug!(
            "Frame {}: vehicles={}, pedestrians={}, in_crossing={}, entering={}, avg_ttc={:.2}",
            self.frames,
            features.num_vehicles,
            features.num_pedestrians,
            features.num_in_crossing_zone,
            features.num_entering_crossing_zone,
            features.avg_time_to_collision
        );

        FrameAggregate {
            features,
            objects: summaries,
        }
    }

    /// Number of frames aggregated
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
