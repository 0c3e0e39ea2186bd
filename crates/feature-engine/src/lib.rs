//! Feature Engineering Engine
//!
//! Reduces the tracked objects of one frame into the fixed-schema scene
//! feature vector consumed by the crossing-safety classifier.

mod aggregator;
mod features;

pub use aggregator::{
    FrameAggregate, FrameFeatureAggregator, HeadingSector, ObjectClass, ObjectSummary,
    TrackedObject, ENTERING_SPEED, PEDESTRIAN_CLASS_ID, VEHICLE_CLASS_IDS,
};
pub use features::{
    FrameFeatureVector, FEATURE_DIMENSION, FEATURE_NAMES, FEATURE_SCHEMA_VERSION,
    NO_COLLISION_SENTINEL,
};
