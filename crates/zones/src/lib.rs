//! Zone Registry
//!
//! Static rectangular regions of interest defined relative to the frame size,
//! plus the rectangle geometry shared by the tracking layer:
//! - Zone layout (CROSSING, LEFT, RIGHT, CENTER_DISTANT)
//! - Containment / overlap queries
//! - Intersection-over-union

mod geometry;
mod registry;

pub use geometry::{iou, BBox};
pub use registry::{define_zones, zones_overlapping, Zone, ZoneMap, ZoneName};
