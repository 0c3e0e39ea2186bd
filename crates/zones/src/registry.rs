//! Named zone layout

use crate::geometry::BBox;
use serde::{Deserialize, Serialize};

/// Left strip width (percent of frame width); the right strip mirrors it
const SIDE_STRIP_PCT: i64 = 20;
/// Top edge of the crossing area (percent of frame height)
const CROSSING_TOP_PCT: i64 = 40;

/// Zone identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ZoneName {
    /// Near-field area the pedestrian walks through
    Crossing,
    /// Left vertical strip
    Left,
    /// Right vertical strip
    Right,
    /// Band above the crossing, far from the camera
    CenterDistant,
}

impl ZoneName {
    /// All zone names in registry order
    pub const ALL: [ZoneName; 4] = [
        ZoneName::Crossing,
        ZoneName::Left,
        ZoneName::Right,
        ZoneName::CenterDistant,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneName::Crossing => "CROSSING",
            ZoneName::Left => "LEFT",
            ZoneName::Right => "RIGHT",
            ZoneName::CenterDistant => "CENTER_DISTANT",
        }
    }
}

impl std::fmt::Display for ZoneName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Axis-aligned zone rectangle in integer frame pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Zone {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl Zone {
    pub fn new(x1: i64, y1: i64, x2: i64, y2: i64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Center point of the zone
    pub fn center(&self) -> (f64, f64) {
        (
            (self.x1 + self.x2) as f64 / 2.0,
            (self.y1 + self.y2) as f64 / 2.0,
        )
    }

    /// Zone as a floating-point box
    pub fn as_bbox(&self) -> BBox {
        BBox::new(self.x1 as f64, self.y1 as f64, self.x2 as f64, self.y2 as f64)
    }

    /// Check whether a box touches or overlaps this zone
    pub fn intersects(&self, bbox: &BBox) -> bool {
        bbox.intersects(&self.as_bbox())
    }
}

/// The four named zones for one frame size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMap {
    pub crossing: Zone,
    pub left: Zone,
    pub right: Zone,
    pub center_distant: Zone,
}

impl ZoneMap {
    /// Look up a zone by name
    pub fn get(&self, name: ZoneName) -> &Zone {
        match name {
            ZoneName::Crossing => &self.crossing,
            ZoneName::Left => &self.left,
            ZoneName::Right => &self.right,
            ZoneName::CenterDistant => &self.center_distant,
        }
    }

    /// Iterate zones in registry order (CROSSING, LEFT, RIGHT, CENTER_DISTANT)
    pub fn iter(&self) -> impl Iterator<Item = (ZoneName, &Zone)> + '_ {
        ZoneName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }
}

/// Compute the zone layout for a frame.
///
/// Fractions truncate toward zero. Non-positive dimensions produce
/// degenerate zones; validating them is up to the caller.
pub fn define_zones(width: i64, height: i64) -> ZoneMap {
    let left_edge = width * SIDE_STRIP_PCT / 100;
    let right_edge = width * (100 - SIDE_STRIP_PCT) / 100;
    let crossing_top = height * CROSSING_TOP_PCT / 100;

    ZoneMap {
        crossing: Zone::new(left_edge, crossing_top, right_edge, height),
        left: Zone::new(0, 0, left_edge, height),
        right: Zone::new(right_edge, 0, width, height),
        center_distant: Zone::new(left_edge, 0, right_edge, crossing_top),
    }
}

/// Every zone the box intersects, in registry order
pub fn zones_overlapping(bbox: &BBox, zones: &ZoneMap) -> Vec<ZoneName> {
    zones
        .iter()
        .filter(|(_, zone)| zone.intersects(bbox))
        .map(|(name, _)| name)
        .collect()
}
