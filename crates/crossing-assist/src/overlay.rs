//! Overlay planning
//!
//! Turns a frame's object summaries into validated boxes and labels for the
//! renderer. Nothing here feeds back into the analysis.

use feature_engine::{FrameFeatureVector, ObjectSummary};
use inference_engine::SceneLabel;
use serde::Serialize;
use tracing::warn;
use zones::{BBox, Zone, ZoneMap, ZoneName};

/// Boxes wider or taller than this share of the frame are treated as detector noise
const MAX_BOX_FRACTION: f64 = 0.8;

/// Overlay color roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayColor {
    Green,
    Yellow,
    Gray,
    Red,
}

/// One labelled box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayItem {
    pub id: u64,
    /// Box clamped to the frame
    pub bbox: BBox,
    pub label: String,
    pub color: OverlayColor,
}

/// Everything the renderer needs for one frame
#[derive(Debug, Clone, Serialize)]
pub struct OverlayPlan {
    pub frame: u64,
    pub zones: Vec<(ZoneName, Zone)>,
    pub items: Vec<OverlayItem>,
    pub safe: bool,
    pub banner: &'static str,
    pub banner_color: OverlayColor,
    /// Shown under the banner
    pub reason: String,
}

impl OverlayPlan {
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }
}

/// COCO display name for the detector classes we keep
pub fn class_name(class_id: i64) -> &'static str {
    match class_id {
        0 => "person",
        2 => "car",
        3 => "motorcycle",
        5 => "bus",
        7 => "truck",
        _ => "object",
    }
}

/// One-line explanation of a frame's label
pub fn scene_reason(features: &FrameFeatureVector, classifier_failed: bool) -> String {
    if classifier_failed {
        "classifier fault".to_string()
    } else if features.num_in_crossing_zone > 0 {
        format!("{} vehicle(s) in crossing", features.num_in_crossing_zone)
    } else if features.num_entering_crossing_zone > 0 {
        format!(
            "{} vehicle(s) approaching, avg TTC {:.1}",
            features.num_entering_crossing_zone, features.avg_time_to_collision
        )
    } else {
        "no vehicles approaching".to_string()
    }
}

/// Build the overlay for one frame, skipping implausible boxes
pub fn plan_overlay(
    frame: u64,
    width: i64,
    height: i64,
    zones: &ZoneMap,
    objects: &[ObjectSummary],
    label: SceneLabel,
) -> OverlayPlan {
    let items = objects
        .iter()
        .filter_map(|object| overlay_item(width, height, object))
        .collect();

    let safe = label.is_safe();
    OverlayPlan {
        frame,
        zones: zones.iter().map(|(name, zone)| (name, *zone)).collect(),
        items,
        safe,
        banner: if safe { "SAFE TO CROSS" } else { "UNSAFE TO CROSS" },
        banner_color: if safe {
            OverlayColor::Green
        } else {
            OverlayColor::Red
        },
        reason: String::new(),
    }
}

fn overlay_item(width: i64, height: i64, object: &ObjectSummary) -> Option<OverlayItem> {
    let max_x = (width - 1).max(0) as f64;
    let max_y = (height - 1).max(0) as f64;
    let bbox = BBox::new(
        object.bbox.x1.clamp(0.0, max_x).trunc(),
        object.bbox.y1.clamp(0.0, max_y).trunc(),
        object.bbox.x2.clamp(0.0, max_x).trunc(),
        object.bbox.y2.clamp(0.0, max_y).trunc(),
    );

    let (w, h) = (bbox.width(), bbox.height());
    if w <= 0.0
        || h <= 0.0
        || w > MAX_BOX_FRACTION * width as f64
        || h > MAX_BOX_FRACTION * height as f64
    {
        warn!(
            "Skipping suspicious box in overlay: {}x{} at [{}, {}, {}, {}]",
            w, h, bbox.x1, bbox.y1, bbox.x2, bbox.y2
        );
        return None;
    }

    let mut parts = vec![
        format!("ID {}", object.id),
        class_name(object.class_id).to_string(),
        object.direction.as_str().to_uppercase(),
    ];
    let mut color = OverlayColor::Green;

    if object.in_crossing() {
        parts.push("CROSSING".to_string());
        color = OverlayColor::Yellow;
    }
    if object.stationary {
        parts.push("STILL".to_string());
        color = OverlayColor::Gray;
    }

    Some(OverlayItem {
        id: object.id,
        bbox,
        label: parts.join(" "),
        color,
    })
}
