//! Rectangle geometry

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in frame pixels (`x1,y1` top-left, `x2,y2` bottom-right)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BBox {
    /// Create a box from its corners
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from top-left corner and size
    pub fn from_xywh(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self::new(x, y, x + w, y + h)
    }

    /// Center point `(cx, cy)`
    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// Signed area; negative for inverted boxes
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// Non-strict overlap test: touching edges count as intersecting
    pub fn intersects(&self, other: &BBox) -> bool {
        !(self.x2 < other.x1 || self.x1 > other.x2 || self.y2 < other.y1 || self.y1 > other.y2)
    }
}

impl From<[f64; 4]> for BBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BBox> for [f64; 4] {
    fn from(b: BBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

/// Intersection-over-union of two boxes.
///
/// Returns 0.0 when the union area is zero instead of dividing by it.
pub fn iou(a: &BBox, b: &BBox) -> f64 {
    let xa = a.x1.max(b.x1);
    let ya = a.y1.max(b.y1);
    let xb = a.x2.min(b.x2);
    let yb = a.y2.min(b.y2);

    let inter = (xb - xa).max(0.0) * (yb - ya).max(0.0);
    let union = a.area() + b.area() - inter;

    if union == 0.0 {
        return 0.0;
    }
    inter / union
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical() {
        let a = BBox::new(10.0, 10.0, 50.0, 40.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(iou(&a, &b), 0.0);
    }

    #[test]
    fn test_iou_zero_area() {
        let a = BBox::new(5.0, 5.0, 5.0, 5.0);
        assert_eq!(iou(&a, &a), 0.0);
    }

    #[test]
    fn test_iou_partial() {
        // 10x10 boxes sharing a 5x10 strip: 50 / 150
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(5.0, 0.0, 15.0, 10.0);
        assert!((iou(&a, &b) - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_touching_boxes_intersect() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BBox::new(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&BBox::new(10.5, 0.0, 20.0, 10.0)));
    }

    #[test]
    fn test_bbox_serde_as_array() {
        let b: BBox = serde_json::from_str("[1.0, 2.0, 3.0, 4.0]").unwrap();
        assert_eq!(b, BBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(b.center(), (2.0, 3.0));
    }
}
