//! Kinematics Tracker Implementation

use crate::{TrackerConfig, MIN_MOTION, STATIONARY_SPEED};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use tracing::{debug, trace};
use zones::{iou, BBox, Zone, ZoneMap};

/// Coarse direction of motion in image coordinates (y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
    #[default]
    Unknown,
}

impl Direction {
    /// Classify a displacement; the horizontal axis wins only when strictly larger
    pub fn from_displacement(dx: f64, dy: f64) -> Self {
        if dx.abs() > dy.abs() {
            if dx > 0.0 {
                Direction::Right
            } else {
                Direction::Left
            }
        } else if dy > 0.0 {
            Direction::Down
        } else {
            Direction::Up
        }
    }

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-track kinematic features over the history window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackFeatures {
    /// Displacement magnitude over the window (pixels)
    pub speed: f64,
    /// Heading in degrees, `atan2(dy, dx)`; 90.0 when `dx == 0`
    pub direction_angle: f64,
    pub dx: f64,
    pub dy: f64,
    /// 1 when speed < 1.0
    pub is_stationary: u8,
    /// Points currently retained
    pub time_visible: usize,
    /// Distance from the current center to the CROSSING center
    pub distance_to_crossing: f64,
    /// IoU of the last box with the CROSSING zone
    pub iou_crossing: f64,
    pub in_left_zone: u8,
    pub in_right_zone: u8,
}

/// State kept for one identity
#[derive(Debug, Clone)]
struct TrackState {
    /// Center points, oldest first
    history: VecDeque<(f64, f64)>,
    /// History length at first observation
    first_seen: usize,
    last_bbox: BBox,
    /// Frame index of the latest update
    last_frame: u64,
}

impl TrackState {
    /// Displacement from the oldest retained point to the newest
    fn displacement(&self) -> Option<(f64, f64)> {
        if self.history.len() < 2 {
            return None;
        }
        let (ox, oy) = *self.history.front()?;
        let (cx, cy) = *self.history.back()?;
        Some((cx - ox, cy - oy))
    }

    fn current(&self) -> Option<(f64, f64)> {
        self.history.back().copied()
    }
}

/// Tracks motion history for every identity reported by the upstream tracker
pub struct KinematicsTracker<K = u64> {
    /// Points retained per identity
    max_history: usize,
    /// State by identity
    tracks: HashMap<K, TrackState>,
    /// Monotonic frame counter
    frame: u64,
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> KinematicsTracker<K> {
    /// Create a tracker from configuration
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_max_history(config.max_history)
    }

    /// Create a tracker retaining `max_history` points per identity (at least one)
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            max_history: max_history.max(1),
            tracks: HashMap::new(),
            frame: 0,
        }
    }

    /// Advance the frame counter; updates after this call belong to the new frame
    pub fn begin_frame(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }

    /// Record a new observation for `id`
    pub fn update(&mut self, id: K, bbox: BBox) {
        let center = bbox.center();
        let frame = self.frame;
        let max_history = self.max_history;

        let state = self.tracks.entry(id.clone()).or_insert_with(|| {
            trace!("New identity {:?}", id);
            TrackState {
                history: VecDeque::with_capacity(max_history + 1),
                first_seen: 0,
                last_bbox: bbox,
                last_frame: frame,
            }
        });

        state.history.push_back(center);
        if state.history.len() > max_history {
            state.history.pop_front();
        }
        state.last_bbox = bbox;
        state.last_frame = frame;
        if state.first_seen == 0 {
            state.first_seen = state.history.len();
        }
    }

    /// Speed and coarse direction over the history window.
    ///
    /// `(0.0, Unknown)` until at least two points are known.
    pub fn speed_and_direction(&self, id: &K) -> (f64, Direction) {
        match self.tracks.get(id).and_then(TrackState::displacement) {
            Some((dx, dy)) => (dx.hypot(dy), Direction::from_displacement(dx, dy)),
            None => (0.0, Direction::Unknown),
        }
    }

    /// Linear estimate of how long until the track reaches the zone center,
    /// in frames, rounded to two decimals
    pub fn time_to_collision(&self, id: &K, zone: &Zone) -> Option<f64> {
        let state = self.tracks.get(id)?;
        let (dx, dy) = state.displacement()?;
        let speed = dx.hypot(dy);
        if speed < MIN_MOTION {
            return None;
        }

        let (cx, cy) = state.current()?;
        let (zx, zy) = zone.center();
        Some(round2((cx - zx).hypot(cy - zy) / speed))
    }

    /// Whether the window displacement has a positive component toward the zone center
    pub fn moving_toward(&self, id: &K, zone: &Zone) -> bool {
        let Some(state) = self.tracks.get(id) else {
            return false;
        };
        let (Some((dx, dy)), Some((cx, cy))) = (state.displacement(), state.current()) else {
            return false;
        };

        let (zx, zy) = zone.center();
        dx * (zx - cx) + dy * (zy - cy) > 0.0
    }

    /// Feature record for one identity.
    ///
    /// None for unknown identities, fewer than two points, or missing zones.
    pub fn features(&self, id: &K, zones: Option<&ZoneMap>) -> Option<TrackFeatures> {
        let state = self.tracks.get(id)?;
        let (dx, dy) = state.displacement()?;
        let (cx, cy) = state.current()?;
        let zones = zones?;

        let speed = dx.hypot(dy);
        let direction_angle = if dx != 0.0 {
            dy.atan2(dx).to_degrees()
        } else {
            90.0
        };

        let bbox = &state.last_bbox;
        let crossing = &zones.crossing;
        let (zx, zy) = crossing.center();

        Some(TrackFeatures {
            speed: round2(speed),
            direction_angle: round2(direction_angle),
            dx: round2(dx),
            dy: round2(dy),
            is_stationary: u8::from(speed < STATIONARY_SPEED),
            time_visible: state.history.len(),
            distance_to_crossing: round2((cx - zx).hypot(cy - zy)),
            iou_crossing: round2(iou(bbox, &crossing.as_bbox())),
            in_left_zone: u8::from(zones.left.intersects(bbox)),
            in_right_zone: u8::from(zones.right.intersects(bbox)),
        })
    }

    /// Forget identities not updated within the last `max_idle_frames` frames.
    ///
    /// Returns the number of identities removed.
    pub fn evict_stale(&mut self, max_idle_frames: u64) -> usize {
        let frame = self.frame;
        let before = self.tracks.len();
        self.tracks
            .retain(|_, state| frame.saturating_sub(state.last_frame) <= max_idle_frames);

        let evicted = before - self.tracks.len();
        if evicted > 0 {
            debug!("Evicted {} stale identities at frame {}", evicted, frame);
        }
        evicted
    }

    /// Retained center points for `id`, oldest first
    pub fn history(&self, id: &K) -> Option<Vec<(f64, f64)>> {
        self.tracks
            .get(id)
            .map(|state| state.history.iter().copied().collect())
    }

    /// Most recent box reported for `id`
    pub fn last_bbox(&self, id: &K) -> Option<BBox> {
        self.tracks.get(id).map(|state| state.last_bbox)
    }

    /// History length recorded at first observation
    pub fn first_seen(&self, id: &K) -> Option<usize> {
        self.tracks.get(id).map(|state| state.first_seen)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.tracks.contains_key(id)
    }

    /// Number of identities tracked
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Current frame index
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Drop all state
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.frame = 0;
    }
}

impl<K: Eq + Hash + Clone + std::fmt::Debug> Default for KinematicsTracker<K> {
    fn default() -> Self {
        Self::new(&TrackerConfig::default())
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use zones::define_zones;

    fn centered(cx: f64, cy: f64) -> BBox {
        BBox::new(cx - 10.0, cy - 10.0, cx + 10.0, cy + 10.0)
    }

    #[test]
    fn test_unknown_until_two_points() {
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        assert_eq!(tracker.speed_and_direction(&1), (0.0, Direction::Unknown));

        tracker.update(1, centered(100.0, 100.0));
        assert_eq!(tracker.speed_and_direction(&1), (0.0, Direction::Unknown));
        assert!(tracker.time_to_collision(&1, &Zone::new(0, 0, 10, 10)).is_none());
        assert!(!tracker.moving_toward(&1, &Zone::new(0, 0, 10, 10)));
    }

    #[test]
    fn test_speed_over_full_window() {
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        for x in [400.0, 420.0, 440.0, 460.0, 480.0, 500.0] {
            tracker.update(7, centered(x, 500.0));
        }

        // Oldest retained point is (420, 500) after eviction
        let (speed, direction) = tracker.speed_and_direction(&7);
        assert!((speed - 80.0).abs() < 1e-9);
        assert_eq!(direction, Direction::Right);
    }

    #[test]
    fn test_direction_ties_go_vertical() {
        assert_eq!(Direction::from_displacement(5.0, 5.0), Direction::Down);
        assert_eq!(Direction::from_displacement(-5.0, -5.0), Direction::Up);
        assert_eq!(Direction::from_displacement(-6.0, 5.0), Direction::Left);
        assert_eq!(Direction::from_displacement(0.0, 0.0), Direction::Up);
    }

    #[test]
    fn test_time_to_collision() {
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        let zone = Zone::new(290, 90, 310, 110); // center (300, 100)
        tracker.update(1, centered(100.0, 100.0));
        tracker.update(1, centered(130.0, 100.0));

        // 170 px left at 30 px per window
        assert_eq!(tracker.time_to_collision(&1, &zone), Some(5.67));
        assert!(tracker.moving_toward(&1, &zone));

        let behind = Zone::new(0, 90, 20, 110);
        assert!(!tracker.moving_toward(&1, &behind));
    }

    #[test]
    fn test_time_to_collision_half_rounds_to_even() {
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        let zone = Zone::new(490, 90, 510, 110); // center (500, 100)
        tracker.update(1, centered(410.0, 100.0));
        tracker.update(1, centered(490.0, 100.0));

        // 10 px at 80 px per window is exactly 0.125
        assert_eq!(tracker.time_to_collision(&1, &zone), Some(0.12));
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_time_to_collision_stationary() {
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        tracker.update(1, centered(100.0, 100.0));
        tracker.update(1, centered(100.0, 100.0));
        assert!(tracker.time_to_collision(&1, &Zone::new(0, 0, 10, 10)).is_none());
    }

    #[test]
    fn test_features_moving_right() {
        let zones = define_zones(1000, 800);
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        for x in [400.0, 420.0, 440.0, 460.0, 480.0, 500.0] {
            tracker.update(3, centered(x, 500.0));
        }

        let features = tracker.features(&3, Some(&zones)).unwrap();
        assert_eq!(features.speed, 80.0);
        assert_eq!(features.direction_angle, 0.0);
        assert_eq!(features.dx, 80.0);
        assert_eq!(features.dy, 0.0);
        assert_eq!(features.is_stationary, 0);
        assert_eq!(features.time_visible, 5);
        // Crossing center is (500, 560)
        assert_eq!(features.distance_to_crossing, 60.0);
        assert!(features.iou_crossing > 0.0);
        assert_eq!(features.in_left_zone, 0);
        assert_eq!(features.in_right_zone, 0);
    }

    #[test]
    fn test_features_vertical_motion_angle() {
        let zones = define_zones(1000, 800);
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        tracker.update(1, centered(100.0, 100.0));
        tracker.update(1, centered(100.0, 60.0));

        let features = tracker.features(&1, Some(&zones)).unwrap();
        assert_eq!(features.direction_angle, 90.0);
        assert_eq!(features.in_left_zone, 1);
    }

    #[test]
    fn test_features_none_cases() {
        let zones = define_zones(1000, 800);
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        assert!(tracker.features(&9, Some(&zones)).is_none());

        tracker.update(9, centered(10.0, 10.0));
        assert!(tracker.features(&9, Some(&zones)).is_none());

        tracker.update(9, centered(10.5, 10.0));
        assert!(tracker.features(&9, None).is_none());

        let features = tracker.features(&9, Some(&zones)).unwrap();
        assert_eq!(features.is_stationary, 1);
    }

    #[test]
    fn test_first_seen_and_last_bbox() {
        let mut tracker: KinematicsTracker<String> = KinematicsTracker::with_max_history(3);
        let id = "car-1".to_string();
        tracker.update(id.clone(), centered(0.0, 0.0));
        tracker.update(id.clone(), centered(5.0, 0.0));

        assert_eq!(tracker.first_seen(&id), Some(1));
        assert_eq!(tracker.last_bbox(&id), Some(centered(5.0, 0.0)));
    }

    #[test]
    fn test_evict_stale() {
        let mut tracker: KinematicsTracker = KinematicsTracker::default();
        tracker.begin_frame();
        tracker.update(1, centered(0.0, 0.0));
        tracker.update(2, centered(50.0, 0.0));

        for _ in 0..3 {
            tracker.begin_frame();
            tracker.update(1, centered(0.0, 0.0));
        }

        // Identity 2 was last seen 3 frames ago
        assert_eq!(tracker.evict_stale(3), 0);
        tracker.begin_frame();
        tracker.update(1, centered(0.0, 0.0));
        assert_eq!(tracker.evict_stale(3), 1);
        assert!(tracker.contains(&1));
        assert!(!tracker.contains(&2));
    }

    proptest! {
        #[test]
        fn prop_history_bounded(max_history in 1usize..10, extra in 0usize..20) {
            let mut tracker: KinematicsTracker = KinematicsTracker::with_max_history(max_history);
            let total = max_history + extra;
            for i in 0..total {
                tracker.update(1, centered(i as f64, 0.0));
            }

            let history = tracker.history(&1).unwrap();
            prop_assert_eq!(history.len(), max_history);
            // Oldest retained point is the (extra + 1)-th insertion
            prop_assert_eq!(history[0].0, extra as f64);
        }

        #[test]
        fn prop_moving_tracks_have_direction(
            dx in -500.0f64..500.0,
            dy in -500.0f64..500.0,
        ) {
            prop_assume!(dx != 0.0 || dy != 0.0);
            let mut tracker: KinematicsTracker = KinematicsTracker::default();
            tracker.update(1, centered(1000.0, 1000.0));
            tracker.update(1, centered(1000.0 + dx, 1000.0 + dy));

            let (speed, direction) = tracker.speed_and_direction(&1);
            prop_assert!(speed >= 0.0);
            prop_assert_ne!(direction, Direction::Unknown);
        }
    }
}
