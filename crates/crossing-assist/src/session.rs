//! Crossing safety session
//!
//! Owns every piece of per-run state (kinematics, alert debouncing, the
//! classifier) and processes frames strictly one after another.

use crate::collaborators::{filter_detections, Detector, Track, Tracker};
use crate::config::AppConfig;
use crate::overlay::{plan_overlay, scene_reason, OverlayPlan};
use alerting::{AlertConfig, AlertLabel, AlertSink, AlertStateMachine};
use feature_engine::{FrameFeatureAggregator, FrameFeatureVector, ObjectSummary, TrackedObject};
use inference_engine::{FailSafeClassifier, SceneClassifier, SceneLabel};
use kinematics::{KinematicsTracker, TrackerConfig};
use std::time::Instant;
use tracing::{debug, info, warn};
use zones::{define_zones, ZoneMap};

/// Everything computed for one frame
#[derive(Debug, Clone)]
pub struct FrameOutcome {
    /// 1-based frame index
    pub frame: u64,
    pub width: i64,
    pub height: i64,
    pub zones: ZoneMap,
    pub features: FrameFeatureVector,
    pub label: SceneLabel,
    /// The classifier failed and the frame was labelled unsafe by default
    pub classifier_failed: bool,
    /// Alert emitted on this frame, if any
    pub alert: Option<AlertLabel>,
    pub objects: Vec<ObjectSummary>,
    /// Identities forgotten after this frame
    pub evicted: usize,
}

impl FrameOutcome {
    pub fn is_safe(&self) -> bool {
        self.label.is_safe()
    }

    /// Overlay for the renderer
    pub fn overlay(&self) -> OverlayPlan {
        plan_overlay(
            self.frame,
            self.width,
            self.height,
            &self.zones,
            &self.objects,
            self.label,
        )
        .with_reason(scene_reason(&self.features, self.classifier_failed))
    }
}

/// Session statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub frames: u64,
    pub alerts: u64,
    pub classifier_failures: u64,
    pub unsafe_frames: u64,
    pub evicted: u64,
}

/// Per-run context for crossing analysis
pub struct SafetySession {
    tracker: KinematicsTracker,
    aggregator: FrameFeatureAggregator,
    classifier: FailSafeClassifier<Box<dyn SceneClassifier>>,
    alerts: AlertStateMachine,
    sink: Box<dyn AlertSink>,
    /// Evict identities idle for longer than this (0 = never)
    stale_after_frames: u64,
    stats: SessionStats,
}

impl SafetySession {
    /// Create a session
    pub fn new(
        tracker_config: &TrackerConfig,
        alert_config: AlertConfig,
        classifier: Box<dyn SceneClassifier>,
        sink: Box<dyn AlertSink>,
    ) -> Self {
        info!(
            "Creating crossing session: classifier={}, max_history={}, stale_after_frames={}",
            classifier.name(),
            tracker_config.max_history,
            tracker_config.stale_after_frames
        );
        Self {
            tracker: KinematicsTracker::new(tracker_config),
            aggregator: FrameFeatureAggregator::new(),
            classifier: FailSafeClassifier::new(classifier),
            alerts: AlertStateMachine::new(alert_config),
            sink,
            stale_after_frames: tracker_config.stale_after_frames,
            stats: SessionStats::default(),
        }
    }

    /// Create a session from application configuration
    pub fn from_config(
        config: &AppConfig,
        classifier: Box<dyn SceneClassifier>,
        sink: Box<dyn AlertSink>,
    ) -> Self {
        Self::new(&config.tracker, config.alert.clone(), classifier, sink)
    }

    /// Process the confirmed tracks of one frame observed at `now`
    pub fn process_tracks(
        &mut self,
        width: i64,
        height: i64,
        tracks: &[Track],
        now: Instant,
    ) -> FrameOutcome {
        let frame = self.tracker.begin_frame();
        let zones = define_zones(width, height);

        let objects: Vec<TrackedObject> = tracks
            .iter()
            .filter(|track| track.confirmed)
            .map(Track::to_tracked_object)
            .collect();
        if objects.len() < tracks.len() {
            debug!(
                "Frame {}: skipped {} unconfirmed tracks",
                frame,
                tracks.len() - objects.len()
            );
        }

        let aggregate = self
            .aggregator
            .aggregate(&objects, &zones, &mut self.tracker);
        let classification = self.classifier.classify(&aggregate.features);

        let alert = self.alerts.update(classification.label.is_safe(), now);
        if let Some(label) = alert {
            metrics::counter!("crossing_alerts_emitted_total", "label" => label.as_str())
                .increment(1);
            self.stats.alerts += 1;
            if let Err(e) = self.sink.emit(label) {
                warn!("Alert delivery failed for {}: {}", label, e);
            }
        }

        let evicted = if self.stale_after_frames > 0 {
            self.tracker.evict_stale(self.stale_after_frames)
        } else {
            0
        };

        metrics::counter!("crossing_frames_processed_total").increment(1);
        self.stats.frames += 1;
        if !classification.label.is_safe() {
            self.stats.unsafe_frames += 1;
        }
        if classification.used_fallback {
            metrics::counter!("crossing_classifier_failures_total").increment(1);
            self.stats.classifier_failures += 1;
        }
        if evicted > 0 {
            metrics::counter!("crossing_tracks_evicted_total").increment(evicted as u64);
            self.stats.evicted += evicted as u64;
        }

        debug!(
            "Frame {}: label={}, alert={:?}, tracked={}",
            frame,
            classification.label.as_str(),
            alert,
            self.tracker.len()
        );

        FrameOutcome {
            frame,
            width,
            height,
            zones,
            features: aggregate.features,
            label: classification.label,
            classifier_failed: classification.used_fallback,
            alert,
            objects: aggregate.objects,
            evicted,
        }
    }

    /// Run detection and tracking on a raw frame, then process the tracks.
    ///
    /// Detector or tracker failures are logged and the frame is processed as empty.
    pub fn process_frame<F, D, T>(
        &mut self,
        frame: &F,
        width: i64,
        height: i64,
        detector: &mut D,
        tracker: &mut T,
        now: Instant,
    ) -> FrameOutcome
    where
        D: Detector<F>,
        T: Tracker<F>,
    {
        let detections = match detector.detect(frame) {
            Ok(detections) => filter_detections(detections),
            Err(e) => {
                warn!("Frame dropped to empty: {}", e);
                Vec::new()
            }
        };

        let tracks = match tracker.update(&detections, frame) {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("Frame dropped to empty: {}", e);
                Vec::new()
            }
        };

        self.process_tracks(width, height, &tracks, now)
    }

    /// Kinematics state, for inspection
    pub fn tracker(&self) -> &KinematicsTracker {
        &self.tracker
    }

    /// Last emitted alert
    pub fn current_alert(&self) -> Option<AlertLabel> {
        self.alerts.current()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{CollaboratorError, Detection};
    use alerting::RecordingSink;
    use inference_engine::{InferenceError, RuleClassifier};
    use std::time::Duration;
    use zones::BBox;

    struct Broken;

    impl SceneClassifier for Broken {
        fn classify(&self, _: &FrameFeatureVector) -> Result<SceneLabel, InferenceError> {
            Err(InferenceError::InferenceFailed("boom".to_string()))
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    fn session(classifier: Box<dyn SceneClassifier>) -> SafetySession {
        SafetySession::new(
            &TrackerConfig::default(),
            AlertConfig::default(),
            classifier,
            Box::new(RecordingSink::default()),
        )
    }

    fn car(id: u64, cx: f64, cy: f64) -> Track {
        Track {
            id,
            bbox: BBox::new(cx - 20.0, cy - 20.0, cx + 20.0, cy + 20.0),
            class_id: 2,
            confirmed: true,
        }
    }

    #[test]
    fn test_empty_frame_is_safe_and_alerts_move() {
        let mut session = session(Box::new(RuleClassifier::default()));
        let outcome = session.process_tracks(1000, 800, &[], Instant::now());

        assert_eq!(outcome.frame, 1);
        assert_eq!(outcome.features, FrameFeatureVector::default());
        assert!(outcome.is_safe());
        assert_eq!(outcome.alert, Some(AlertLabel::Move));
    }

    #[test]
    fn test_classifier_failure_is_unsafe() {
        let mut session = session(Box::new(Broken));
        let start = Instant::now();

        let first = session.process_tracks(1000, 800, &[], start);
        let second = session.process_tracks(1000, 800, &[], start + Duration::from_secs(1));

        assert!(!first.is_safe());
        assert!(first.classifier_failed);
        assert_eq!(first.overlay().reason, "classifier fault");
        assert_eq!(first.overlay().banner, "UNSAFE TO CROSS");
        assert_eq!(first.alert, Some(AlertLabel::Stop));
        assert_eq!(second.alert, None);
        assert_eq!(session.stats().classifier_failures, 2);
    }

    #[test]
    fn test_unconfirmed_tracks_skipped() {
        let mut session = session(Box::new(RuleClassifier::default()));
        let mut tentative = car(1, 500.0, 500.0);
        tentative.confirmed = false;

        let outcome = session.process_tracks(1000, 800, &[tentative], Instant::now());
        assert_eq!(outcome.features.num_vehicles, 0);
        assert!(session.tracker().is_empty());
    }

    #[test]
    fn test_vehicle_in_crossing_triggers_stop() {
        let mut session = session(Box::new(RuleClassifier::default()));
        let start = Instant::now();

        let first = session.process_tracks(1000, 800, &[], start);
        let second = session.process_tracks(
            1000,
            800,
            &[car(1, 500.0, 500.0)],
            start + Duration::from_secs(1),
        );

        assert_eq!(first.alert, Some(AlertLabel::Move));
        assert_eq!(second.features.num_in_crossing_zone, 1);
        assert_eq!(second.alert, Some(AlertLabel::Stop));
        assert_eq!(session.current_alert(), Some(AlertLabel::Stop));
    }

    #[test]
    fn test_stale_identities_evicted() {
        let mut session = SafetySession::new(
            &TrackerConfig {
                max_history: 5,
                stale_after_frames: 2,
            },
            AlertConfig::default(),
            Box::new(RuleClassifier::default()),
            Box::new(RecordingSink::default()),
        );
        let now = Instant::now();

        session.process_tracks(1000, 800, &[car(1, 100.0, 100.0)], now);
        session.process_tracks(1000, 800, &[], now);
        session.process_tracks(1000, 800, &[], now);
        assert!(session.tracker().contains(&1));

        let outcome = session.process_tracks(1000, 800, &[], now);
        assert_eq!(outcome.evicted, 1);
        assert!(session.tracker().is_empty());
        assert_eq!(session.stats().evicted, 1);
    }

    struct FailingDetector;

    impl Detector<()> for FailingDetector {
        fn detect(&mut self, _: &()) -> Result<Vec<Detection>, CollaboratorError> {
            Err(CollaboratorError::Detector("camera glitch".to_string()))
        }
    }

    struct FixedDetector(Vec<Detection>);

    impl Detector<()> for FixedDetector {
        fn detect(&mut self, _: &()) -> Result<Vec<Detection>, CollaboratorError> {
            Ok(self.0.clone())
        }
    }

    /// Assigns the detection index as identity
    struct IndexTracker;

    impl Tracker<()> for IndexTracker {
        fn update(&mut self, detections: &[Detection], _: &()) -> Result<Vec<Track>, CollaboratorError> {
            Ok(detections
                .iter()
                .enumerate()
                .map(|(i, d)| Track {
                    id: i as u64,
                    bbox: d.bbox,
                    class_id: d.class_id,
                    confirmed: true,
                })
                .collect())
        }
    }

    #[test]
    fn test_process_frame_contains_detector_failure() {
        let mut session = session(Box::new(RuleClassifier::default()));
        let outcome =
            session.process_frame(&(), 640, 480, &mut FailingDetector, &mut IndexTracker, Instant::now());
        assert_eq!(outcome.features.num_vehicles, 0);
        assert_eq!(outcome.frame, 1);
    }

    #[test]
    fn test_process_frame_filters_classes() {
        let mut session = session(Box::new(RuleClassifier::default()));
        let bbox = BBox::new(10.0, 10.0, 40.0, 60.0);
        let mut detector = FixedDetector(vec![
            Detection { bbox, score: 0.9, class_id: 0 },
            Detection { bbox, score: 0.8, class_id: 16 },
            Detection { bbox, score: 0.7, class_id: 5 },
        ]);

        let outcome =
            session.process_frame(&(), 640, 480, &mut detector, &mut IndexTracker, Instant::now());
        assert_eq!(outcome.features.num_pedestrians, 1);
        assert_eq!(outcome.features.num_vehicles, 1);
        assert_eq!(outcome.objects.len(), 2);
    }
}
