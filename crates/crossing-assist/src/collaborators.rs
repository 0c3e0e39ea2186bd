//! Interfaces to the detector, tracker and renderer

use crate::overlay::OverlayPlan;
use feature_engine::{TrackedObject, PEDESTRIAN_CLASS_ID, VEHICLE_CLASS_IDS};
use serde::{Deserialize, Serialize};
use std::io::Write;
use thiserror::Error;
use zones::BBox;

/// Errors reported by external collaborators
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("Detection failed: {0}")]
    Detector(String),

    #[error("Tracking failed: {0}")]
    Tracker(String),

    #[error("Rendering failed: {0}")]
    Renderer(String),
}

/// Raw detector output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BBox,
    pub score: f32,
    pub class_id: i64,
}

/// Track reported by the upstream tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub bbox: BBox,
    pub class_id: i64,
    /// Tentative tracks are skipped
    #[serde(default = "confirmed_by_default")]
    pub confirmed: bool,
}

fn confirmed_by_default() -> bool {
    true
}

impl Track {
    pub fn to_tracked_object(&self) -> TrackedObject {
        TrackedObject {
            id: self.id,
            class_id: self.class_id,
            bbox: self.bbox,
        }
    }
}

/// Object detector over frames of type `F`
pub trait Detector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>, CollaboratorError>;
}

/// Identity-assigning tracker over frames of type `F`
pub trait Tracker<F> {
    fn update(&mut self, detections: &[Detection], frame: &F)
        -> Result<Vec<Track>, CollaboratorError>;
}

/// Draws (or otherwise presents) a frame's overlay
pub trait Renderer {
    fn render(&mut self, plan: &OverlayPlan) -> Result<(), CollaboratorError>;
}

/// Whether a detector class takes part in crossing analysis
pub fn is_relevant_class(class_id: i64) -> bool {
    class_id == PEDESTRIAN_CLASS_ID || VEHICLE_CLASS_IDS.contains(&class_id)
}

/// Keep only people and vehicles
pub fn filter_detections(detections: Vec<Detection>) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|d| is_relevant_class(d.class_id))
        .collect()
}

/// Writes one JSON overlay plan per line
pub struct JsonLinesRenderer<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesRenderer<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Renderer for JsonLinesRenderer<W> {
    fn render(&mut self, plan: &OverlayPlan) -> Result<(), CollaboratorError> {
        serde_json::to_writer(&mut self.writer, plan)
            .map_err(|e| CollaboratorError::Renderer(e.to_string()))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| CollaboratorError::Renderer(e.to_string()))
    }
}
