//! Stub detector backend for tests and demos.

use anyhow::Result;

use crate::detect::backend::Detector;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// Deterministic backend that reports the same detections on every frame.
///
/// The default instance reports nothing, which is enough to exercise the
/// whole pipeline without model weights.
pub struct StubDetector {
    detections: Vec<Detection>,
    labels: Vec<String>,
}

impl StubDetector {
    pub fn new() -> Self {
        Self {
            detections: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Report `detections` on every frame.
    pub fn with_detections(detections: Vec<Detection>) -> Self {
        let mut labels: Vec<String> = Vec::new();
        for detection in &detections {
            if !labels.contains(&detection.class_label) {
                labels.push(detection.class_label.clone());
            }
        }
        Self { detections, labels }
    }
}

impl Default for StubDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for StubDetector {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn class_labels(&self) -> Vec<String> {
        self.labels.clone()
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        Ok(self.detections.clone())
    }
}
