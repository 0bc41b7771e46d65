//! Detector capability trait.
//!
//! The object-detection model is an external collaborator. The pipeline only
//! depends on this one-method interface: given a frame, return the raw
//! detections. Backends own their weights, batching and acceleration; the
//! session controller treats an `infer` error as fatal and does not attempt
//! recovery.

use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

pub trait Detector: Send {
    /// Backend identifier, used in startup logs.
    fn name(&self) -> &'static str;

    /// Class labels the loaded model can produce, in model index order.
    fn class_labels(&self) -> Vec<String>;

    /// Run detection on a frame.
    ///
    /// Returns every detection the model produced; confidence filtering is
    /// the aggregator's job, not the backend's.
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}
