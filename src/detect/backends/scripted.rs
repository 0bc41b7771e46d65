//! Scripted detector backend.
//!
//! Replays a fixed per-frame detection script from a JSON file. Useful for
//! demos and integration tests where real model weights are unavailable; the
//! session behaves exactly as it would with a live model, minus the inference
//! cost.
//!
//! Script shape:
//!
//! ```json
//! {
//!   "labels": ["Bar_One", "Gems", "Kit_Kat", "Milky_Bar"],
//!   "frames": [
//!     [{"class_id": 1, "class_label": "Gems", "confidence": 0.9,
//!       "bbox": {"xmin": 10, "ymin": 10, "xmax": 60, "ymax": 50}}],
//!     []
//!   ]
//! }
//! ```
//!
//! The script wraps around once exhausted, so continuous sources keep
//! receiving detections.

use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::detect::backend::Detector;
use crate::detect::result::Detection;
use crate::frame::Frame;

#[derive(Deserialize)]
struct Script {
    labels: Vec<String>,
    frames: Vec<Vec<Detection>>,
}

pub struct ScriptedDetector {
    script: Script,
    cursor: usize,
}

impl ScriptedDetector {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read detector script {}: {}", path.display(), e))?;
        let script: Script = serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid detector script {}: {}", path.display(), e))?;
        if script.frames.is_empty() {
            return Err(anyhow!(
                "detector script {} has no frames",
                path.display()
            ));
        }
        Ok(Self { script, cursor: 0 })
    }

    pub fn from_frames(labels: Vec<String>, frames: Vec<Vec<Detection>>) -> Self {
        Self {
            script: Script { labels, frames },
            cursor: 0,
        }
    }
}

impl Detector for ScriptedDetector {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn class_labels(&self) -> Vec<String> {
        self.script.labels.clone()
    }

    fn infer(&mut self, _frame: &Frame) -> Result<Vec<Detection>> {
        let frame_dets = self.script.frames[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.script.frames.len();
        Ok(frame_dets)
    }
}
