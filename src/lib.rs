//! Candy detection kernel.
//!
//! This crate implements the core pipeline for candy detection and nutrition
//! scoring over video: frames come in from one of five source kinds, a
//! detector backend proposes labelled boxes, the pipeline filters them by a
//! confidence threshold, aggregates per-class counts, totals calories and
//! sugar from a nutrition table and classifies the result into a risk tier.
//!
//! # Module Structure
//!
//! - `frame`: the RGB frame unit flowing through the pipeline
//! - `ingest`: frame sources (image, folder, video file, USB camera, CSI camera)
//! - `detect`: detector backends, detection filtering and count aggregation
//! - `nutrition`: per-candy calorie/sugar reference table
//! - `score`: frame scoring and the five-tier risk classifier
//! - `rate`: rolling throughput estimation
//! - `render`: overlay draw plan and raster back end
//! - `record`: MJPEG AVI recording of annotated frames
//! - `session`: the interactive processing loop
//! - `api`: HTTP scoring endpoint over single images
//! - `config`: startup configuration and validation

pub mod api;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod nutrition;
pub mod rate;
pub mod record;
pub mod render;
pub mod score;
pub mod session;

/// RGB triple used for every overlay color.
pub type Color = [u8; 3];

pub use config::{ConfigError, PipelineConfig};
pub use detect::{aggregate, CandyCounts, Detection, Detector, ScriptedDetector, StubDetector};
pub use frame::Frame;
pub use nutrition::{NutritionEntry, NutritionTable};
pub use rate::RateWindow;
pub use score::{classify_calories, score, FrameScore, RiskLevel, RiskTier};
pub use session::{ExitStatus, SessionController};
