//! Pipeline configuration.
//!
//! One immutable record constructed at startup from the CLI and passed into
//! every component; no ambient lookup. Validation happens before any source,
//! recorder or detector is opened, so invalid combinations terminate with a
//! descriptive message and nothing to release.

use std::path::PathBuf;

use regex::Regex;
use thiserror::Error;

use crate::ingest::SourceKind;

pub const DEFAULT_THRESHOLD: f32 = 0.5;
/// Fixed snapshot output path, silently overwritten on repeat use.
pub const SNAPSHOT_PATH: &str = "capture.png";
/// Fixed recording output path and frame rate.
pub const RECORD_PATH: &str = "demo1.avi";
pub const RECORD_FPS: u32 = 30;

/// Rejected before the processing loop starts; never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("model path '{0}' is invalid or model was not found")]
    ModelNotFound(String),
    #[error("file extension '.{0}' is not supported")]
    UnsupportedExtension(String),
    #[error("source '{0}' is invalid; expected an image, folder, video file, usbN or picameraN")]
    InvalidSource(String),
    #[error("resolution must be in WxH format (e.g. 640x480), got '{0}'")]
    InvalidResolution(String),
    #[error("recording only works for video and camera sources, not a {0} source")]
    RecordNeedsContinuousSource(SourceKind),
    #[error("recording requires an explicit resolution")]
    RecordNeedsResolution,
}

/// Immutable session configuration.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub model_path: PathBuf,
    /// Raw source descriptor as given on the command line.
    pub descriptor: String,
    /// Minimum confidence a detection must strictly exceed to be counted.
    pub threshold: f32,
    /// Target WxH; when set, every frame is resized to exactly this.
    pub resolution: Option<(u32, u32)>,
    pub record: bool,
    pub record_path: PathBuf,
    pub snapshot_path: PathBuf,
    /// Optional nutrition table override (JSON file).
    pub nutrition_path: Option<PathBuf>,
    /// Optional TTF/OTF font for the overlay back end.
    pub font_path: Option<PathBuf>,
    /// Rich summary layout (dynamic panel, per-class lines, risk, FPS)
    /// versus the basic fixed three-line panel.
    pub rich_overlay: bool,
}

impl PipelineConfig {
    pub fn new(model_path: PathBuf, descriptor: String) -> Self {
        Self {
            model_path,
            descriptor,
            threshold: DEFAULT_THRESHOLD,
            resolution: None,
            record: false,
            record_path: PathBuf::from(RECORD_PATH),
            snapshot_path: PathBuf::from(SNAPSHOT_PATH),
            nutrition_path: None,
            font_path: None,
            rich_overlay: true,
        }
    }

    /// Fail-fast checks that need the classified source kind.
    pub fn validate(&self, kind: SourceKind) -> Result<(), ConfigError> {
        if !self.model_path.exists() {
            return Err(ConfigError::ModelNotFound(
                self.model_path.display().to_string(),
            ));
        }
        if self.record {
            if kind.is_finite() {
                return Err(ConfigError::RecordNeedsContinuousSource(kind));
            }
            if self.resolution.is_none() {
                return Err(ConfigError::RecordNeedsResolution);
            }
        }
        Ok(())
    }
}

/// Parse a "WxH" resolution string.
pub fn parse_resolution(raw: &str) -> Result<(u32, u32), ConfigError> {
    let pattern = Regex::new(r"^(\d+)x(\d+)$").expect("resolution pattern");
    let caps = pattern
        .captures(raw)
        .ok_or_else(|| ConfigError::InvalidResolution(raw.to_string()))?;
    let width: u32 = caps[1]
        .parse()
        .map_err(|_| ConfigError::InvalidResolution(raw.to_string()))?;
    let height: u32 = caps[2]
        .parse()
        .map_err(|_| ConfigError::InvalidResolution(raw.to_string()))?;
    if width == 0 || height == 0 {
        return Err(ConfigError::InvalidResolution(raw.to_string()));
    }
    Ok((width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_strings_parse_or_fail_descriptively() {
        assert_eq!(parse_resolution("640x480").unwrap(), (640, 480));
        assert_eq!(parse_resolution("1280x720").unwrap(), (1280, 720));
        for bad in ["640", "640x", "x480", "640X480", "640x480x3", "ax b", "0x480"] {
            assert!(parse_resolution(bad).is_err(), "accepted '{bad}'");
        }
    }

    #[test]
    fn record_requires_a_continuous_source_and_a_resolution() {
        let model = tempfile::NamedTempFile::new().expect("temp model");
        let mut cfg = PipelineConfig::new(
            model.path().to_path_buf(),
            "stub://camera".to_string(),
        );
        cfg.record = true;

        assert!(matches!(
            cfg.validate(SourceKind::Folder),
            Err(ConfigError::RecordNeedsContinuousSource(_))
        ));
        assert!(matches!(
            cfg.validate(SourceKind::UsbCamera),
            Err(ConfigError::RecordNeedsResolution)
        ));

        cfg.resolution = Some((640, 480));
        assert!(cfg.validate(SourceKind::UsbCamera).is_ok());
    }

    #[test]
    fn missing_model_is_a_config_error() {
        let cfg = PipelineConfig::new(
            PathBuf::from("/nonexistent/best.pt"),
            "stub://camera".to_string(),
        );
        assert!(matches!(
            cfg.validate(SourceKind::UsbCamera),
            Err(ConfigError::ModelNotFound(_))
        ));
    }
}
