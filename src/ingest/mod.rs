//! Frame ingestion sources.
//!
//! This module unifies five source kinds behind one "next frame or
//! end-of-stream" contract:
//! - single image files
//! - image folders
//! - video files (feature: ingest-video-ffmpeg)
//! - USB cameras (`usbN`, feature: ingest-v4l2)
//! - Pi CSI cameras (`picameraN`, fixed-format capture, default 640x480)
//!
//! The source kind is inferred from the descriptor string before anything is
//! opened; unsupported extensions and unparseable descriptors fail fast as
//! configuration errors. Continuous kinds additionally accept `stub://`
//! descriptors that select an in-memory synthetic backend, so the full
//! pipeline runs without devices or codec libraries.
//!
//! Finite sources (image/folder) signal end-of-stream by sequence
//! exhaustion, which the controller treats as clean completion. A failure to
//! read from a continuous source is a `SourceError` and aborts the session
//! with a distinct message.

mod camera;
mod stills;
mod video;
#[cfg(feature = "ingest-v4l2")]
pub(crate) mod v4l2;
#[cfg(feature = "ingest-video-ffmpeg")]
pub(crate) mod video_ffmpeg;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use regex::Regex;
use thiserror::Error;

pub use camera::{CameraConfig, CameraSource};
pub use stills::StillsSource;
pub use video::VideoSource;

use crate::config::ConfigError;
use crate::frame::Frame;

/// Recognized image extensions (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp"];
/// Recognized video extensions (compared case-insensitively).
pub const VIDEO_EXTENSIONS: &[&str] = &["avi", "mov", "mp4", "mkv", "wmv"];

/// Default capture size for the fixed-format CSI sensor.
pub const PICAM_DEFAULT_WIDTH: u32 = 640;
pub const PICAM_DEFAULT_HEIGHT: u32 = 480;

/// One of the five acquisition strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    Image,
    Folder,
    Video,
    UsbCamera,
    PiCamera,
}

impl SourceKind {
    /// Camera and video sources stream until told to stop; image and folder
    /// sources run off a finite path list.
    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            SourceKind::Video | SourceKind::UsbCamera | SourceKind::PiCamera
        )
    }

    pub fn is_finite(&self) -> bool {
        !self.is_continuous()
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Image => "image",
            SourceKind::Folder => "folder",
            SourceKind::Video => "video",
            SourceKind::UsbCamera => "usb camera",
            SourceKind::PiCamera => "picamera",
        };
        f.write_str(name)
    }
}

/// Read failure on a continuous source. Distinct from clean exhaustion,
/// which is signalled by `Ok(None)` from `next_frame`.
#[derive(Debug, Error)]
#[error("unable to read frames from the {kind} source: {reason}")]
pub struct SourceError {
    pub kind: SourceKind,
    pub reason: String,
}

/// A classified source descriptor. Carries only the data its kind needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceSpec {
    Image(PathBuf),
    Folder(PathBuf),
    /// Video file path, or `stub://...` for the synthetic backend.
    Video(String),
    /// Device path (`/dev/videoN`), or `stub://...`.
    UsbCamera(String),
    /// Device path, or `stub://...`.
    PiCamera(String),
}

impl SourceSpec {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceSpec::Image(_) => SourceKind::Image,
            SourceSpec::Folder(_) => SourceKind::Folder,
            SourceSpec::Video(_) => SourceKind::Video,
            SourceSpec::UsbCamera(_) => SourceKind::UsbCamera,
            SourceSpec::PiCamera(_) => SourceKind::PiCamera,
        }
    }

    /// Infer the source kind from a descriptor string.
    ///
    /// - existing directory → folder
    /// - existing file → image or video by extension, anything else rejected
    /// - `usbN` / `picameraN` → camera index
    /// - `stub://camera`, `stub://picamera`, `stub://video` → synthetic
    pub fn parse(descriptor: &str) -> Result<Self, ConfigError> {
        let path = Path::new(descriptor);
        if path.is_dir() {
            return Ok(SourceSpec::Folder(path.to_path_buf()));
        }
        if path.is_file() {
            let ext = path
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("")
                .to_ascii_lowercase();
            if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
                return Ok(SourceSpec::Image(path.to_path_buf()));
            }
            if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
                return Ok(SourceSpec::Video(descriptor.to_string()));
            }
            return Err(ConfigError::UnsupportedExtension(ext));
        }

        match descriptor {
            "stub://camera" => return Ok(SourceSpec::UsbCamera(descriptor.to_string())),
            "stub://picamera" => return Ok(SourceSpec::PiCamera(descriptor.to_string())),
            "stub://video" => return Ok(SourceSpec::Video(descriptor.to_string())),
            _ => {}
        }

        let usb = Regex::new(r"^usb(\d+)$").expect("usb descriptor pattern");
        if let Some(caps) = usb.captures(descriptor) {
            return Ok(SourceSpec::UsbCamera(format!("/dev/video{}", &caps[1])));
        }
        let picam = Regex::new(r"^picamera(\d+)$").expect("picamera descriptor pattern");
        if let Some(caps) = picam.captures(descriptor) {
            return Ok(SourceSpec::PiCamera(format!("/dev/video{}", &caps[1])));
        }

        Err(ConfigError::InvalidSource(descriptor.to_string()))
    }
}

/// Polymorphic frame source: single dispatch point over the five kinds.
pub enum FrameSource {
    Stills(StillsSource),
    Video(VideoSource),
    Camera(CameraSource),
}

impl FrameSource {
    /// Open a source for a classified descriptor.
    ///
    /// `resolution` is forwarded to camera backends as the requested capture
    /// size; the controller still resizes frames to the exact target
    /// dimensions afterwards. The CSI sensor requires explicit dimensions
    /// and falls back to 640x480 when none are given.
    pub fn open(spec: &SourceSpec, resolution: Option<(u32, u32)>) -> Result<Self> {
        match spec {
            SourceSpec::Image(path) => Ok(FrameSource::Stills(StillsSource::single(path)?)),
            SourceSpec::Folder(path) => Ok(FrameSource::Stills(StillsSource::folder(path)?)),
            SourceSpec::Video(path) => Ok(FrameSource::Video(VideoSource::open(path)?)),
            SourceSpec::UsbCamera(device) => {
                let config = CameraConfig {
                    device: device.clone(),
                    width: resolution.map(|(w, _)| w).unwrap_or(0),
                    height: resolution.map(|(_, h)| h).unwrap_or(0),
                };
                Ok(FrameSource::Camera(CameraSource::open(
                    SourceKind::UsbCamera,
                    config,
                )?))
            }
            SourceSpec::PiCamera(device) => {
                let (width, height) =
                    resolution.unwrap_or((PICAM_DEFAULT_WIDTH, PICAM_DEFAULT_HEIGHT));
                let config = CameraConfig {
                    device: device.clone(),
                    width,
                    height,
                };
                Ok(FrameSource::Camera(CameraSource::open(
                    SourceKind::PiCamera,
                    config,
                )?))
            }
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            FrameSource::Stills(source) => source.kind(),
            FrameSource::Video(_) => SourceKind::Video,
            FrameSource::Camera(source) => source.kind(),
        }
    }

    /// Pull the next frame.
    ///
    /// `Ok(None)` means the source is cleanly exhausted (finite sources and
    /// video end-of-file). `Err` means a continuous source failed to read.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        match self {
            FrameSource::Stills(source) => source.next_frame(),
            FrameSource::Video(source) => source.next_frame(),
            FrameSource::Camera(source) => source.next_frame(),
        }
    }

    /// Move the cursor back one image so the previous frame is re-read.
    /// Only meaningful for finite sources; a no-op otherwise.
    pub fn step_back(&mut self) {
        if let FrameSource::Stills(source) = self {
            source.step_back();
        }
    }

    /// Release the underlying handle. Also happens on drop; calling it
    /// explicitly gets the release logged on the session's exit path.
    pub fn close(&mut self) {
        match self {
            FrameSource::Stills(_) => {}
            FrameSource::Video(source) => source.close(),
            FrameSource::Camera(source) => source.close(),
        }
        log::info!("{} source released", self.kind());
    }
}

/// Synthetic RGB pattern used by the stub backends. Varies with the frame
/// counter so consecutive frames differ.
pub(crate) fn synthetic_pixels(width: u32, height: u32, frame_count: u64) -> Vec<u8> {
    let pixel_count = (width * height * 3) as usize;
    let mut pixels = vec![0u8; pixel_count];
    for (i, pixel) in pixels.iter_mut().enumerate() {
        *pixel = ((i as u64 + frame_count) % 256) as u8;
    }
    pixels
}
