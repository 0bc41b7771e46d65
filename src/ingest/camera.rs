//! Live camera frame sources (USB and CSI).
//!
//! Both camera kinds share one capture wrapper; the kind only changes how the
//! descriptor was parsed and how the capture format is negotiated. Real
//! devices are V4L2-backed (feature: ingest-v4l2); `stub://` descriptors
//! select an in-memory synthetic backend.
//!
//! Cameras never exhaust: `next_frame` either delivers or fails with a
//! `SourceError`, which the controller reports as an aborted session.

use anyhow::Result;

#[cfg(feature = "ingest-v4l2")]
use super::v4l2::DeviceCamera;
use super::{synthetic_pixels, SourceError, SourceKind};
use crate::frame::Frame;

/// Requested capture configuration. Zero width/height means source-native.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

pub struct CameraSource {
    kind: SourceKind,
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "ingest-v4l2")]
    Device(DeviceCamera),
}

impl CameraSource {
    pub fn open(kind: SourceKind, config: CameraConfig) -> Result<Self> {
        if config.device.starts_with("stub://") {
            log::info!("{} source: {} (synthetic)", kind, config.device);
            return Ok(Self {
                kind,
                backend: CameraBackend::Synthetic(SyntheticCamera::new(config, None)),
            });
        }
        #[cfg(feature = "ingest-v4l2")]
        {
            let device = DeviceCamera::open(&config)?;
            log::info!("{} source: {} (v4l2)", kind, config.device);
            Ok(Self {
                kind,
                backend: CameraBackend::Device(device),
            })
        }
        #[cfg(not(feature = "ingest-v4l2"))]
        {
            Err(anyhow::anyhow!(
                "camera capture from {} requires the ingest-v4l2 feature",
                config.device
            ))
        }
    }

    /// Synthetic camera that optionally disconnects after `fail_after`
    /// frames. Used to exercise the aborted-session path in tests.
    pub fn synthetic(kind: SourceKind, config: CameraConfig, fail_after: Option<u64>) -> Self {
        Self {
            kind,
            backend: CameraBackend::Synthetic(SyntheticCamera::new(config, fail_after)),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => {
                source.next_frame().map(Some).map_err(|reason| SourceError {
                    kind: self.kind,
                    reason,
                })
            }
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => {
                source.next_frame().map(Some).map_err(|e| SourceError {
                    kind: self.kind,
                    reason: e.to_string(),
                })
            }
        }
    }

    pub fn close(&mut self) {
        match &mut self.backend {
            CameraBackend::Synthetic(_) => {}
            #[cfg(feature = "ingest-v4l2")]
            CameraBackend::Device(source) => source.close(),
        }
    }
}

struct SyntheticCamera {
    width: u32,
    height: u32,
    frame_count: u64,
    fail_after: Option<u64>,
}

impl SyntheticCamera {
    fn new(config: CameraConfig, fail_after: Option<u64>) -> Self {
        Self {
            width: if config.width > 0 { config.width } else { 640 },
            height: if config.height > 0 { config.height } else { 480 },
            frame_count: 0,
            fail_after,
        }
    }

    fn next_frame(&mut self) -> Result<Frame, String> {
        if let Some(limit) = self.fail_after {
            if self.frame_count >= limit {
                return Err("synthetic camera disconnected".to_string());
            }
        }
        self.frame_count += 1;
        let pixels = synthetic_pixels(self.width, self.height, self.frame_count);
        let image = image::RgbImage::from_raw(self.width, self.height, pixels)
            .expect("synthetic buffer matches dimensions");
        Ok(Frame::new(image, self.frame_count))
    }
}
