//! Video file frame source.
//!
//! Real decoding is FFmpeg-backed (feature: ingest-video-ffmpeg). The
//! `stub://video` descriptor selects a synthetic backend that plays a short
//! fixed-length clip, which is what the default build and the tests use.
//!
//! End-of-file is a clean exhaustion (`Ok(None)`), matching finite sources;
//! a decode failure mid-stream is a `SourceError`.

use anyhow::Result;

#[cfg(feature = "ingest-video-ffmpeg")]
use super::video_ffmpeg::FfmpegVideoSource;
#[cfg(feature = "ingest-video-ffmpeg")]
use super::SourceKind;
use super::{synthetic_pixels, SourceError};
use crate::frame::Frame;

/// Length of the synthetic clip, in frames.
const SYNTHETIC_CLIP_FRAMES: u64 = 90;
const SYNTHETIC_WIDTH: u32 = 320;
const SYNTHETIC_HEIGHT: u32 = 240;

pub struct VideoSource {
    backend: VideoBackend,
}

enum VideoBackend {
    Synthetic(SyntheticVideo),
    #[cfg(feature = "ingest-video-ffmpeg")]
    Ffmpeg(FfmpegVideoSource),
}

impl VideoSource {
    pub fn open(path: &str) -> Result<Self> {
        if path.starts_with("stub://") {
            log::info!("video source: {} (synthetic)", path);
            return Ok(Self {
                backend: VideoBackend::Synthetic(SyntheticVideo::new()),
            });
        }
        #[cfg(feature = "ingest-video-ffmpeg")]
        {
            Ok(Self {
                backend: VideoBackend::Ffmpeg(FfmpegVideoSource::open(path)?),
            })
        }
        #[cfg(not(feature = "ingest-video-ffmpeg"))]
        {
            Err(anyhow::anyhow!(
                "video file capture requires the ingest-video-ffmpeg feature"
            ))
        }
    }

    pub fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        match &mut self.backend {
            VideoBackend::Synthetic(source) => Ok(source.next_frame()),
            #[cfg(feature = "ingest-video-ffmpeg")]
            VideoBackend::Ffmpeg(source) => source.next_frame().map_err(|e| SourceError {
                kind: SourceKind::Video,
                reason: e.to_string(),
            }),
        }
    }

    pub fn close(&mut self) {
        match &mut self.backend {
            VideoBackend::Synthetic(_) => {}
            #[cfg(feature = "ingest-video-ffmpeg")]
            VideoBackend::Ffmpeg(source) => source.close(),
        }
    }
}

struct SyntheticVideo {
    frame_count: u64,
}

impl SyntheticVideo {
    fn new() -> Self {
        Self { frame_count: 0 }
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if self.frame_count >= SYNTHETIC_CLIP_FRAMES {
            return None;
        }
        self.frame_count += 1;
        let pixels = synthetic_pixels(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, self.frame_count);
        let image = image::RgbImage::from_raw(SYNTHETIC_WIDTH, SYNTHETIC_HEIGHT, pixels)
            .expect("synthetic buffer matches dimensions");
        Some(Frame::new(image, self.frame_count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_clip_ends_cleanly() {
        let mut source = VideoSource::open("stub://video").expect("open synthetic video");
        let mut delivered = 0;
        while let Some(frame) = source.next_frame().expect("synthetic read") {
            assert_eq!(frame.width(), SYNTHETIC_WIDTH);
            delivered += 1;
        }
        assert_eq!(delivered, SYNTHETIC_CLIP_FRAMES);
    }
}
