//! Frame container shared by every pipeline stage.
//!
//! A `Frame` is one decoded RGB image plus the sequence number the source
//! assigned to it. Frames are produced by the ingestion layer, handed to the
//! detector, mutated in place by the overlay back end and finally written to
//! the recorder or snapshot file. Nothing retains a frame across iterations.

use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use image::{imageops, RgbImage};

#[derive(Clone)]
pub struct Frame {
    pub image: RgbImage,
    /// 1-based capture sequence number within the session.
    pub sequence: u64,
}

impl Frame {
    pub fn new(image: RgbImage, sequence: u64) -> Self {
        Self { image, sequence }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Resize to exact target dimensions. No-op when already matching.
    pub fn resize_to(&mut self, width: u32, height: u32) {
        if self.width() == width && self.height() == height {
            return;
        }
        self.image = imageops::resize(&self.image, width, height, imageops::FilterType::Triangle);
    }

    /// Persist the frame to `path`, format chosen from the extension.
    pub fn save(&self, path: &Path) -> Result<()> {
        self.image
            .save(path)
            .with_context(|| format!("failed to write frame to {}", path.display()))
    }
}

/// Summarizes instead of dumping the pixel buffer.
impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("sequence", &self.sequence)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_matches_requested_dimensions() {
        let mut frame = Frame::new(RgbImage::new(64, 48), 1);
        frame.resize_to(32, 16);
        assert_eq!(frame.width(), 32);
        assert_eq!(frame.height(), 16);
    }

    #[test]
    fn resize_to_native_dimensions_is_a_no_op() {
        let mut frame = Frame::new(RgbImage::new(64, 48), 1);
        let before = frame.image.clone();
        frame.resize_to(64, 48);
        assert_eq!(frame.image.as_raw(), before.as_raw());
    }

    // Error-path assertions unwrap results carrying frames, which needs this
    // formatting to exist and stay pixel-free.
    #[test]
    fn debug_formatting_summarizes_without_pixel_data() {
        let frame = Frame::new(RgbImage::new(64, 48), 7);
        let formatted = format!("{:?}", frame);
        assert_eq!(
            formatted,
            "Frame { width: 64, height: 48, sequence: 7 }"
        );
    }
}
