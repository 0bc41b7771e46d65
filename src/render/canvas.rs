//! Raster back end for overlay draw plans.
//!
//! Rectangles always render. Text needs a loaded TTF/OTF font; when none is
//! available the canvas warns once and skips text ops, leaving boxes and
//! panels intact.

use std::path::Path;

use ab_glyph::{FontVec, PxScale};
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use super::{text_size, DrawOp};

/// Overlay font wrapper; owns the parsed font data.
pub struct OverlayFont {
    font: FontVec,
}

impl OverlayFont {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("read overlay font '{}'", path.display()))?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| anyhow::anyhow!("'{}' is not a usable TTF/OTF font", path.display()))?;
        Ok(Self { font })
    }
}

pub struct ImageCanvas {
    font: Option<OverlayFont>,
    warned_no_font: bool,
}

impl ImageCanvas {
    pub fn new(font: Option<OverlayFont>) -> Self {
        Self {
            font,
            warned_no_font: false,
        }
    }

    /// Apply a draw plan to the image in order.
    pub fn apply(&mut self, image: &mut RgbImage, ops: &[DrawOp]) {
        for op in ops {
            match op {
                DrawOp::HollowRect {
                    x0,
                    y0,
                    x1,
                    y1,
                    color,
                    thickness,
                } => draw_hollow(image, *x0, *y0, *x1, *y1, *color, *thickness),
                DrawOp::FilledRect {
                    x0,
                    y0,
                    x1,
                    y1,
                    color,
                } => draw_filled(image, *x0, *y0, *x1, *y1, *color),
                DrawOp::Text {
                    text,
                    x,
                    y_baseline,
                    scale,
                    color,
                    ..
                } => {
                    let Some(font) = &self.font else {
                        if !self.warned_no_font {
                            log::warn!("no overlay font loaded; text layers are skipped");
                            self.warned_no_font = true;
                        }
                        continue;
                    };
                    let metrics = text_size(text, *scale, 1);
                    let px = PxScale::from(22.0 * scale);
                    draw_text_mut(
                        image,
                        Rgb(*color),
                        *x,
                        y_baseline - metrics.height,
                        px,
                        &font.font,
                        text,
                    );
                }
            }
        }
    }
}

fn draw_hollow(image: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: [u8; 3], thickness: i32) {
    // Thickness grows inward, one-pixel ring at a time.
    for inset in 0..thickness.max(1) {
        let width = x1 - x0 - 2 * inset;
        let height = y1 - y0 - 2 * inset;
        if width <= 0 || height <= 0 {
            break;
        }
        let rect = Rect::at(x0 + inset, y0 + inset).of_size(width as u32, height as u32);
        draw_hollow_rect_mut(image, rect, Rgb(color));
    }
}

fn draw_filled(image: &mut RgbImage, x0: i32, y0: i32, x1: i32, y1: i32, color: [u8; 3]) {
    // Clip to the image so partially off-screen panels still render.
    let cx0 = x0.max(0);
    let cy0 = y0.max(0);
    let cx1 = x1.min(image.width() as i32);
    let cy1 = y1.min(image.height() as i32);
    if cx1 <= cx0 || cy1 <= cy0 {
        return;
    }
    let rect = Rect::at(cx0, cy0).of_size((cx1 - cx0) as u32, (cy1 - cy0) as u32);
    draw_filled_rect_mut(image, rect, Rgb(color));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filled_rect_paints_the_requested_region() {
        let mut image = RgbImage::new(40, 40);
        let mut canvas = ImageCanvas::new(None);
        canvas.apply(
            &mut image,
            &[DrawOp::FilledRect {
                x0: 5,
                y0: 5,
                x1: 10,
                y1: 10,
                color: [50, 50, 50],
            }],
        );
        assert_eq!(image.get_pixel(5, 5), &Rgb([50, 50, 50]));
        assert_eq!(image.get_pixel(9, 9), &Rgb([50, 50, 50]));
        assert_eq!(image.get_pixel(10, 10), &Rgb([0, 0, 0]));
    }

    #[test]
    fn off_screen_geometry_is_clipped_not_panicked() {
        let mut image = RgbImage::new(20, 20);
        let mut canvas = ImageCanvas::new(None);
        canvas.apply(
            &mut image,
            &[
                DrawOp::FilledRect {
                    x0: -5,
                    y0: -5,
                    x1: 5,
                    y1: 5,
                    color: [255, 0, 0],
                },
                DrawOp::FilledRect {
                    x0: 30,
                    y0: 30,
                    x1: 40,
                    y1: 40,
                    color: [255, 0, 0],
                },
            ],
        );
        assert_eq!(image.get_pixel(0, 0), &Rgb([255, 0, 0]));
        assert_eq!(image.get_pixel(19, 19), &Rgb([0, 0, 0]));
    }

    #[test]
    fn hollow_rect_thickness_rings_inward() {
        let mut image = RgbImage::new(30, 30);
        let mut canvas = ImageCanvas::new(None);
        canvas.apply(
            &mut image,
            &[DrawOp::HollowRect {
                x0: 2,
                y0: 2,
                x1: 20,
                y1: 20,
                color: [0, 255, 0],
                thickness: 2,
            }],
        );
        assert_eq!(image.get_pixel(2, 2), &Rgb([0, 255, 0]));
        assert_eq!(image.get_pixel(3, 3), &Rgb([0, 255, 0]));
        assert_eq!(image.get_pixel(4, 4), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(10, 10), &Rgb([0, 0, 0]));
    }

    #[test]
    fn text_without_a_font_is_skipped() {
        let mut image = RgbImage::new(20, 20);
        let mut canvas = ImageCanvas::new(None);
        canvas.apply(
            &mut image,
            &[DrawOp::Text {
                text: "FPS: 0.00".to_string(),
                x: 2,
                y_baseline: 10,
                scale: 0.5,
                color: [255, 255, 0],
                thickness: 1,
            }],
        );
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }
}
