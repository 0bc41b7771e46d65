//! Overlay rendering.
//!
//! The renderer is split in two: this module computes a deterministic draw
//! plan (geometry, colors, text) from the frame's detections and score, and
//! `canvas` rasterizes the plan into the pixel buffer. Keeping geometry out
//! of the back end makes the layout reproducible across runs and testable
//! without touching pixels.
//!
//! Two layouts are supported (`OverlayOptions::rich_layout`): the rich one
//! with a dynamically sized summary panel, per-class count lines, the
//! two-pass risk line and an FPS readout for continuous sources, and the
//! basic fixed-size three-line panel.

pub mod canvas;

use crate::detect::Detection;
use crate::score::FrameScore;
use crate::Color;

/// Fixed 10-entry bounding-box palette, indexed by `class_id % 10`.
pub const BBOX_PALETTE: [Color; 10] = [
    [87, 120, 164],
    [228, 148, 68],
    [209, 97, 93],
    [133, 182, 178],
    [106, 159, 88],
    [231, 202, 96],
    [168, 124, 159],
    [241, 162, 169],
    [150, 118, 98],
    [184, 176, 172],
];

const PANEL_FILL: Color = [50, 50, 50];
const CANDY_LINE_COLOR: Color = [51, 102, 255];
const CALORIE_LINE_COLOR: Color = [51, 204, 51];
const SUGAR_LINE_COLOR: Color = [255, 204, 0];
const CLASS_LINE_COLOR: Color = [255, 255, 255];
const FPS_LINE_COLOR: Color = [255, 255, 0];
const BLACK: Color = [0, 0, 0];

const PANEL_ORIGIN: (i32, i32) = (10, 10);
const PANEL_PADDING: i32 = 20;
const CLASS_LINE_START_Y: i32 = 150;
const CLASS_LINE_STEP: i32 = 32;
const RISK_LINE_POS: (i32, i32) = (20, 300);

/// One primitive for the canvas back end. Coordinates are pixel positions;
/// text anchors at its baseline-left corner.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    HollowRect {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        color: Color,
        thickness: i32,
    },
    FilledRect {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        color: Color,
    },
    Text {
        text: String,
        x: i32,
        y_baseline: i32,
        scale: f32,
        color: Color,
        thickness: i32,
    },
}

/// Measured extent of a rendered string.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextSize {
    pub width: i32,
    pub height: i32,
    pub baseline: i32,
}

/// Deterministic fixed-advance text metrics.
///
/// Label backgrounds and the summary panel are sized from these numbers, so
/// the geometry is identical across runs and independent of whichever font
/// the back end rasterizes with.
pub fn text_size(text: &str, scale: f32, thickness: i32) -> TextSize {
    TextSize {
        width: (text.chars().count() as f32 * 17.0 * scale).round() as i32 + thickness,
        height: (22.0 * scale).round() as i32 + thickness,
        baseline: (9.0 * scale).round() as i32 + thickness,
    }
}

#[derive(Clone, Copy, Debug)]
pub struct OverlayOptions {
    pub rich_layout: bool,
    /// FPS line renders only for continuous sources.
    pub show_fps: bool,
}

/// Compute the full overlay plan for one frame: per-detection boxes and
/// labels first, then the summary panel drawn over them.
pub fn overlay_plan(
    kept: &[Detection],
    score: &FrameScore,
    avg_fps: f64,
    opts: &OverlayOptions,
) -> Vec<DrawOp> {
    let mut ops = Vec::new();
    for detection in kept {
        push_detection(&mut ops, detection);
    }
    if opts.rich_layout {
        push_rich_panel(&mut ops, score, avg_fps, opts.show_fps);
    } else {
        push_basic_panel(&mut ops, score);
    }
    ops
}

fn push_detection(ops: &mut Vec<DrawOp>, detection: &Detection) {
    let color = BBOX_PALETTE[detection.class_id % BBOX_PALETTE.len()];
    let bbox = detection.bbox;
    ops.push(DrawOp::HollowRect {
        x0: bbox.xmin,
        y0: bbox.ymin,
        x1: bbox.xmax,
        y1: bbox.ymax,
        color,
        thickness: 2,
    });

    let label = format!(
        "{}: {}%",
        detection.class_label,
        (detection.confidence * 100.0) as i32
    );
    let size = text_size(&label, 0.5, 1);
    // Background sits above the box unless that would leave the frame; then
    // it clamps to the box's top edge.
    let label_ymin = bbox.ymin.max(size.height + 10);
    ops.push(DrawOp::FilledRect {
        x0: bbox.xmin,
        y0: label_ymin - size.height - 10,
        x1: bbox.xmin + size.width,
        y1: label_ymin + size.baseline - 10,
        color,
    });
    ops.push(DrawOp::Text {
        text: label,
        x: bbox.xmin,
        y_baseline: label_ymin - 7,
        scale: 0.5,
        color: BLACK,
        thickness: 1,
    });
}

fn push_rich_panel(ops: &mut Vec<DrawOp>, score: &FrameScore, avg_fps: f64, show_fps: bool) {
    let candy_line = format!("Number of candies: {}", score.counts.total());
    let calorie_line = format!("Total calories: {}", score.total_calories);
    let sugar_line = format!("Total sugar (g): {}", score.total_sugar);
    let risk_line = format!("Risk Level: {}", score.risk.tier.label());
    let fps_line = format!("FPS: {:.2}", avg_fps);

    // Panel width tracks the widest summary line; the risk line renders at
    // double scale and thickness, so it is measured that way too.
    let mut max_width = 0;
    for line in [&candy_line, &calorie_line, &sugar_line] {
        max_width = max_width.max(text_size(line, 0.5, 1).width);
    }
    max_width = max_width.max(text_size(&risk_line, 1.0, 2).width);
    if show_fps {
        max_width = max_width.max(text_size(&fps_line, 0.5, 1).width);
    }
    for (label, count) in score.counts.iter() {
        let line = format!("{}: {}", label, count);
        max_width = max_width.max(text_size(&line, 0.5, 1).width);
    }

    // Panel height grows linearly with the number of tracked classes.
    let class_count = score.counts.len() as i32;
    let final_y = if class_count > 0 {
        CLASS_LINE_START_Y + 50 + (class_count - 1) * CLASS_LINE_STEP + 15
    } else {
        130
    };
    ops.push(DrawOp::FilledRect {
        x0: PANEL_ORIGIN.0,
        y0: PANEL_ORIGIN.1,
        x1: PANEL_ORIGIN.0 + max_width + PANEL_PADDING,
        y1: final_y + PANEL_PADDING,
        color: PANEL_FILL,
    });

    ops.push(text_op(candy_line, 20, 40, 0.5, CANDY_LINE_COLOR, 1));
    ops.push(text_op(calorie_line, 20, 75, 0.5, CALORIE_LINE_COLOR, 1));
    ops.push(text_op(sugar_line, 20, 110, 0.5, SUGAR_LINE_COLOR, 1));

    for (idx, (label, count)) in score.counts.iter().enumerate() {
        ops.push(text_op(
            format!("{}: {}", label, count),
            20,
            CLASS_LINE_START_Y + idx as i32 * CLASS_LINE_STEP,
            0.5,
            CLASS_LINE_COLOR,
            1,
        ));
    }

    // Two-pass risk line: black outline below, tier color on top.
    ops.push(text_op(
        risk_line.clone(),
        RISK_LINE_POS.0,
        RISK_LINE_POS.1,
        1.0,
        BLACK,
        5,
    ));
    ops.push(text_op(
        risk_line,
        RISK_LINE_POS.0,
        RISK_LINE_POS.1,
        1.0,
        score.risk.color,
        2,
    ));

    if show_fps {
        ops.push(text_op(fps_line, 10, 20, 0.5, FPS_LINE_COLOR, 1));
    }
}

fn push_basic_panel(ops: &mut Vec<DrawOp>, score: &FrameScore) {
    ops.push(DrawOp::FilledRect {
        x0: PANEL_ORIGIN.0,
        y0: PANEL_ORIGIN.1,
        x1: 450,
        y1: 130,
        color: PANEL_FILL,
    });
    ops.push(text_op(
        format!("Number of candies: {}", score.counts.total()),
        20,
        40,
        1.0,
        CANDY_LINE_COLOR,
        2,
    ));
    ops.push(text_op(
        format!("Total calories: {}", score.total_calories),
        20,
        75,
        1.0,
        CALORIE_LINE_COLOR,
        2,
    ));
    ops.push(text_op(
        format!("Total sugar (g): {}", score.total_sugar),
        20,
        110,
        1.0,
        SUGAR_LINE_COLOR,
        2,
    ));
}

fn text_op(
    text: String,
    x: i32,
    y_baseline: i32,
    scale: f32,
    color: Color,
    thickness: i32,
) -> DrawOp {
    DrawOp::Text {
        text,
        x,
        y_baseline,
        scale,
        color,
        thickness,
    }
}
