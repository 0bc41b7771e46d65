//! Detector output types.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in integer pixel coordinates.
///
/// Invariant: `xmin <= xmax` and `ymin <= ymax`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BBox {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl BBox {
    pub fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        debug_assert!(xmin <= xmax && ymin <= ymax);
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn width(&self) -> u32 {
        (self.xmax - self.xmin).max(0) as u32
    }

    pub fn height(&self) -> u32 {
        (self.ymax - self.ymin).max(0) as u32
    }

    /// `[xmin, ymin, xmax, ymax]`, the wire order used by the scoring API.
    pub fn as_array(&self) -> [i32; 4] {
        [self.xmin, self.ymin, self.xmax, self.ymax]
    }
}

/// One localized, classified, confidence-scored object instance.
///
/// Produced fresh per frame by the detector and owned transiently by the
/// aggregator; never persisted across frames.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Detection {
    /// Model class index. Drives bounding-box palette selection.
    pub class_id: usize,
    pub class_label: String,
    /// Confidence score in [0, 1].
    pub confidence: f32,
    pub bbox: BBox,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_dimensions() {
        let bbox = BBox::new(10, 20, 110, 70);
        assert_eq!(bbox.width(), 100);
        assert_eq!(bbox.height(), 50);
        assert_eq!(bbox.as_array(), [10, 20, 110, 70]);
    }
}
