//! Crop window records and the crop-to-output transform.

use serde::{Deserialize, Serialize};

use crate::detection::FrameIndex;
use crate::rect::Rect;

/// The crop window emitted for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropRecord {
    #[serde(rename = "t")]
    pub frame: FrameIndex,

    /// Crop window in scene pixels.
    pub crop: Rect,

    /// True when this frame re-uses an earlier crop because the freshly
    /// computed one was degenerate.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub held: bool,

    /// Number of raw detections seen on this frame.
    pub detections: usize,
}

/// A 2x3 affine matrix mapping scene coordinates to output coordinates.
///
/// Row-major: `x' = m[0][0]*x + m[0][1]*y + m[0][2]`,
/// `y' = m[1][0]*x + m[1][1]*y + m[1][2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub m: [[f64; 3]; 2],
}

impl AffineTransform {
    /// Transform that maps the crop's top-left, bottom-left and bottom-right
    /// corners onto `(0, 0)`, `(0, out_h)` and `(out_w, out_h)`.
    ///
    /// Returns `None` for crops without positive area.
    pub fn crop_to_output(crop: &Rect, out_width: u32, out_height: u32) -> Option<Self> {
        if !(crop.width > 0.0 && crop.height > 0.0) || !crop.is_valid() {
            return None;
        }
        let sx = f64::from(out_width) / crop.width;
        let sy = f64::from(out_height) / crop.height;
        Some(Self {
            m: [[sx, 0.0, -crop.x * sx], [0.0, sy, -crop.y * sy]],
        })
    }

    /// Apply the transform to a point.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let [r0, r1] = self.m;
        (
            r0[0] * x + r0[1] * y + r0[2],
            r1[0] * x + r1[1] * y + r1[2],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-9 && (actual.1 - expected.1).abs() < 1e-9,
            "{actual:?} != {expected:?}"
        );
    }

    #[test]
    fn test_crop_corners_map_to_output_corners() {
        let crop = Rect::new(200.0, 150.0, 400.0, 300.0);
        let xfrm = AffineTransform::crop_to_output(&crop, 640, 480).unwrap();

        assert_point(xfrm.apply(200.0, 150.0), (0.0, 0.0));
        assert_point(xfrm.apply(200.0, 450.0), (0.0, 480.0));
        assert_point(xfrm.apply(600.0, 450.0), (640.0, 480.0));
        assert_point(xfrm.apply(600.0, 150.0), (640.0, 0.0));
    }

    #[test]
    fn test_degenerate_crop_has_no_transform() {
        let crop = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert!(AffineTransform::crop_to_output(&crop, 640, 480).is_none());
    }

    #[test]
    fn test_held_flag_omitted_when_false() {
        let record = CropRecord {
            frame: 12,
            crop: Rect::new(1.0, 2.0, 4.0, 3.0),
            held: false,
            detections: 1,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"t\":12"));
        assert!(!json.contains("held"));

        let parsed: CropRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
    }
}
