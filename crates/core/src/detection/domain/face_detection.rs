use serde::{Deserialize, Serialize};

use crate::shared::bounding_box::BoundingBox;

/// One detected face: its box in frame pixels and a depth estimate.
///
/// `depth` is the mean landmark depth; larger magnitude means closer to
/// the camera.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FaceDetection {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    #[serde(default)]
    pub depth: f32,
}

impl FaceDetection {
    pub fn new(bbox: BoundingBox, depth: f32) -> Self {
        Self { bbox, depth }
    }

    /// Builds a record from normalized `(x, y, z)` landmarks.
    ///
    /// `x`/`y` are fractions of the frame size; the box spans the landmark
    /// extremes and is clamped to the frame. Returns `None` when there are
    /// no landmarks.
    pub fn from_normalized_landmarks(
        points: &[(f32, f32, f32)],
        width: u32,
        height: u32,
    ) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        let mut depth_sum = 0.0f64;
        for &(x, y, z) in points {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
            depth_sum += z as f64;
        }

        let w = width as f32;
        let h = height as f32;
        let bbox = BoundingBox::new(
            (min_x * w).floor() as i32,
            (min_y * h).floor() as i32,
            (max_x * w).ceil() as i32,
            (max_y * h).ceil() as i32,
        )
        .clamp_to(width, height);

        Some(Self {
            bbox,
            depth: (depth_sum / points.len() as f64) as f32,
        })
    }
}
