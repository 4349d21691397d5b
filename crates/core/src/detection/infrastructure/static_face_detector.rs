use std::path::Path;

use crate::detection::domain::face_detection::FaceDetection;
use crate::detection::domain::face_detector::FaceDetector;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Reports the same faces for every frame.
///
/// Loaded from a JSON array of `{ "x1", "y1", "x2", "y2", "depth" }`
/// records, in rank order.
pub struct StaticFaceDetector {
    faces: Vec<FaceDetection>,
}

impl StaticFaceDetector {
    pub fn new(faces: Vec<FaceDetection>) -> Self {
        Self { faces }
    }

    /// A detector that never finds a face.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json).map(Self::new)
    }

    pub fn load(path: &Path) -> Result<Self, BoxError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
        let detector = Self::from_json(&json)
            .map_err(|e| format!("Malformed face list {}: {e}", path.display()))?;
        log::info!(
            "Loaded {} face(s) from {}",
            detector.faces.len(),
            path.display()
        );
        Ok(detector)
    }

    pub fn faces(&self) -> &[FaceDetection] {
        &self.faces
    }
}

impl FaceDetector for StaticFaceDetector {
    fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceDetection>, BoxError> {
        Ok(self.faces.clone())
    }
}
