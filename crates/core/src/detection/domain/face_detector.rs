use crate::detection::domain::face_detection::FaceDetection;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Face-landmark provider consumed by the processing stage.
///
/// Results are in the provider's native detection order; that order is
/// the rank used to pick the owner. Implementations may be stateful
/// (e.g. tracking across frames), hence `&mut self`. Backend selection
/// and model loading happen when the implementation is constructed.
pub trait FaceDetector: Send {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceDetection>, BoxError>;
}
