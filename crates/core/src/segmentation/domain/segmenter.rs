use crate::segmentation::domain::segmentation::Segmentation;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Person-segmentation provider consumed by the processing stage.
///
/// Only invoked when the policy enables background blur or replacement.
pub trait Segmenter: Send {
    fn segment(&mut self, frame: &Frame) -> Result<Segmentation, BoxError>;
}
