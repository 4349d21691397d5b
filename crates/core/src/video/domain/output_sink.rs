use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Publishes processed frames to downstream consumers (e.g. a virtual
/// camera device).
///
/// Opened by the pipeline controller on `start`, written by the output
/// stage, closed on `stop`. A `send` failure stops the pipeline.
pub trait OutputSink: Send {
    fn open(&mut self, width: u32, height: u32, fps: u32) -> Result<(), BoxError>;

    fn send(&mut self, frame: &Frame) -> Result<(), BoxError>;

    fn close(&mut self);
}
