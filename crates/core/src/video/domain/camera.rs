use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Opens camera devices by index.
///
/// Open failures are treated as transient by the capture stage, which
/// keeps retrying; device-specific error codes are never interpreted.
pub trait CameraSource: Send + Sync {
    fn open(
        &self,
        index: u32,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Box<dyn CameraDevice>, BoxError>;
}

/// An open camera handle, owned by the capture stage for its lifetime.
pub trait CameraDevice: Send {
    fn read(&mut self) -> Result<Frame, BoxError>;

    /// Releases the underlying device. Called exactly once per handle.
    fn release(&mut self);
}
