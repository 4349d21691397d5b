use std::path::PathBuf;

use super::image_convert::{frame_to_image, resize_exact};
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::video::domain::output_sink::OutputSink;

/// Writes each output frame as `frame_NNNNNN.png` into a directory.
///
/// Frames whose size differs from the one given to `open` are resized to
/// it, so a sequence never mixes resolutions.
pub struct ImageSequenceSink {
    dir: PathBuf,
    next: u64,
    /// Opened width and height; `None` while closed.
    size: Option<(u32, u32)>,
}

impl ImageSequenceSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            next: 0,
            size: None,
        }
    }

    fn frame_path(&self, n: u64) -> PathBuf {
        self.dir.join(format!("frame_{n:06}.png"))
    }
}

impl OutputSink for ImageSequenceSink {
    fn open(&mut self, width: u32, height: u32, fps: u32) -> Result<(), BoxError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| format!("Failed to create {}: {e}", self.dir.display()))?;
        self.next = 0;
        self.size = Some((width, height));
        log::debug!(
            "Writing {width}x{height}@{fps} frames to {}",
            self.dir.display()
        );
        Ok(())
    }

    fn send(&mut self, frame: &Frame) -> Result<(), BoxError> {
        let Some((width, height)) = self.size else {
            return Err("Image sequence sink is not open".into());
        };
        let path = self.frame_path(self.next);
        resize_exact(frame_to_image(frame)?, width, height).save(&path)?;
        self.next += 1;
        Ok(())
    }

    fn close(&mut self) {
        if self.size.take().is_some() {
            log::debug!("Wrote {} frames to {}", self.next, self.dir.display());
        }
    }
}
