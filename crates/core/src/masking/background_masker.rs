use std::cell::RefCell;

use ndarray::{Axis, Zip};
use thiserror::Error;

use super::gaussian::GaussianBlur;
use crate::segmentation::domain::segmentation::Segmentation;
use crate::settings::app_settings::Settings;
use crate::shared::constants::BACKGROUND_REPLACE_COLOR;
use crate::shared::frame::Frame;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MaskingError {
    #[error("segmentation is {actual:?} but frame is {expected:?} (width, height)")]
    SegmentationShape {
        expected: (u32, u32),
        actual: (u32, u32),
    },
}

/// Blurs or replaces every pixel the segmentation marks as background.
///
/// Foreground pixels are never touched. With both options enabled the
/// flat replacement color wins over the blur.
pub struct BackgroundMasker {
    // Rebuilt only when the blur strength changes between frames.
    blur: RefCell<Option<GaussianBlur>>,
}

impl BackgroundMasker {
    pub fn new() -> Self {
        Self {
            blur: RefCell::new(None),
        }
    }

    /// Returns a new frame with the background treated per `settings`.
    ///
    /// When neither blur nor replace is enabled the input comes back
    /// unchanged; callers should skip segmentation entirely in that case.
    pub fn apply(
        &self,
        frame: &Frame,
        segmentation: &Segmentation,
        settings: &Settings,
    ) -> Result<Frame, MaskingError> {
        if !settings.background_enabled() {
            return Ok(frame.clone());
        }

        let expected = (frame.width(), frame.height());
        let actual = (segmentation.width(), segmentation.height());
        if expected != actual {
            return Err(MaskingError::SegmentationShape { expected, actual });
        }

        let foreground = segmentation.foreground_mask();
        let mut output = frame.clone();

        if settings.enable_background_blur {
            let blurred = self.blurred(frame, settings.effective_blur_strength());
            Zip::from(output.as_ndarray_mut().lanes_mut(Axis(2)))
                .and(blurred.as_ndarray().lanes(Axis(2)))
                .and(&foreground)
                .for_each(|mut px, src, &is_fg| {
                    if !is_fg {
                        px.assign(&src);
                    }
                });
        }

        if settings.enable_background_replace {
            Zip::from(output.as_ndarray_mut().lanes_mut(Axis(2)))
                .and(&foreground)
                .for_each(|mut px, &is_fg| {
                    if !is_fg {
                        for (c, v) in px.iter_mut().zip(BACKGROUND_REPLACE_COLOR) {
                            *c = v;
                        }
                    }
                });
        }

        Ok(output)
    }

    fn blurred(&self, frame: &Frame, kernel_size: usize) -> Frame {
        let mut cached = self.blur.borrow_mut();
        if cached.as_ref().map(GaussianBlur::kernel_size) != Some(kernel_size) {
            *cached = Some(GaussianBlur::new(kernel_size));
        }
        match cached.as_ref() {
            Some(blur) => blur.blur_frame(frame),
            None => frame.clone(),
        }
    }
}

impl Default for BackgroundMasker {
    fn default() -> Self {
        Self::new()
    }
}
