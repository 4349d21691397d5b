use std::path::Path;

use image::imageops::{self, FilterType};
use image::GrayImage;

use crate::segmentation::domain::segmentation::Segmentation;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

/// Serves a fixed grayscale mask as the person segmentation.
///
/// Luma 255 is certain foreground, 0 certain background. The mask is
/// resized to each frame; the last resized result is reused while the
/// frame size stays the same.
pub struct MaskImageSegmenter {
    mask: GrayImage,
    cached: Option<Segmentation>,
}

impl MaskImageSegmenter {
    pub fn new(mask: GrayImage) -> Self {
        Self { mask, cached: None }
    }

    pub fn load(path: &Path) -> Result<Self, BoxError> {
        let mask = image::open(path)
            .map_err(|e| format!("Failed to open mask {}: {e}", path.display()))?
            .to_luma8();
        Ok(Self::new(mask))
    }

    fn build(&self, width: u32, height: u32) -> Result<Segmentation, BoxError> {
        let resized = if self.mask.dimensions() == (width, height) {
            self.mask.clone()
        } else {
            imageops::resize(&self.mask, width, height, FilterType::Triangle)
        };
        let probabilities = resized
            .into_raw()
            .into_iter()
            .map(|luma| luma as f32 / 255.0)
            .collect();
        Segmentation::from_vec(width, height, probabilities)
            .ok_or_else(|| "Resized mask does not match frame size".into())
    }
}

impl Segmenter for MaskImageSegmenter {
    fn segment(&mut self, frame: &Frame) -> Result<Segmentation, BoxError> {
        let size = (frame.width(), frame.height());
        if let Some(cached) = &self.cached {
            if (cached.width(), cached.height()) == size {
                return Ok(cached.clone());
            }
        }
        let segmentation = self.build(size.0, size.1)?;
        self.cached = Some(segmentation.clone());
        Ok(segmentation)
    }
}

/// Marks every pixel as foreground, so background masking never changes
/// a frame.
pub struct FullForegroundSegmenter;

impl Segmenter for FullForegroundSegmenter {
    fn segment(&mut self, frame: &Frame) -> Result<Segmentation, BoxError> {
        Ok(Segmentation::uniform(frame.width(), frame.height(), 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Left half white (foreground), right half black.
    fn half_mask(width: u32, height: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, _| {
            if x < width / 2 {
                image::Luma([255])
            } else {
                image::Luma([0])
            }
        })
    }

    #[test]
    fn test_luma_maps_to_probability() {
        let mask = GrayImage::from_fn(2, 1, |x, _| image::Luma([if x == 0 { 255 } else { 51 }]));
        let mut segmenter = MaskImageSegmenter::new(mask);
        let seg = segmenter.segment(&Frame::filled(2, 1, [0, 0, 0], 0)).unwrap();
        assert_relative_eq!(seg.probabilities()[[0, 0]], 1.0);
        assert_relative_eq!(seg.probabilities()[[0, 1]], 0.2);
    }

    #[test]
    fn test_mask_resized_to_frame() {
        let mut segmenter = MaskImageSegmenter::new(half_mask(64, 32));
        let seg = segmenter.segment(&Frame::filled(16, 8, [0, 0, 0], 0)).unwrap();
        assert_eq!((seg.width(), seg.height()), (16, 8));

        let fg = seg.foreground_mask();
        assert!(fg[[4, 1]]);
        assert!(!fg[[4, 14]]);
    }

    #[test]
    fn test_cache_follows_frame_size() {
        let mut segmenter = MaskImageSegmenter::new(half_mask(8, 8));
        let small = segmenter.segment(&Frame::filled(4, 4, [0, 0, 0], 0)).unwrap();
        let again = segmenter.segment(&Frame::filled(4, 4, [9, 9, 9], 1)).unwrap();
        assert_eq!(small, again);

        let large = segmenter.segment(&Frame::filled(12, 6, [0, 0, 0], 2)).unwrap();
        assert_eq!((large.width(), large.height()), (12, 6));
    }

    #[test]
    fn test_load_missing_mask_is_error() {
        assert!(MaskImageSegmenter::load(Path::new("/nonexistent/mask.png")).is_err());
    }

    #[test]
    fn test_load_reads_grayscale_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.png");
        half_mask(10, 10).save(&path).unwrap();
        let mut segmenter = MaskImageSegmenter::load(&path).unwrap();
        let seg = segmenter.segment(&Frame::filled(10, 10, [0, 0, 0], 0)).unwrap();
        assert!(seg.foreground_mask()[[5, 0]]);
        assert!(!seg.foreground_mask()[[5, 9]]);
    }

    #[test]
    fn test_full_foreground() {
        let seg = FullForegroundSegmenter
            .segment(&Frame::filled(3, 2, [0, 0, 0], 0))
            .unwrap();
        assert_eq!((seg.width(), seg.height()), (3, 2));
        assert!(seg.foreground_mask().iter().all(|&fg| fg));
    }
}
