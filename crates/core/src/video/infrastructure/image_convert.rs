use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

pub fn frame_to_image(frame: &Frame) -> Result<RgbImage, BoxError> {
    RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or_else(|| "Failed to create image from frame data".into())
}

pub fn image_to_frame(image: RgbImage, index: u64) -> Frame {
    let (width, height) = image.dimensions();
    Frame::new(image.into_raw(), width, height, index)
}

/// Decodes any image file the `image` crate understands into an RGB frame.
pub fn load_frame(path: &Path) -> Result<Frame, BoxError> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .to_rgb8();
    Ok(image_to_frame(image, 0))
}

/// Encodes `frame` to `path`, picking the format from the extension.
pub fn save_frame(path: &Path, frame: &Frame) -> Result<(), BoxError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    frame_to_image(frame)?.save(path)?;
    Ok(())
}

/// Resizes to exactly `width` x `height`, skipping the work when the size
/// already matches.
pub fn resize_exact(image: RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        image
    } else {
        imageops::resize(&image, width, height, FilterType::Triangle)
    }
}
