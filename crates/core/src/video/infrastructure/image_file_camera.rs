use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use super::image_convert::{image_to_frame, resize_exact};
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::video::domain::camera::{CameraDevice, CameraSource};

/// Stands in for physical cameras with still images.
///
/// Camera index `i` selects the `i`-th configured file. The image is
/// decoded once per open, resized to the requested resolution, and then
/// replayed at the requested frame rate.
pub struct ImageFileCamera {
    paths: Vec<PathBuf>,
}

impl ImageFileCamera {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl CameraSource for ImageFileCamera {
    fn open(
        &self,
        index: u32,
        width: u32,
        height: u32,
        fps: u32,
    ) -> Result<Box<dyn CameraDevice>, BoxError> {
        let path = self
            .paths
            .get(index as usize)
            .ok_or_else(|| format!("No image configured for camera {index}"))?;
        let image = image::open(path)
            .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
            .to_rgb8();
        let frame = image_to_frame(resize_exact(image, width, height), 0);

        Ok(Box::new(ImageFileDevice {
            frame,
            interval: Duration::from_secs_f64(1.0 / fps.max(1) as f64),
            next_due: None,
            released: false,
        }))
    }
}

struct ImageFileDevice {
    frame: Frame,
    interval: Duration,
    next_due: Option<Instant>,
    released: bool,
}

impl CameraDevice for ImageFileDevice {
    fn read(&mut self) -> Result<Frame, BoxError> {
        if self.released {
            return Err("Camera already released".into());
        }
        let now = Instant::now();
        let due = match self.next_due {
            Some(due) if due > now => {
                thread::sleep(due - now);
                due
            }
            _ => now,
        };
        self.next_due = Some(due + self.interval);
        Ok(self.frame.clone())
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn write_test_image(dir: &Path, name: &str, width: u32, height: u32, rgb: [u8; 3]) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::from_pixel(width, height, image::Rgb(rgb))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_open_resizes_to_requested_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "cam0.png", 100, 80, [50, 100, 200]);
        let camera = ImageFileCamera::new(vec![path]);

        let mut device = camera.open(0, 32, 24, 30).unwrap();
        let frame = device.read().unwrap();
        assert_eq!((frame.width(), frame.height()), (32, 24));
        assert_eq!(frame.pixel(0, 0), [50, 100, 200]);
    }

    #[test]
    fn test_index_selects_image() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_test_image(dir.path(), "a.png", 8, 8, [1, 1, 1]);
        let second = write_test_image(dir.path(), "b.png", 8, 8, [9, 9, 9]);
        let camera = ImageFileCamera::new(vec![first, second]);

        let mut device = camera.open(1, 8, 8, 30).unwrap();
        assert_eq!(device.read().unwrap().pixel(4, 4), [9, 9, 9]);
    }

    #[test]
    fn test_open_unknown_index_fails() {
        let camera = ImageFileCamera::new(vec![]);
        assert!(camera.open(0, 8, 8, 30).is_err());
    }

    #[test]
    fn test_open_missing_file_fails() {
        let camera = ImageFileCamera::new(vec![PathBuf::from("/nonexistent/cam.png")]);
        assert!(camera.open(0, 8, 8, 30).is_err());
    }

    #[test]
    fn test_reads_are_paced_at_fps() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "cam.png", 4, 4, [0, 0, 0]);
        let mut device = ImageFileCamera::new(vec![path]).open(0, 4, 4, 50).unwrap();

        let start = Instant::now();
        for _ in 0..4 {
            device.read().unwrap();
        }
        // First read is immediate, the next three wait 20 ms each.
        assert!(start.elapsed() >= Duration::from_millis(55));
    }

    #[test]
    fn test_read_after_release_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_test_image(dir.path(), "cam.png", 4, 4, [0, 0, 0]);
        let mut device = ImageFileCamera::new(vec![path]).open(0, 4, 4, 30).unwrap();
        device.release();
        assert!(device.read().is_err());
    }
}
