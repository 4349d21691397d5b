use std::time::Duration;

/// Slots in each inter-stage queue; older frames are evicted beyond this.
pub const QUEUE_CAPACITY: usize = 2;

/// How long a stage waits on its input queue before re-checking the stop flag.
pub const POP_TIMEOUT: Duration = Duration::from_millis(100);

/// Per-stage bound on how long `stop()` waits for a worker to finish.
pub const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Gaussian kernel used for blurred faces, independent of background blur strength.
pub const FACE_BLUR_KERNEL_SIZE: usize = 51;

/// Occlusion boxes grow by `1 + |depth| * DEPTH_SCALE_FACTOR`, clamped to this range.
pub const DEPTH_SCALE_FACTOR: f64 = 4.0;
pub const MIN_DEPTH_SCALE: f64 = 1.0;
pub const MAX_DEPTH_SCALE: f64 = 1.8;

/// Largest accepted background blur kernel size.
pub const MAX_BLUR_STRENGTH: u32 = 255;

/// Segmentation probability above which a pixel counts as foreground.
pub const FOREGROUND_THRESHOLD: f32 = 0.5;

/// Flat fill used when the background is replaced.
pub const BACKGROUND_REPLACE_COLOR: [u8; 3] = [30, 30, 30];

/// Fill used for `square_2d` face masking.
pub const FACE_FILL_COLOR: [u8; 3] = [0, 0, 0];

pub const PRESETS_DIR_NAME: &str = "SmartPrivacyCam";
pub const PRESETS_FILE_NAME: &str = "presets.json";

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff", "tif", "webp"];
