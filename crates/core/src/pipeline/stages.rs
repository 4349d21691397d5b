//! Worker loops for the three pipeline stages.
//!
//! Layout: `camera → capture → [queue] → process → [queue] → output → sink`
//!
//! Each stage polls the shared stop flag at the top of its loop and only
//! blocks on a bounded `pop`, so a stop request is honored within one
//! pop timeout.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::detection::domain::face_detector::FaceDetector;
use crate::masking::background_masker::BackgroundMasker;
use crate::masking::face_privacy_masker::FacePrivacyMasker;
use crate::pipeline::latest_wins_queue::LatestWinsQueue;
use crate::pipeline::pipeline_stats::PipelineStats;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::settings::app_settings::Settings;
use crate::settings::settings_store::SettingsStore;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::video::domain::camera::{CameraDevice, CameraSource};
use crate::video::domain::output_sink::OutputSink;

/// Receives each frame successfully handed to the output sink.
pub type PreviewCallback = Arc<dyn Fn(Frame) + Send + Sync>;
/// Receives the message of a fatal output failure, at most once per run.
pub type ErrorCallback = Arc<dyn Fn(String) + Send + Sync>;

pub(crate) type SharedDetector = Arc<Mutex<Box<dyn FaceDetector>>>;
pub(crate) type SharedSegmenter = Arc<Mutex<Box<dyn Segmenter>>>;
pub(crate) type SharedSink = Arc<Mutex<Box<dyn OutputSink>>>;
pub(crate) type FrameQueue = Arc<LatestWinsQueue<Frame>>;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// State every stage shares for one run.
#[derive(Clone)]
pub(crate) struct StageContext {
    pub settings: Arc<SettingsStore>,
    pub stop: Arc<AtomicBool>,
    pub stats: Arc<PipelineStats>,
    pub pop_timeout: Duration,
}

impl StageContext {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    /// Sleeps up to `duration`, waking early if the stop flag is raised.
    fn sleep_unless_stopped(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::sleep((deadline - now).min(STOP_POLL_INTERVAL));
        }
    }
}

/// Locks a collaborator, recovering it if a previous holder panicked.
pub(crate) fn lock<T: ?Sized>(mutex: &Mutex<Box<T>>) -> MutexGuard<'_, Box<T>> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// An open camera; dropping it releases the device, on every exit path.
struct OpenCamera {
    index: u32,
    device: Box<dyn CameraDevice>,
}

impl Drop for OpenCamera {
    fn drop(&mut self) {
        self.device.release();
        log::info!("Released camera {}", self.index);
    }
}

pub(crate) fn spawn_capture(
    ctx: StageContext,
    camera: Arc<dyn CameraSource>,
    frames: FrameQueue,
    reopen_delay: Duration,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut open: Option<OpenCamera> = None;
        let mut sequence: u64 = 0;

        while !ctx.stopped() {
            let settings = ctx.settings.snapshot();

            if open.as_ref().map(|c| c.index) != Some(settings.camera_index) {
                // Release the old handle before asking for a new one.
                open = None;
                match camera.open(
                    settings.camera_index,
                    settings.output_width,
                    settings.output_height,
                    settings.output_fps,
                ) {
                    Ok(device) => {
                        log::info!(
                            "Opened camera {} at {}x{}@{}",
                            settings.camera_index,
                            settings.output_width,
                            settings.output_height,
                            settings.output_fps
                        );
                        open = Some(OpenCamera {
                            index: settings.camera_index,
                            device,
                        });
                    }
                    Err(e) => {
                        log::debug!("Camera {} open failed: {e}", settings.camera_index);
                        ctx.sleep_unless_stopped(reopen_delay);
                        continue;
                    }
                }
            }

            let Some(cam) = open.as_mut() else {
                continue;
            };
            match cam.device.read() {
                Ok(frame) => {
                    let evicted = frames.push(frame.with_index(sequence));
                    sequence += 1;
                    ctx.stats.record_captured(evicted);
                }
                Err(e) => log::debug!("Camera {} read failed: {e}", cam.index),
            }
        }
    })
}

pub(crate) fn spawn_processor(
    ctx: StageContext,
    detector: SharedDetector,
    segmenter: SharedSegmenter,
    frames: FrameQueue,
    processed: FrameQueue,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let face_masker = FacePrivacyMasker::new();
        let background_masker = BackgroundMasker::new();

        while !ctx.stopped() {
            let Some(frame) = frames.pop(ctx.pop_timeout) else {
                continue;
            };
            let settings = ctx.settings.snapshot();

            match process_frame(
                &frame,
                &settings,
                &detector,
                &segmenter,
                &face_masker,
                &background_masker,
            ) {
                Ok(result) => {
                    let evicted = processed.push(result);
                    ctx.stats.record_processed(evicted);
                }
                Err(e) => {
                    // Never forward a frame the policy could not be applied to.
                    log::warn!("Dropping frame {}: {e}", frame.index());
                    ctx.stats.record_dropped();
                }
            }
        }
    })
}

/// Face masking then background masking for one frame.
///
/// Segmentation sees the face-masked frame, and runs only when the
/// policy needs it.
pub(crate) fn process_frame(
    frame: &Frame,
    settings: &Settings,
    detector: &Mutex<Box<dyn FaceDetector>>,
    segmenter: &Mutex<Box<dyn Segmenter>>,
    face_masker: &FacePrivacyMasker,
    background_masker: &BackgroundMasker,
) -> Result<Frame, BoxError> {
    let faces = lock(detector).detect(frame)?;
    let masked = face_masker.apply(frame, &faces, settings);
    if !settings.background_enabled() {
        return Ok(masked);
    }
    let segmentation = lock(segmenter).segment(&masked)?;
    Ok(background_masker.apply(&masked, &segmentation, settings)?)
}

pub(crate) fn spawn_output(
    ctx: StageContext,
    sink: SharedSink,
    processed: FrameQueue,
    on_preview: Option<PreviewCallback>,
    on_error: Option<ErrorCallback>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        while !ctx.stopped() {
            let Some(frame) = processed.pop(ctx.pop_timeout) else {
                continue;
            };

            if let Err(e) = lock(&sink).send(&frame) {
                ctx.stop.store(true, Ordering::Relaxed);
                let message = format!("Output sink failure: {e}");
                log::error!("{message}");
                if let Some(callback) = &on_error {
                    callback(message);
                }
                return;
            }
            ctx.stats.record_output();

            if let Some(callback) = &on_preview {
                deliver_preview(callback, frame);
            }
        }
    })
}

fn deliver_preview(callback: &PreviewCallback, frame: Frame) {
    let index = frame.index();
    if panic::catch_unwind(AssertUnwindSafe(|| callback(frame))).is_err() {
        log::warn!("Preview callback panicked on frame {index}");
    }
}

/// Waits up to `timeout` for a worker; a worker still running afterwards
/// is detached and left to observe the stop flag on its own.
pub(crate) fn join_with_timeout(name: &str, handle: JoinHandle<()>, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            log::warn!("{name} stage did not stop within {timeout:?}; detaching");
            return;
        }
        thread::sleep(STOP_POLL_INTERVAL);
    }
    if handle.join().is_err() {
        log::warn!("{name} stage panicked");
    }
}
