use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use thiserror::Error;

use super::latest_wins_queue::LatestWinsQueue;
use super::pipeline_stats::{PipelineStats, StatsSnapshot};
use super::stages::{
    self, ErrorCallback, PreviewCallback, SharedDetector, SharedSegmenter, SharedSink,
    StageContext,
};
use crate::detection::domain::face_detector::FaceDetector;
use crate::segmentation::domain::segmenter::Segmenter;
use crate::settings::app_settings::{Settings, SettingsError};
use crate::settings::settings_store::SettingsStore;
use crate::shared::constants::{POP_TIMEOUT, QUEUE_CAPACITY, STOP_JOIN_TIMEOUT};
use crate::shared::error::BoxError;
use crate::video::domain::camera::CameraSource;
use crate::video::domain::output_sink::OutputSink;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("output sink could not be opened: {0}")]
    SinkUnavailable(#[source] BoxError),
    #[error(transparent)]
    InvalidSettings(#[from] SettingsError),
}

/// Lifecycle of a [`LivePipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Stopping,
}

/// Timing and buffering knobs.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub queue_capacity: usize,
    /// Upper bound on how long a stage blocks before re-checking the stop flag.
    pub pop_timeout: Duration,
    /// How long `stop` waits for each stage before detaching it.
    pub join_timeout: Duration,
    /// Pause between failed camera open attempts.
    pub camera_retry_delay: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: QUEUE_CAPACITY,
            pop_timeout: POP_TIMEOUT,
            join_timeout: STOP_JOIN_TIMEOUT,
            camera_retry_delay: POP_TIMEOUT,
        }
    }
}

/// The external services a pipeline drives. All are constructed (and any
/// models loaded) before the pipeline exists.
pub struct Collaborators {
    pub camera: Arc<dyn CameraSource>,
    pub detector: Box<dyn FaceDetector>,
    pub segmenter: Box<dyn Segmenter>,
    pub sink: Box<dyn OutputSink>,
}

/// Optional observers. Both run on the output stage's thread.
#[derive(Clone, Default)]
pub struct PipelineCallbacks {
    pub on_preview: Option<PreviewCallback>,
    pub on_error: Option<ErrorCallback>,
}

struct Worker {
    name: &'static str,
    handle: JoinHandle<()>,
}

/// Capture → process → output over two latest-wins queues.
///
/// Settings may be replaced at any time through [`update_settings`]; each
/// stage reads a fresh snapshot per frame. Dropping the pipeline stops it.
///
/// [`update_settings`]: LivePipeline::update_settings
pub struct LivePipeline {
    settings: Arc<SettingsStore>,
    camera: Arc<dyn CameraSource>,
    detector: SharedDetector,
    segmenter: SharedSegmenter,
    sink: SharedSink,
    callbacks: PipelineCallbacks,
    config: PipelineConfig,
    stop: Arc<AtomicBool>,
    stats: Arc<PipelineStats>,
    state: PipelineState,
    workers: Vec<Worker>,
}

impl LivePipeline {
    pub fn new(
        settings: Settings,
        collaborators: Collaborators,
        callbacks: PipelineCallbacks,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        settings.validate()?;
        Ok(Self {
            settings: Arc::new(SettingsStore::new(settings)),
            camera: collaborators.camera,
            detector: Arc::new(Mutex::new(collaborators.detector)),
            segmenter: Arc::new(Mutex::new(collaborators.segmenter)),
            sink: Arc::new(Mutex::new(collaborators.sink)),
            callbacks,
            config,
            stop: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(PipelineStats::new()),
            state: PipelineState::Idle,
            workers: Vec::new(),
        })
    }

    /// Opens the output sink and launches the three stages.
    ///
    /// A no-op while already running. If a sink failure ended the previous
    /// run, that run is shut down first and a fresh one started.
    pub fn start(&mut self) -> Result<(), PipelineError> {
        if self.state == PipelineState::Running {
            if !self.stop.load(Ordering::Relaxed) {
                return Ok(());
            }
            self.stop();
        }

        let settings = self.settings.snapshot();
        stages::lock(&self.sink)
            .open(
                settings.output_width,
                settings.output_height,
                settings.output_fps,
            )
            .map_err(PipelineError::SinkUnavailable)?;
        log::info!(
            "Output sink opened at {}x{}@{}",
            settings.output_width,
            settings.output_height,
            settings.output_fps
        );

        // Stages detached by an earlier stop keep their own flag and exit.
        self.stop = Arc::new(AtomicBool::new(false));
        self.stats.reset();

        let frames = Arc::new(LatestWinsQueue::new(self.config.queue_capacity));
        let processed = Arc::new(LatestWinsQueue::new(self.config.queue_capacity));
        let ctx = StageContext {
            settings: self.settings.clone(),
            stop: self.stop.clone(),
            stats: self.stats.clone(),
            pop_timeout: self.config.pop_timeout,
        };

        self.workers = vec![
            Worker {
                name: "capture",
                handle: stages::spawn_capture(
                    ctx.clone(),
                    self.camera.clone(),
                    frames.clone(),
                    self.config.camera_retry_delay,
                ),
            },
            Worker {
                name: "process",
                handle: stages::spawn_processor(
                    ctx.clone(),
                    self.detector.clone(),
                    self.segmenter.clone(),
                    frames,
                    processed.clone(),
                ),
            },
            Worker {
                name: "output",
                handle: stages::spawn_output(
                    ctx,
                    self.sink.clone(),
                    processed,
                    self.callbacks.on_preview.clone(),
                    self.callbacks.on_error.clone(),
                ),
            },
        ];

        self.state = PipelineState::Running;
        log::info!("Pipeline started");
        Ok(())
    }

    /// Signals every stage, waits a bounded time for each, then closes the
    /// sink. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if self.state == PipelineState::Idle {
            return;
        }
        self.state = PipelineState::Stopping;
        self.stop.store(true, Ordering::Relaxed);

        for worker in self.workers.drain(..) {
            stages::join_with_timeout(worker.name, worker.handle, self.config.join_timeout);
        }

        stages::lock(&self.sink).close();
        log::info!("Pipeline stopped");
        if let Some(summary) = self.stats.summary_string() {
            log::info!("\n{summary}");
        }
        self.state = PipelineState::Idle;
    }

    /// Replaces the policy; stages pick it up on their next frame.
    pub fn update_settings(&self, settings: Settings) -> Result<(), SettingsError> {
        settings.validate()?;
        log::debug!("Settings updated: {settings:?}");
        self.settings.replace(settings);
        Ok(())
    }

    pub fn settings(&self) -> Arc<Settings> {
        self.settings.snapshot()
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// False once `stop` was called or a sink failure halted the stages.
    pub fn is_running(&self) -> bool {
        self.state == PipelineState::Running && !self.stop.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Human-readable report of the current or most recent run.
    pub fn summary(&self) -> Option<String> {
        self.stats.summary_string()
    }
}

impl Drop for LivePipeline {
    fn drop(&mut self) {
        self.stop();
    }
}
