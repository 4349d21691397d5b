use std::path::{Path, PathBuf};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};

use privacy_cam_core::detection::domain::face_detector::FaceDetector;
use privacy_cam_core::detection::infrastructure::static_face_detector::StaticFaceDetector;
use privacy_cam_core::masking::background_masker::BackgroundMasker;
use privacy_cam_core::masking::face_privacy_masker::FacePrivacyMasker;
use privacy_cam_core::pipeline::live_pipeline::{
    Collaborators, LivePipeline, PipelineCallbacks, PipelineConfig,
};
use privacy_cam_core::pipeline::ErrorCallback;
use privacy_cam_core::segmentation::domain::segmenter::Segmenter;
use privacy_cam_core::segmentation::infrastructure::mask_image_segmenter::{
    FullForegroundSegmenter, MaskImageSegmenter,
};
use privacy_cam_core::settings::app_settings::{PrivacyMode, Settings, ThirdPartyMode};
use privacy_cam_core::settings::presets::{
    default_presets_path, find_preset, load_presets, Preset,
};
use privacy_cam_core::shared::constants::IMAGE_EXTENSIONS;
use privacy_cam_core::shared::error::BoxError;
use privacy_cam_core::video::infrastructure::image_convert::{load_frame, save_frame};
use privacy_cam_core::video::infrastructure::image_file_camera::ImageFileCamera;
use privacy_cam_core::video::infrastructure::image_sequence_sink::ImageSequenceSink;

/// Face and background privacy masking for camera frames.
#[derive(Parser)]
#[command(name = "privacy-cam")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List saved presets, creating the defaults if none exist yet.
    Presets {
        /// Presets file (defaults to the user config directory).
        #[arg(long)]
        path: Option<PathBuf>,

        /// Print the presets as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Mask a single still image.
    Apply {
        /// Input image file.
        input: PathBuf,

        /// Output image file.
        output: PathBuf,

        #[command(flatten)]
        sources: Sources,

        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Run the live pipeline with image files standing in for cameras.
    Stream {
        /// Image per camera index (first file is camera 0).
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,

        /// Directory receiving the numbered output frames.
        #[arg(long)]
        output_dir: PathBuf,

        /// How long to run before stopping.
        #[arg(long, default_value = "5")]
        seconds: f64,

        #[command(flatten)]
        sources: Sources,

        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args)]
struct Sources {
    /// JSON list of face boxes reported for every frame.
    #[arg(long)]
    faces: Option<PathBuf>,

    /// Grayscale person mask (white = foreground).
    #[arg(long)]
    mask: Option<PathBuf>,
}

#[derive(Args)]
struct PolicyArgs {
    /// Start from a named preset instead of the defaults.
    #[arg(long)]
    preset: Option<String>,

    /// Presets file used to resolve --preset.
    #[arg(long)]
    presets: Option<PathBuf>,

    /// Camera index.
    #[arg(long)]
    camera: Option<u32>,

    /// Rank of the owner's face among detections.
    #[arg(long)]
    owner: Option<usize>,

    /// Face treatment: square_2d or blur_3d.
    #[arg(long)]
    privacy_mode: Option<PrivacyMode>,

    /// Faces to hide: hide_others, hide_owner or hide_all.
    #[arg(long)]
    third_party_mode: Option<ThirdPartyMode>,

    /// Blur the background (true/false).
    #[arg(long)]
    background_blur: Option<bool>,

    /// Replace the background with a flat color (true/false).
    #[arg(long)]
    background_replace: Option<bool>,

    /// Background blur kernel size (even values are rounded up).
    #[arg(long)]
    blur_strength: Option<u32>,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Output frame rate.
    #[arg(long)]
    fps: Option<u32>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), BoxError> {
    match Cli::parse().command {
        Command::Presets { path, json } => run_presets(path, json),
        Command::Apply {
            input,
            output,
            sources,
            policy,
        } => {
            validate_apply(&input, &output)?;
            let settings = resolve_settings(&policy)?;
            run_apply(&input, &output, &sources, &settings)
        }
        Command::Stream {
            input,
            output_dir,
            seconds,
            sources,
            policy,
        } => {
            validate_stream(&input, seconds)?;
            let settings = resolve_settings(&policy)?;
            run_stream(input, output_dir, seconds, &sources, settings)
        }
    }
}

fn run_presets(path: Option<PathBuf>, json: bool) -> Result<(), BoxError> {
    let path = presets_path(path)?;
    let presets = load_presets(&path)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&presets)?);
        return Ok(());
    }
    println!("Presets in {}:", path.display());
    for preset in &presets {
        println!("  {}", describe(preset));
    }
    Ok(())
}

fn run_apply(
    input: &Path,
    output: &Path,
    sources: &Sources,
    settings: &Settings,
) -> Result<(), BoxError> {
    let frame = load_frame(input)?;
    let mut detector = build_detector(sources)?;
    let mut segmenter = build_segmenter(sources)?;

    let faces = detector.detect(&frame)?;
    log::info!("{} face(s) in {}", faces.len(), input.display());
    let masked = FacePrivacyMasker::new().apply(&frame, &faces, settings);
    let result = if settings.background_enabled() {
        let segmentation = segmenter.segment(&masked)?;
        BackgroundMasker::new().apply(&masked, &segmentation, settings)?
    } else {
        masked
    };

    save_frame(output, &result)?;
    log::info!("Output written to {}", output.display());
    Ok(())
}

fn run_stream(
    inputs: Vec<PathBuf>,
    output_dir: PathBuf,
    seconds: f64,
    sources: &Sources,
    settings: Settings,
) -> Result<(), BoxError> {
    let failed = Arc::new(AtomicBool::new(false));
    let on_error: ErrorCallback = {
        let failed = failed.clone();
        Arc::new(move |message: String| {
            eprintln!("\n{message}");
            failed.store(true, Ordering::Relaxed);
        })
    };

    let collaborators = Collaborators {
        camera: Arc::new(ImageFileCamera::new(inputs)),
        detector: build_detector(sources)?,
        segmenter: build_segmenter(sources)?,
        sink: Box::new(ImageSequenceSink::new(&output_dir)),
    };
    let callbacks = PipelineCallbacks {
        on_preview: None,
        on_error: Some(on_error),
    };
    let mut pipeline =
        LivePipeline::new(settings, collaborators, callbacks, PipelineConfig::default())?;

    pipeline.start()?;
    let deadline = Instant::now() + Duration::from_secs_f64(seconds);
    while Instant::now() < deadline && pipeline.is_running() {
        eprint!("\rStreaming... {} frames written", pipeline.stats().output);
        thread::sleep(Duration::from_millis(100));
    }
    pipeline.stop();
    eprintln!();

    if let Some(summary) = pipeline.summary() {
        println!("{summary}");
    }
    if failed.load(Ordering::Relaxed) {
        return Err("Pipeline stopped after an output failure".into());
    }
    log::info!("Frames written to {}", output_dir.display());
    Ok(())
}

fn build_detector(sources: &Sources) -> Result<Box<dyn FaceDetector>, BoxError> {
    let detector = match &sources.faces {
        Some(path) => StaticFaceDetector::load(path)?,
        None => StaticFaceDetector::empty(),
    };
    Ok(Box::new(detector))
}

fn build_segmenter(sources: &Sources) -> Result<Box<dyn Segmenter>, BoxError> {
    match &sources.mask {
        Some(path) => Ok(Box::new(MaskImageSegmenter::load(path)?)),
        None => Ok(Box::new(FullForegroundSegmenter)),
    }
}

fn presets_path(path: Option<PathBuf>) -> Result<PathBuf, BoxError> {
    match path {
        Some(path) => Ok(path),
        None => Ok(default_presets_path()?),
    }
}

fn resolve_settings(policy: &PolicyArgs) -> Result<Settings, BoxError> {
    let mut settings = match &policy.preset {
        Some(name) => {
            let path = presets_path(policy.presets.clone())?;
            let presets = load_presets(&path)?;
            match find_preset(&presets, name) {
                Some(preset) => preset.settings.clone(),
                None => {
                    let names: Vec<&str> = presets.iter().map(|p| p.name.as_str()).collect();
                    return Err(format!(
                        "Unknown preset '{name}'; available: {}",
                        names.join(", ")
                    )
                    .into());
                }
            }
        }
        None => Settings::default(),
    };

    apply_overrides(&mut settings, policy);
    settings.validate()?;
    Ok(settings)
}

fn apply_overrides(settings: &mut Settings, policy: &PolicyArgs) {
    if let Some(v) = policy.camera {
        settings.camera_index = v;
    }
    if let Some(v) = policy.owner {
        settings.owner_face_index = v;
    }
    if let Some(v) = policy.privacy_mode {
        settings.privacy_mode = v;
    }
    if let Some(v) = policy.third_party_mode {
        settings.third_party_mode = v;
    }
    if let Some(v) = policy.background_blur {
        settings.enable_background_blur = v;
    }
    if let Some(v) = policy.background_replace {
        settings.enable_background_replace = v;
    }
    if let Some(v) = policy.blur_strength {
        settings.background_blur_strength = v;
    }
    if let Some(v) = policy.width {
        settings.output_width = v;
    }
    if let Some(v) = policy.height {
        settings.output_height = v;
    }
    if let Some(v) = policy.fps {
        settings.output_fps = v;
    }
}

fn validate_apply(input: &Path, output: &Path) -> Result<(), BoxError> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }
    for path in [input, output] {
        if !is_image(path) {
            return Err(format!(
                "Unsupported image format: {} (expected one of: {})",
                path.display(),
                IMAGE_EXTENSIONS.join(", ")
            )
            .into());
        }
    }
    Ok(())
}

fn validate_stream(inputs: &[PathBuf], seconds: f64) -> Result<(), BoxError> {
    for input in inputs {
        if !input.exists() {
            return Err(format!("Input file not found: {}", input.display()).into());
        }
    }
    if !(seconds > 0.0 && seconds.is_finite()) {
        return Err(format!("Seconds must be positive, got {seconds}").into());
    }
    Ok(())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn describe(preset: &Preset) -> String {
    let s = &preset.settings;
    let mut background = Vec::new();
    if s.enable_background_blur {
        background.push(format!("blur {}", s.effective_blur_strength()));
    }
    if s.enable_background_replace {
        background.push("replace".to_string());
    }
    let background = if background.is_empty() {
        "off".to_string()
    } else {
        background.join(" + ")
    };
    format!(
        "{}: {} / {}, background {}, camera {}, owner {}, {}x{}@{}",
        preset.name,
        s.privacy_mode,
        s.third_party_mode,
        background,
        s.camera_index,
        s.owner_face_index,
        s.output_width,
        s.output_height,
        s.output_fps
    )
}
