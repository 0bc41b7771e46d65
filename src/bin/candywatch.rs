//! candywatch - interactive candy detection over a frame source
//!
//! Pulls frames from an image, folder, video or camera source, runs the
//! detector, scores each frame against the nutrition table and renders the
//! overlay. Commands on stdin: q quit, s pause/step, p snapshot, t toggle
//! overlay.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use candy_kernel::config::{parse_resolution, PipelineConfig, DEFAULT_THRESHOLD};
use candy_kernel::detect::open_model;
use candy_kernel::ingest::{FrameSource, SourceSpec};
use candy_kernel::nutrition::NutritionTable;
use candy_kernel::session::{SessionController, StdinCommands};
use candy_kernel::ExitStatus;

#[derive(Parser, Debug)]
#[command(name = "candywatch", version, about = "Candy detection and nutrition scoring")]
struct Args {
    /// Model path (.json detection scripts have a built-in backend)
    #[arg(long, env = "CANDY_MODEL")]
    model: PathBuf,

    /// Frame source: image/folder/video path, usbN or picameraN
    #[arg(long, env = "CANDY_SOURCE")]
    source: String,

    /// Minimum confidence a detection must exceed to count
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    thresh: f32,

    /// Resize frames to WxH (e.g. 640x480); required with --record
    #[arg(long)]
    resolution: Option<String>,

    /// Record annotated frames to an MJPEG AVI
    #[arg(long)]
    record: bool,

    /// Nutrition table JSON overriding the built-in candies
    #[arg(long)]
    nutrition: Option<PathBuf>,

    /// TTF/OTF font for overlay text
    #[arg(long, env = "CANDY_FONT")]
    font: Option<PathBuf>,

    /// Basic fixed-size overlay panel instead of the rich layout
    #[arg(long)]
    basic_overlay: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()) {
        Ok(ExitStatus::Completed) => {
            log::info!("source exhausted, session complete");
            ExitCode::SUCCESS
        }
        Ok(ExitStatus::UserQuit) => {
            log::info!("session ended by user");
            ExitCode::SUCCESS
        }
        Ok(ExitStatus::Aborted) => ExitCode::FAILURE,
        Err(err) => {
            log::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitStatus> {
    let mut config = PipelineConfig::new(args.model, args.source);
    config.threshold = args.thresh;
    config.record = args.record;
    config.font_path = args.font;
    config.nutrition_path = args.nutrition;
    config.rich_overlay = !args.basic_overlay;
    if let Some(raw) = &args.resolution {
        config.resolution = Some(parse_resolution(raw)?);
    }

    let spec = SourceSpec::parse(&config.descriptor)?;
    config.validate(spec.kind())?;

    let table = match &config.nutrition_path {
        Some(path) => NutritionTable::from_json_file(path)?,
        None => NutritionTable::builtin(),
    };

    let detector = open_model(&config.model_path)?;
    log::info!(
        "detector '{}' loaded with classes: {}",
        detector.name(),
        detector.class_labels().join(", ")
    );
    log::info!(
        "threshold {}, {} source '{}'",
        config.threshold,
        spec.kind(),
        config.descriptor
    );

    let source = FrameSource::open(&spec, config.resolution)?;
    let commands = StdinCommands::spawn();
    let mut controller =
        SessionController::new(source, detector, Box::new(commands), config, table)?;
    controller.run()
}
