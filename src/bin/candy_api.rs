//! candy_api - HTTP scoring service
//!
//! Serves POST /api/send: base64 image in, filtered detections out. Runs
//! until Ctrl-C.

use std::path::PathBuf;
use std::sync::mpsc;

use anyhow::Result;
use clap::Parser;

use candy_kernel::api::{ApiConfig, ApiServer, ScoreService};
use candy_kernel::config::DEFAULT_THRESHOLD;
use candy_kernel::detect::open_model;
use candy_kernel::nutrition::NutritionTable;

#[derive(Parser, Debug)]
#[command(name = "candy_api", version, about = "HTTP candy scoring endpoint")]
struct Args {
    /// Model path (.json detection scripts have a built-in backend)
    #[arg(long, env = "CANDY_MODEL")]
    model: PathBuf,

    /// Listen address
    #[arg(long, env = "CANDY_API_ADDR", default_value = "127.0.0.1:8000")]
    addr: String,

    /// Minimum confidence a detection must exceed to be reported
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    thresh: f32,

    /// Nutrition table JSON overriding the built-in candies
    #[arg(long)]
    nutrition: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let table = match &args.nutrition {
        Some(path) => NutritionTable::from_json_file(path)?,
        None => NutritionTable::builtin(),
    };
    let detector = open_model(&args.model)?;
    log::info!(
        "detector '{}' loaded with classes: {}",
        detector.name(),
        detector.class_labels().join(", ")
    );

    let service = ScoreService::new(detector, args.thresh, table);
    let handle = ApiServer::new(ApiConfig { addr: args.addr }, service).spawn()?;
    log::info!("scoring api listening on {}", handle.addr);

    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    log::info!("candy_api waiting for shutdown signal (Ctrl-C)...");
    let _ = rx.recv();
    log::info!("shutdown signal received, stopping scoring api...");
    handle.stop()?;
    Ok(())
}
