mod codec;
mod inspect;
mod naming;
mod pipeline;

use codec::JpegDecoder;
use frame_extract_common::config::{Config, RunMode};
use frame_extract_common::frame::WaymoFrameDecoder;
use pipeline::{ExtractionJob, Extractor};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        source = %config.job.source.display(),
        output_dir = %config.job.output_dir.display(),
        camera = %config.job.camera,
        max_frames = ?config.job.max_frames,
        mode = ?config.job.mode,
        "starting frame-extract"
    );

    let code = match config.job.mode {
        RunMode::Extract => run_extract(&config),
        RunMode::Inspect => run_inspect(&config),
    };
    std::process::exit(code);
}

fn run_extract(config: &Config) -> i32 {
    let job = ExtractionJob::from_config(config);
    let extractor = Extractor::new(WaymoFrameDecoder, JpegDecoder, config.output.jpeg_quality);

    match extractor.run(&job) {
        Ok(report) => {
            print_json(&report);
            if report.has_failures() {
                error!("one or more cameras failed, see report");
                1
            } else {
                0
            }
        }
        Err(e) => {
            error!(error = %e, failed_at_frame = ?e.failed_at_frame(), "extraction failed");
            1
        }
    }
}

fn run_inspect(config: &Config) -> i32 {
    match inspect::inspect(
        &config.job.source,
        config.job.inspect_frames,
        &WaymoFrameDecoder,
        &JpegDecoder,
    ) {
        Ok(summaries) => {
            print_json(&summaries);
            0
        }
        Err(e) => {
            error!(error = %e, "inspect failed");
            1
        }
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => error!(error = %e, "failed to serialize report"),
    }
}
