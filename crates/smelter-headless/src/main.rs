//! Smelter headless runner

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use smelter_headless::{RunConfig, run_level};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "smelter-headless")]
#[command(about = "Run a smelter level without rendering and print a report")]
struct Cli {
    /// Level directory holding recipes, buildings and level files
    level: PathBuf,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Frames per simulated second
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Leave couriers standing still
    #[arg(long)]
    no_couriers: bool,

    /// Game log lines kept in the report
    #[arg(long, default_value_t = smelter_core::log::DEFAULT_LOG_LINES)]
    log_lines: usize,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Run the level twice and fail if the reports differ
    #[arg(long)]
    verify: bool,

    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = RunConfig {
        frames: cli.frames,
        dt: 1.0 / cli.fps,
        couriers: !cli.no_couriers,
        log_lines: cli.log_lines,
    };

    let report = match run_level(&cli.level, &config) {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Run failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.verify {
        match run_level(&cli.level, &config) {
            Ok(second) if second == report => tracing::info!("Determinism: PASS"),
            Ok(_) => {
                tracing::error!("Determinism: FAIL (reports differ between runs)");
                return ExitCode::FAILURE;
            }
            Err(e) => {
                tracing::error!("Second run failed: {e}");
                return ExitCode::FAILURE;
            }
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                tracing::error!("Cannot encode report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{report}");
    }
    ExitCode::SUCCESS
}
