//! Replay a recorded marker-tracking session and print a JSON report.
//!
//! ```text
//! marker-replay --script session.json [--config tracker.json] [--output report.json]
//! ```

use std::path::PathBuf;

use clap::Parser;
use marker_tracking::core::TrackerSettings;
use marker_tracking::replay::{replay, ReplayError, SessionScript};

#[cfg(not(feature = "tracing"))]
use log::info;
#[cfg(feature = "tracing")]
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "marker-replay", version, about = "Replay a recorded marker-tracking session")]
struct Cli {
    /// Session script (JSON).
    #[arg(long)]
    script: PathBuf,
    /// Tracker settings (JSON) overriding the script's settings.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
    /// Log level: error, warn, info, debug, trace.
    #[arg(long, default_value = "warn")]
    log_level: String,
    /// Emit JSON logs (only with the `tracing` feature).
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    run(&cli)?;
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.json_logs {
        eprintln!("--json-logs needs the `tracing` feature; using plain logs");
    }
    marker_tracking::core::init_with_level(marker_tracking::core::parse_level(&cli.log_level))?;
    Ok(())
}

#[cfg(feature = "tracing")]
fn init_logging(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let level = marker_tracking::core::parse_level(&cli.log_level);
    tracing_log::LogTracer::init_with_filter(level)?;
    marker_tracking::core::init_tracing(level, cli.json_logs);
    Ok(())
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(cli)))]
fn run(cli: &Cli) -> Result<(), ReplayError> {
    let mut script = SessionScript::load_json(&cli.script)?;
    if let Some(config) = &cli.config {
        script.settings = TrackerSettings::load_json(config)?;
    }
    info!("replaying {} ({} steps)", cli.script.display(), script.steps.len());

    let report = replay(&script)?;
    match &cli.output {
        Some(path) => {
            report.write_json(path)?;
            info!("report written to {}", path.display());
        }
        None => println!("{}", report.to_json_pretty()?),
    }
    Ok(())
}
