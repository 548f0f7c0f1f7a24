mod config;
mod logging;

use clap::{Args, Parser, Subcommand};
use config::{Config, ConfigError};
use logging::LoggingError;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "clickgate", about = "Click-tracking redirect guard")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Serve the click-tracking endpoint
    Tracker(TrackerArgs),
}

#[derive(Args)]
struct TrackerArgs {
    /// YAML config file. Built-in defaults apply when omitted
    #[arg(long, short)]
    config: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Tracker(#[from] tracker::TrackerError),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            eprintln!("clickgate: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        CliCommand::Tracker(args) => {
            let config = match args.config {
                Some(path) => Config::from_file(&path)?,
                None => Config::default(),
            };

            let _sentry_guard = logging::init(&config.logging)?;
            tracing::info!("Starting tracker");

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(tracker::run(config.tracker))?;
        }
    }

    Ok(())
}
