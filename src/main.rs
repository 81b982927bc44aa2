use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use fiber_dataset::config::{load_config_from_file, Config};
use fiber_dataset::error::Result;
use fiber_dataset::pipeline::{compile_dataset, compile_thresholds, survey_files};

#[derive(Parser, Debug)]
#[command(author, version, about = "Compile per-fiber simulation outputs into tabular datasets")]
struct Cli {
    /// Path to config TOML
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of worker threads (overrides config)
    #[arg(long)]
    cores: Option<usize>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Per-amplitude dataset plus response and stimulus waveform tables
    Compile,
    /// Activation-level curves from per-fiber thresholds
    Thresholds,
    /// Count input/output files per n-sim directory
    Survey {
        #[arg(long)]
        sample: u32,
        #[arg(long)]
        sim: u32,
        /// Explicit n_sims directory instead of the one derived from the config
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn run(cli: Cli, config: Config) -> Result<()> {
    let workers = cli.cores.unwrap_or(config.workers);
    match cli.command {
        Command::Compile => {
            let report = compile_dataset(&config, workers)?;
            println!(
                "Dataset compilation complete: {} entries from {} units ({} skipped, {} failed).",
                report.summary.entries,
                report.summary.units_ready,
                report.summary.units_skipped,
                report.summary.units_failed
            );
        }
        Command::Thresholds => {
            let report = compile_thresholds(&config, workers)?;
            println!("Processed {} entries", report.summary.entries);
        }
        Command::Survey { sample, sim, dir } => {
            let path = survey_files(&config, sample, sim, dir)?;
            println!("Counts saved to {}", path.display());
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = match load_config_from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(path = %cli.config.display(), "{}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
