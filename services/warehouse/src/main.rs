//! Climate model output warehouse.
//!
//! Checks the time continuity of model output datasets and stages files
//! into the canonical publication tree.

mod config;
mod stage;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use staging::{publish_dataset, TransferMode};
use timecheck::checker::DEFAULT_JOBS;
use timecheck::{check_raw_completeness, TimeChecker};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use config::load_staging_config;
use stage::{run_stage, StageOverrides};

#[derive(Parser, Debug)]
#[command(name = "warehouse")]
#[command(about = "Time continuity checks and publication staging for model output")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level
    #[arg(long, global = true, env = "WAREHOUSE_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log format: json or pretty
    #[arg(long, global = true, default_value = "json")]
    log_format: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check time continuity of every .nc file in a directory
    Check {
        /// Dataset directory
        dir: PathBuf,

        /// Files scanned at once
        #[arg(short, long, default_value_t = DEFAULT_JOBS)]
        jobs: usize,

        /// Write the full report as JSON
        #[arg(long)]
        json: Option<PathBuf>,
    },

    /// Transfer data into the publication tree and generate mapfiles
    Stage {
        /// Staging configuration file
        config: PathBuf,

        /// Override the configured transfer mode (link, move, copy)
        #[arg(long)]
        transfer_mode: Option<TransferMode>,

        /// Replace existing destinations
        #[arg(long)]
        overwrite: bool,

        /// Skip mapfile generation
        #[arg(long)]
        no_mapfiles: bool,
    },

    /// Move a staged dataset into an empty publication directory
    Publish {
        #[arg(long)]
        src: PathBuf,

        #[arg(long)]
        dst: PathBuf,
    },

    /// Verify that every monthly raw history file exists
    CheckRaw {
        /// Staging configuration file with a `raw` section
        config: PathBuf,

        #[arg(long)]
        start: u32,

        #[arg(long)]
        end: u32,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    if let Err(e) = init_tracing(&args.log_level, &args.log_format) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::from(2);
    }

    match run(args.command).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %format!("{e:#}"), "Command failed");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr);

    match log_format {
        "pretty" => tracing::subscriber::set_global_default(builder.pretty().finish())?,
        _ => tracing::subscriber::set_global_default(builder.json().finish())?,
    }
    Ok(())
}

async fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Check { dir, jobs, json } => {
            info!(dir = %dir.display(), jobs, "Starting time continuity check");
            let checker = TimeChecker::new(netcdf_parser::default_reader()).with_jobs(jobs);
            let report = checker
                .check_dir(&dir)
                .await
                .with_context(|| format!("Failed to check {}", dir.display()))?;

            for issue in &report.issues {
                println!("{issue}");
            }
            if let Some(path) = json {
                let body = serde_json::to_string_pretty(&report)?;
                tokio::fs::write(&path, body)
                    .await
                    .with_context(|| format!("Failed to write report to {}", path.display()))?;
            }
            println!("{}", report.result_line());
            Ok(ExitCode::from(report.exit_code() as u8))
        }

        Command::Stage {
            config,
            transfer_mode,
            overwrite,
            no_mapfiles,
        } => {
            let config = load_staging_config(&config)?;
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, cancelling");
                    on_signal.cancel();
                }
            });

            let overrides = StageOverrides {
                transfer_mode,
                overwrite,
                no_mapfiles,
            };
            let summary = run_stage(config, overrides, cancel).await?;
            println!(
                "transferred={} skipped={} missing={} mapfiles_ok={} mapfiles_failed={}",
                summary.record.transferred,
                summary.record.skipped,
                summary.record.missing,
                summary.mapfiles_ok,
                summary.mapfiles_failed
            );
            Ok(if summary.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }

        Command::Publish { src, dst } => {
            let moved = publish_dataset(&src, &dst).await?;
            println!("Moved {moved} files to {}", dst.display());
            Ok(ExitCode::SUCCESS)
        }

        Command::CheckRaw { config, start, end } => {
            let config = load_staging_config(&config)?;
            anyhow::ensure!(!config.raw.is_empty(), "raw section is empty");
            anyhow::ensure!(start <= end, "start year {start} is after end year {end}");

            let dirs = config.raw.clone();
            let report = tokio::task::spawn_blocking(move || check_raw_completeness(&dirs, start, end))
                .await?
                .context("Raw completeness check failed")?;

            for (component, names) in &report.missing {
                for name in names {
                    println!("missing {component}: {name}");
                }
            }
            for component in &report.empty {
                println!("empty {component}");
            }
            Ok(if report.is_complete() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            })
        }
    }
}
