//! Transfer into the publication tree, then generate mapfiles.

use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{Context, Result};
use staging::{MapfileSupervisor, TransferEngine, TransferMode, TransferRecord};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::StagingConfig;

/// How often transfer progress is logged.
const PROGRESS_INTERVAL: Duration = Duration::from_secs(10);

/// What a staging run did.
#[derive(Debug)]
pub struct StageSummary {
    pub record: TransferRecord,
    pub mapfiles_ok: usize,
    pub mapfiles_failed: usize,
}

impl StageSummary {
    pub fn succeeded(&self) -> bool {
        self.mapfiles_failed == 0
    }
}

/// Command line overrides for a staging run.
#[derive(Debug, Default)]
pub struct StageOverrides {
    pub transfer_mode: Option<TransferMode>,
    pub overwrite: bool,
    pub no_mapfiles: bool,
}

pub async fn run_stage(
    mut config: StagingConfig,
    overrides: StageOverrides,
    cancel: CancellationToken,
) -> Result<StageSummary> {
    if let Some(mode) = overrides.transfer_mode {
        config.transfer_mode = mode;
    }
    config.overwrite |= overrides.overwrite;
    anyhow::ensure!(!config.data_paths.is_empty(), "data_paths cannot be empty when staging");

    let resolver = config.resolver()?;
    let sources: Vec<_> = config
        .data_paths
        .iter()
        .map(|(data_type, dir)| (*data_type, dir.clone()))
        .collect();

    info!(
        experiment = %config.experiment,
        mode = %config.transfer_mode,
        data_types = sources.len(),
        "Starting transfer"
    );
    let engine = TransferEngine::new(resolver, config.transfer_options());
    let handled = engine.progress();
    let reporter = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PROGRESS_INTERVAL);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            info!(handled = handled.load(Ordering::Relaxed), "Transfer progress");
        }
    });
    let transferred = engine.transfer(&sources).await;
    reporter.abort();
    let record = transferred.context("Transfer aborted")?;
    info!(
        transferred = record.transferred,
        skipped = record.skipped,
        missing = record.missing,
        directories = record.directories.len(),
        "Transfer complete"
    );

    let mut summary = StageSummary {
        record,
        mapfiles_ok: 0,
        mapfiles_failed: 0,
    };

    let mapfile = match (&config.mapfile, overrides.no_mapfiles) {
        (Some(mapfile), false) => mapfile.clone(),
        (None, false) => {
            warn!("No mapfile section configured, skipping mapfile generation");
            return Ok(summary);
        }
        (_, true) => return Ok(summary),
    };

    let supervisor = MapfileSupervisor::new(mapfile);
    let outcomes = supervisor
        .generate_all(&summary.record.directories, &cancel)
        .await
        .context("Mapfile generation failed")?;
    info!(
        datasets = outcomes.len(),
        files_hashed = supervisor.progress().load(Ordering::Relaxed),
        "Mapfile generation finished"
    );
    for outcome in &outcomes {
        if outcome.succeeded() {
            summary.mapfiles_ok += 1;
        } else {
            summary.mapfiles_failed += 1;
        }
    }
    // directories never reached because of cancellation count as failures
    summary.mapfiles_failed += summary.record.directories.len() - outcomes.len();

    Ok(summary)
}
