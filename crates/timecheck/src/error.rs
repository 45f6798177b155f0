//! Error types for the timecheck crate.

use std::path::PathBuf;

use netcdf_parser::NetCdfError;
use thiserror::Error;
use warehouse_common::CommonError;

/// Errors that abort a continuity check.
///
/// Discontinuities in the data itself are not errors; they are collected
/// as [`Issue`](crate::Issue)s and turn the verdict into a failure.
#[derive(Error, Debug)]
pub enum TimecheckError {
    #[error(transparent)]
    Config(#[from] CommonError),

    #[error("Failed to read time axis from {file}: {source}")]
    Reader {
        file: PathBuf,
        #[source]
        source: NetCdfError,
    },

    #[error("{file} has no time calendar attribute")]
    MissingCalendar { file: PathBuf },

    #[error("{file} has {found} time samples, at least 2 are needed to detect the frequency")]
    InsufficientSamples { file: PathBuf, found: usize },

    #[error("No .nc files found in {0}")]
    EmptyDataset(PathBuf),

    #[error("Scan result missing for file index {0}")]
    MissingScan(usize),

    #[error("Unable to find a case name in {0}")]
    CaseName(String),

    #[error("Failed to read directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Scan worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Result type for timecheck operations.
pub type Result<T> = std::result::Result<T, TimecheckError>;
