//! Error types for the staging crate.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while staging files for publication.
#[derive(Error, Debug)]
pub enum StagingError {
    #[error("{0} is an invalid data type")]
    InvalidDataType(String),

    #[error("{0} is not a supported transfer mode (expected link, move or copy)")]
    InvalidTransferMode(String),

    #[error("No resolution directory found under {0}")]
    MissingResolutionDir(PathBuf),

    /// An OS-level failure while moving one file; aborts the whole batch.
    #[error("Failed to transfer {src} to {dst}: {source}")]
    Transfer {
        src: PathBuf,
        dst: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot publish: {0}")]
    Publish(String),

    #[error("Mapfile command is empty")]
    EmptyCommand,

    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for staging operations.
pub type Result<T> = std::result::Result<T, StagingError>;
