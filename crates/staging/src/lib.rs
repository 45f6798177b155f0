//! Publication staging for climate model output.
//!
//! Moves raw and post-processed files into the canonical publication tree
//! and generates the mapfiles the publication service needs.
//!
//! # Architecture
//!
//! - [`DataType`] registers every kind of output we know how to place
//! - [`PathResolver`] maps a file to its canonical destination (pure)
//! - [`TransferEngine`] moves, copies or links whole source directories
//! - [`MapfileSupervisor`] runs the external mapfile generator

pub mod data_type;
pub mod error;
pub mod mapfile;
pub mod path;
pub mod transfer;

// Re-exports
pub use data_type::{DataType, Layout};
pub use error::{Result, StagingError};
pub use mapfile::{MapfileConfig, MapfileOutcome, MapfileSupervisor};
pub use path::{canonical_destination, dataset_id, discover_resolution_dir, PathResolver, VERSION_DIR};
pub use transfer::{publish_dataset, TransferEngine, TransferMode, TransferOptions, TransferRecord};
