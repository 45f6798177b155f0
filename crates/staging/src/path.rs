//! Canonical destination paths in the publication tree.
//!
//! Layout:
//! `root/experiment/resolution/component/grid/output-type/frequency/ensemble/v1/filename`

use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::data_type::DataType;
use crate::error::{Result, StagingError};

/// Version segment for every staged dataset.
///
/// Only a single dataset version is supported.
pub const VERSION_DIR: &str = "v1";

/// Grid segment for data on the model's native grid.
pub const NATIVE_GRID: &str = "native";

/// Project directory names that anchor a dataset id.
const PROJECT_ANCHORS: [&str; 2] = ["E3SM", "CMIP6"];

/// Resolves destination paths for one experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    root: PathBuf,
    experiment: String,
    resolution_dir: String,
    grid: String,
    ensemble: String,
}

impl PathResolver {
    pub fn new(
        root: impl Into<PathBuf>,
        experiment: impl Into<String>,
        resolution_dir: impl Into<String>,
        grid: impl Into<String>,
        ensemble: impl Into<String>,
    ) -> Self {
        Self {
            root: root.into(),
            experiment: experiment.into(),
            resolution_dir: resolution_dir.into(),
            grid: grid.into(),
            ensemble: ensemble.into(),
        }
    }

    /// Directory that holds every file of the given data type.
    pub fn dataset_dir(&self, data_type: DataType) -> PathBuf {
        let layout = data_type.layout();
        let grid = if layout.regridded {
            self.grid.as_str()
        } else {
            NATIVE_GRID
        };
        self.root
            .join(&self.experiment)
            .join(&self.resolution_dir)
            .join(layout.component)
            .join(grid)
            .join(layout.output_type)
            .join(layout.frequency)
            .join(&self.ensemble)
            .join(VERSION_DIR)
    }

    /// Canonical destination for one file.
    pub fn resolve(&self, data_type: DataType, filename: &str) -> PathBuf {
        self.dataset_dir(data_type).join(filename)
    }

    /// Like [`resolve`](Self::resolve), starting from a data-type tag.
    pub fn resolve_tag(&self, tag: &str, filename: &str) -> Result<PathBuf> {
        let data_type: DataType = tag.parse()?;
        Ok(self.resolve(data_type, filename))
    }
}

/// Canonical destination of `filename` for a data-type tag.
///
/// Fails with [`StagingError::InvalidDataType`] for an unregistered tag.
pub fn canonical_destination(
    root: &Path,
    experiment: &str,
    data_type: &str,
    filename: &str,
    grid: &str,
    ensemble: &str,
    resolution_dir: &str,
) -> Result<PathBuf> {
    PathResolver::new(root, experiment, resolution_dir, grid, ensemble).resolve_tag(data_type, filename)
}

/// Find the resolution directory: the first sorted entry under `root/experiment`.
pub fn discover_resolution_dir(root: &Path, experiment: &str) -> Result<String> {
    let base = root.join(experiment);
    let mut names = std::fs::read_dir(&base)
        .map_err(|_| StagingError::MissingResolutionDir(base.clone()))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .collect::<Vec<_>>();
    names.sort();

    let found = names
        .into_iter()
        .next()
        .ok_or_else(|| StagingError::MissingResolutionDir(base.clone()))?;
    debug!(experiment = %experiment, resolution = %found, "Discovered resolution directory");
    Ok(found)
}

/// Dotted dataset id for a canonical directory.
///
/// `/p/E3SM/piControl/1deg/atmos/native/model-output/mon/ens1/v1` gives
/// `E3SM.piControl.1deg.atmos.native.model-output.mon.ens1`.
pub fn dataset_id(path: &Path) -> Option<String> {
    let segments: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    let start = segments
        .iter()
        .position(|s| PROJECT_ANCHORS.contains(s))?;
    let end = segments[start..]
        .iter()
        .position(|s| is_version_segment(s))
        .map(|offset| start + offset)
        .unwrap_or(segments.len());

    Some(segments[start..end].join("."))
}

fn is_version_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
