//! Discovery and ordering of a dataset's time-slice files.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use warehouse_common::DateStamp;

use crate::error::{Result, TimecheckError};

/// An ordered collection of time-slice files forming one time series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    pub dir: PathBuf,
    /// Sorted by the text from each name's date stamp onward
    pub files: Vec<PathBuf>,
}

impl Dataset {
    /// Collect every `.nc` file directly under `dir`.
    pub fn discover(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("nc") && path.is_file() {
                files.push(path);
            }
        }
        if files.is_empty() {
            return Err(TimecheckError::EmptyDataset(dir.to_path_buf()));
        }

        let dataset = Self::from_files(dir, files)?;
        debug!(dir = %dir.display(), files = dataset.len(), "Discovered dataset");
        Ok(dataset)
    }

    /// Order an explicit file list by date stamp.
    ///
    /// Every name must carry a `YYYY-MM` stamp; prefixes are ignored when
    /// sorting so that case names never affect the order.
    pub fn from_files(dir: impl Into<PathBuf>, files: Vec<PathBuf>) -> Result<Self> {
        let mut keyed = files
            .into_iter()
            .map(|path| -> Result<(String, PathBuf)> {
                let stamp = DateStamp::from_path(&path)?;
                let name = path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default();
                let key = stamp.suffix(name).to_string();
                Ok((key, path))
            })
            .collect::<Result<Vec<_>>>()?;
        keyed.sort();

        Ok(Self {
            dir: dir.into(),
            files: keyed.into_iter().map(|(_, path)| path).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The file used to detect the expected frequency.
    pub fn representative(&self) -> Option<&Path> {
        self.files.first().map(PathBuf::as_path)
    }
}
