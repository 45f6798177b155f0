//! In-memory time-axis reader.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use netcdf_parser::{NetCdfError, NetCdfResult, TimeAxis, TimeAxisReader};

/// Serves pre-registered axes by path.
///
/// Clones share the same registry, so a test can keep a handle after
/// passing the reader into a checker.
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    axes: Arc<RwLock<HashMap<PathBuf, TimeAxis>>>,
    reads: Arc<AtomicUsize>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, axis: TimeAxis) {
        self.axes
            .write()
            .expect("reader lock poisoned")
            .insert(path.into(), axis);
    }

    /// Number of `read_axis` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl TimeAxisReader for MemoryReader {
    fn read_axis(&self, path: &Path) -> NetCdfResult<TimeAxis> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.axes
            .read()
            .expect("reader lock poisoned")
            .get(path)
            .cloned()
            .ok_or_else(|| NetCdfError::MissingData(format!("no axis for {}", path.display())))
    }
}
