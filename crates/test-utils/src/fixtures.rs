//! On-disk dataset fixtures.
//!
//! Continuity checks discover files by listing a directory, so fixtures
//! create empty placeholder files and register the matching axes with a
//! [`MemoryReader`].

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use netcdf_parser::TimeAxis;
use tempfile::TempDir;

use crate::generators::{fixed_series, monthly_names, noleap_month_ends, DAYS_SINCE};
use crate::reader::MemoryReader;

/// A temporary dataset directory backed by a [`MemoryReader`].
pub struct DatasetFixture {
    pub dir: TempDir,
    pub reader: MemoryReader,
}

impl DatasetFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
            reader: MemoryReader::new(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create `name` in the dataset directory and serve `axis` for it.
    pub fn add(&self, name: &str, axis: TimeAxis) -> PathBuf {
        let path = self.dir.path().join(name);
        File::create(&path).expect("failed to create fixture file");
        self.reader.insert(path.clone(), axis);
        path
    }

    /// Contiguous sub-monthly files: `files` files of `per_file` samples,
    /// `step` days apart.
    pub fn fixed_step(files: usize, per_file: usize, step: f64) -> Self {
        let fixture = Self::new();
        for i in 0..files {
            let start = (i * per_file) as f64 * step;
            let axis = TimeAxis::new(fixed_series(start, step, per_file)).with_units(DAYS_SINCE);
            fixture.add(&format!("case.eam.h1.{:04}-{:02}-01-00000.nc", i / 12 + 1, i % 12 + 1), axis);
        }
        fixture
    }

    /// One single-sample no-leap monthly file per month.
    pub fn monthly_noleap(years: u32) -> Self {
        let fixture = Self::new();
        for (name, end) in monthly_names("case", years).iter().zip(noleap_month_ends(years)) {
            fixture.add(name, monthly_axis(vec![end]));
        }
        fixture
    }
}

impl Default for DatasetFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A monthly no-leap axis with the given values.
pub fn monthly_axis(values: Vec<f64>) -> TimeAxis {
    TimeAxis::new(values)
        .with_units(DAYS_SINCE)
        .with_calendar("noleap")
        .monthly()
}

/// Write `files` empty files under `dir`, creating it first.
pub fn touch_files(dir: &Path, files: &[&str]) -> Vec<PathBuf> {
    fs::create_dir_all(dir).expect("failed to create fixture dir");
    files
        .iter()
        .map(|name| {
            let path = dir.join(name);
            fs::write(&path, name.as_bytes()).expect("failed to write fixture file");
            path
        })
        .collect()
}
