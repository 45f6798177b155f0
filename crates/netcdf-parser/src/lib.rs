//! Time-axis reader for NetCDF time-slice files.
//!
//! Climate model history files carry a single `time` coordinate plus `units`
//! and `calendar` attributes. The continuity checker only ever needs those raw
//! numeric offsets, so this crate reads them without decoding into dates.
//!
//! # Implementation Notes
//!
//! The default [`NcdumpReader`] shells out to the `ncdump` command-line tool.
//! Builds with libhdf5-dev and libnetcdf-dev available can enable the
//! `native` feature to read through the `netcdf` crate instead.

mod ncdump;
#[cfg(feature = "native")]
mod native;

use std::collections::BTreeMap;
use std::path::Path;

use thiserror::Error;

pub use ncdump::NcdumpReader;
#[cfg(feature = "native")]
pub use native::NativeReader;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Global attribute marking monthly-mean history files.
pub const TIME_PERIOD_FREQ_ATTR: &str = "time_period_freq";

/// Value of [`TIME_PERIOD_FREQ_ATTR`] for monthly data.
pub const MONTHLY_FREQ: &str = "month_1";

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Command execution error
    #[error("Command execution failed: {0}")]
    CommandError(String),
}

/// The raw time coordinate of one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeAxis {
    /// Raw offsets in file order, never calendar-decoded
    pub values: Vec<f64>,
    /// `time:units`, e.g. "days since 0001-01-01 00:00:00"
    pub units: Option<String>,
    /// `time:calendar`, e.g. "noleap"
    pub calendar: Option<String>,
    /// Dataset-level attributes rendered as text
    pub global_attributes: BTreeMap<String, String>,
}

impl TimeAxis {
    pub fn new(values: Vec<f64>) -> Self {
        Self {
            values,
            ..Default::default()
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_calendar(mut self, calendar: impl Into<String>) -> Self {
        self.calendar = Some(calendar.into());
        self
    }

    pub fn with_global(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.global_attributes.insert(name.into(), value.into());
        self
    }

    /// Mark the axis as belonging to a monthly-mean file.
    pub fn monthly(self) -> Self {
        self.with_global(TIME_PERIOD_FREQ_ATTR, MONTHLY_FREQ)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn global(&self, name: &str) -> Option<&str> {
        self.global_attributes.get(name).map(String::as_str)
    }

    /// True when the dataset-level frequency attribute says "month_1".
    pub fn is_monthly(&self) -> bool {
        self.global(TIME_PERIOD_FREQ_ATTR) == Some(MONTHLY_FREQ)
    }

    /// Leading word of the units string ("days" for "days since ...").
    pub fn unit_name(&self) -> Option<&str> {
        self.units.as_deref().and_then(|u| u.split_whitespace().next())
    }
}

/// Source of raw time axes.
///
/// Implementations must be shareable across the scan worker pool.
pub trait TimeAxisReader: Send + Sync {
    fn read_axis(&self, path: &Path) -> NetCdfResult<TimeAxis>;
}

impl<R: TimeAxisReader + ?Sized> TimeAxisReader for std::sync::Arc<R> {
    fn read_axis(&self, path: &Path) -> NetCdfResult<TimeAxis> {
        (**self).read_axis(path)
    }
}

/// Reader used when no feature-specific choice is made.
#[cfg(not(feature = "native"))]
pub fn default_reader() -> NcdumpReader {
    NcdumpReader::default()
}

/// Reader used when no feature-specific choice is made.
#[cfg(feature = "native")]
pub fn default_reader() -> NativeReader {
    NativeReader::default()
}
