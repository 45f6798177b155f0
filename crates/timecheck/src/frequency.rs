//! Expected-frequency detection from a representative file.

use std::path::Path;

use netcdf_parser::{TimeAxis, TimeAxisReader};
use serde::Serialize;
use tracing::info;
use warehouse_common::Calendar;

use crate::error::{Result, TimecheckError};

/// How far apart consecutive time samples should be.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExpectedFrequency {
    /// One sample per month; the step is the length of the month
    Monthly { calendar: Calendar },
    /// A constant step in the file's own units
    FixedDelta { value: f64, units: Option<String> },
}

impl ExpectedFrequency {
    /// The constant step, or `None` for calendar-driven monthly data.
    pub fn fixed_delta(&self) -> Option<f64> {
        match self {
            ExpectedFrequency::FixedDelta { value, .. } => Some(*value),
            ExpectedFrequency::Monthly { .. } => None,
        }
    }

    pub fn is_monthly(&self) -> bool {
        matches!(self, ExpectedFrequency::Monthly { .. })
    }
}

/// Read `path` and classify its time axis.
pub fn detect_frequency<R: TimeAxisReader + ?Sized>(reader: &R, path: &Path) -> Result<ExpectedFrequency> {
    let axis = reader.read_axis(path).map_err(|source| TimecheckError::Reader {
        file: path.to_path_buf(),
        source,
    })?;
    classify(&axis, path)
}

/// Classify an already-read axis.
///
/// Monthly files are recognized by their `time_period_freq` attribute and
/// must declare a registered calendar. Anything else needs at least two
/// samples so the step can be measured.
pub fn classify(axis: &TimeAxis, path: &Path) -> Result<ExpectedFrequency> {
    if axis.is_monthly() {
        let name = axis.calendar.as_deref().ok_or_else(|| TimecheckError::MissingCalendar {
            file: path.to_path_buf(),
        })?;
        let calendar = Calendar::lookup(name)?;
        info!(file = %path.display(), calendar = %calendar, "Found monthly data");
        return Ok(ExpectedFrequency::Monthly { calendar });
    }

    match axis.values.as_slice() {
        [t0, t1, ..] => {
            let value = t1 - t0;
            info!(
                file = %path.display(),
                delta = value,
                units = axis.units.as_deref().unwrap_or("unknown"),
                "Found sub-monthly data"
            );
            Ok(ExpectedFrequency::FixedDelta {
                value,
                units: axis.units.clone(),
            })
        }
        values => Err(TimecheckError::InsufficientSamples {
            file: path.to_path_buf(),
            found: values.len(),
        }),
    }
}
