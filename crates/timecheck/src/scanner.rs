//! Per-file time index scanning.
//!
//! Each file is scanned independently, so scans can run on a worker pool in
//! any order. Results carry their sequence index and are put back into
//! filename order before reconciliation.

use std::path::{Path, PathBuf};

use netcdf_parser::{TimeAxis, TimeAxisReader};
use tracing::{debug, warn};

use crate::error::{Result, TimecheckError};
use crate::issue::Issue;

/// First and last raw time values of a non-empty axis. `first <= last`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSpan {
    pub first: f64,
    pub last: f64,
}

/// Outcome of scanning one file.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    /// Position of the file in the sorted dataset
    pub index: usize,
    pub file: PathBuf,
    /// `None` when the time dimension is empty
    pub span: Option<TimeSpan>,
    /// Step mismatches found inside the file
    pub issues: Vec<Issue>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.span.is_none()
    }
}

/// Read and scan one file.
pub fn scan_file<R: TimeAxisReader + ?Sized>(
    reader: &R,
    path: &Path,
    expected_delta: Option<f64>,
    index: usize,
) -> Result<ScanResult> {
    let axis = reader.read_axis(path).map_err(|source| TimecheckError::Reader {
        file: path.to_path_buf(),
        source,
    })?;
    Ok(scan_axis(&axis, path, expected_delta, index))
}

/// Walk an axis, checking every step against `expected_delta`.
///
/// `expected_delta` is `None` for monthly data, where steps vary by month and
/// only the cross-file check applies. A zero first step marks a monthly file
/// with a duplicated timestamp: the scan stops there and reports that time as
/// both first and last, ignoring the rest of the axis.
pub fn scan_axis(axis: &TimeAxis, path: &Path, expected_delta: Option<f64>, index: usize) -> ScanResult {
    let mut result = ScanResult {
        index,
        file: path.to_path_buf(),
        span: None,
        issues: Vec::new(),
    };

    let Some((&first, rest)) = axis.values.split_first() else {
        return result;
    };

    let mut prev = first;
    for (step, &time) in rest.iter().enumerate() {
        let delta = time - prev;

        if step == 0 && delta == 0.0 {
            debug!(file = %path.display(), time, "Duplicate leading timestamp, treating as monthly");
            result.span = Some(TimeSpan { first: time, last: time });
            return result;
        }

        if let Some(expected) = expected_delta {
            if delta != expected {
                warn!(
                    file = %path.display(),
                    at = time,
                    delta,
                    expected,
                    "Time discontinuity inside file"
                );
                result.issues.push(Issue::internal_delta(path, time, expected, delta));
            }
        }
        prev = time;
    }

    result.span = Some(TimeSpan { first, last: prev });
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::IssueKind;

    fn scan(values: Vec<f64>, expected: Option<f64>) -> ScanResult {
        scan_axis(&TimeAxis::new(values), Path::new("f.nc"), expected, 3)
    }

    #[test]
    fn test_empty_axis() {
        let result = scan(vec![], Some(1.0));
        assert_eq!(result.index, 3);
        assert!(result.is_empty());
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_single_sample() {
        let result = scan(vec![31.0], None);
        assert_eq!(result.span, Some(TimeSpan { first: 31.0, last: 31.0 }));
    }

    #[test]
    fn test_regular_axis() {
        let result = scan(vec![0.0, 0.25, 0.5, 0.75], Some(0.25));
        assert_eq!(result.span, Some(TimeSpan { first: 0.0, last: 0.75 }));
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_internal_gap_does_not_abort() {
        let result = scan(vec![0.0, 1.0, 3.0, 4.0], Some(1.0));
        assert_eq!(result.span, Some(TimeSpan { first: 0.0, last: 4.0 }));
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.kind, IssueKind::InternalDelta);
        assert_eq!(issue.at, Some(3.0));
        assert_eq!(issue.actual, Some(2.0));
        assert_eq!(issue.magnitude, Some(1.0));
    }

    #[test]
    fn test_zero_first_delta_short_circuits() {
        // The later gap is never looked at.
        let result = scan(vec![59.0, 59.0, 100.0], Some(1.0));
        assert_eq!(result.span, Some(TimeSpan { first: 59.0, last: 59.0 }));
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_later_zero_delta_is_a_discontinuity() {
        let result = scan(vec![0.0, 1.0, 1.0, 2.0], Some(1.0));
        assert_eq!(result.span, Some(TimeSpan { first: 0.0, last: 2.0 }));
        assert_eq!(result.issues.len(), 1);
    }

    #[test]
    fn test_monthly_steps_not_checked_internally() {
        let result = scan(vec![31.0, 59.0, 90.0], None);
        assert!(result.issues.is_empty());
        assert_eq!(result.span, Some(TimeSpan { first: 31.0, last: 90.0 }));
    }
}
