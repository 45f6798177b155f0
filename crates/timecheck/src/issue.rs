//! Structured discontinuity reports.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What kind of discontinuity was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The file's time dimension has no samples
    EmptyTimeIndex,
    /// Two consecutive samples inside one file are not one step apart
    InternalDelta,
    /// A file does not start one step after the previous file ended
    StartMismatch,
}

/// One discontinuity, attributable to a single file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    pub file: PathBuf,
    pub kind: IssueKind,
    /// Expected start (or expected step, for internal deltas)
    pub expected: Option<f64>,
    /// Observed start (or observed step, for internal deltas)
    pub actual: Option<f64>,
    /// Signed `actual - expected`
    pub magnitude: Option<f64>,
    /// Raw time value where the problem was seen
    pub at: Option<f64>,
}

impl Issue {
    /// An empty time axis. `expected` is the start we assumed in its place.
    pub fn empty_index(file: impl Into<PathBuf>, expected: Option<f64>) -> Self {
        Self {
            file: file.into(),
            kind: IssueKind::EmptyTimeIndex,
            expected,
            actual: None,
            magnitude: None,
            at: None,
        }
    }

    pub fn internal_delta(file: impl Into<PathBuf>, at: f64, expected: f64, actual: f64) -> Self {
        Self {
            file: file.into(),
            kind: IssueKind::InternalDelta,
            expected: Some(expected),
            actual: Some(actual),
            magnitude: Some(actual - expected),
            at: Some(at),
        }
    }

    pub fn start_mismatch(file: impl Into<PathBuf>, expected: f64, actual: f64) -> Self {
        Self {
            file: file.into(),
            kind: IssueKind::StartMismatch,
            expected: Some(expected),
            actual: Some(actual),
            magnitude: Some(actual - expected),
            at: Some(actual),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.display();
        match (self.kind, self.expected, self.actual, self.magnitude) {
            (IssueKind::EmptyTimeIndex, _, _, _) => write!(f, "Empty time index found in {}", file),
            (IssueKind::InternalDelta, Some(expected), Some(actual), _) => write!(
                f,
                "time discontinuity in {} at {}, delta was {} when it should have been {}",
                file,
                self.at.unwrap_or_default(),
                actual,
                expected
            ),
            (IssueKind::StartMismatch, Some(expected), Some(actual), Some(offset)) => write!(
                f,
                "index issue file: {} starts at {} but should start at {}, the start index is off by {}",
                file, actual, expected, offset
            ),
            (kind, _, _, _) => write!(f, "{:?} in {}", kind, file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_mismatch_magnitude_is_signed() {
        let early = Issue::start_mismatch("a.nc", 100.0, 95.0);
        assert_eq!(early.magnitude, Some(-5.0));
        let late = Issue::start_mismatch("a.nc", 100.0, 103.0);
        assert_eq!(late.magnitude, Some(3.0));
    }

    #[test]
    fn test_display_messages() {
        let issue = Issue::empty_index("/d/b.nc", Some(59.0));
        assert_eq!(issue.to_string(), "Empty time index found in /d/b.nc");

        let issue = Issue::start_mismatch("/d/c.nc", 90.0, 92.0);
        assert!(issue.to_string().contains("off by 2"));

        let issue = Issue::internal_delta("/d/c.nc", 1.5, 0.25, 0.5);
        assert_eq!(
            issue.to_string(),
            "time discontinuity in /d/c.nc at 1.5, delta was 0.5 when it should have been 0.25"
        );
    }
}
