//! Time continuity verification for climate model output.
//!
//! Proves that a directory of time-slice files forms one gap-free,
//! correctly ordered time series before it is published.
//!
//! # Architecture
//!
//! - [`Dataset`] discovers the files and orders them by their date stamp
//! - [`detect_frequency`] decides between the fixed-delta and monthly regimes
//! - [`scan_file`] reads one file's time axis; scans run on a bounded pool
//! - [`Reconciler`] stitches the scan results together in filename order
//! - [`TimeChecker`] drives the whole pipeline and produces a [`CheckReport`]
//!
//! Time values are raw numeric offsets throughout and are never decoded
//! into calendar dates.

pub mod checker;
pub mod completeness;
pub mod dataset;
pub mod error;
pub mod frequency;
pub mod issue;
pub mod reconciler;
pub mod scanner;

// Re-exports
pub use checker::{CheckReport, TimeChecker, Verdict};
pub use completeness::{check_raw_completeness, CompletenessReport, RawComponent};
pub use dataset::Dataset;
pub use error::{Result, TimecheckError};
pub use frequency::{detect_frequency, ExpectedFrequency};
pub use issue::{Issue, IssueKind};
pub use reconciler::Reconciler;
pub use scanner::{scan_axis, scan_file, ScanResult, TimeSpan};
