//! Error types for the shared warehouse primitives.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

/// Configuration errors raised by calendar and filename lookups.
///
/// These are never recoverable within a run: a dataset that cannot be
/// described by a known calendar or date stamp is rejected up front.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommonError {
    #[error("Unsupported calendar type: {0}")]
    UnsupportedCalendar(String),

    #[error("Invalid month {month} (expected 1-12)")]
    InvalidMonth { month: u32 },

    #[error("Unable to find a YYYY-MM date stamp in {0}")]
    MissingDateStamp(String),

    #[error("Invalid date stamp in {name}: {message}")]
    InvalidDateStamp { name: String, message: String },
}
