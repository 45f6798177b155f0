//! Common types shared across the warehouse crates.

pub mod calendar;
pub mod datestamp;
pub mod error;

pub use calendar::Calendar;
pub use datestamp::DateStamp;
pub use error::{CommonError, CommonResult};
