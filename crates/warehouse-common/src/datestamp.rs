//! Date stamps embedded in time-slice file names.
//!
//! Model history files carry a `YYYY-MM` stamp somewhere in their name
//! (`case.cam.h0.0001-02.nc`, `mpaso.hist.am.timeSeriesStatsMonthly.0001-02-01.nc`).
//! Sorting on the text from the stamp onward gives chronological order even
//! when the prefixes differ.

use std::path::Path;

use crate::error::{CommonError, CommonResult};

/// The first `YYYY-MM` stamp found in a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateStamp {
    /// Byte offset of the stamp within the file name
    pub offset: usize,
    pub year: u32,
    pub month: u32,
}

impl DateStamp {
    /// Locate the stamp in a bare file name.
    pub fn find(name: &str) -> CommonResult<Self> {
        let bytes = name.as_bytes();
        let offset = (0..=bytes.len().saturating_sub(7))
            .find(|&i| is_stamp_at(bytes, i))
            .ok_or_else(|| CommonError::MissingDateStamp(name.to_string()))?;

        let year = name[offset..offset + 4].parse().map_err(|_| invalid(name, "year"))?;
        let month: u32 = name[offset + 5..offset + 7]
            .parse()
            .map_err(|_| invalid(name, "month"))?;

        if !(1..=12).contains(&month) {
            return Err(CommonError::InvalidDateStamp {
                name: name.to_string(),
                message: format!("month {:02} is out of range", month),
            });
        }

        Ok(DateStamp { offset, year, month })
    }

    /// Locate the stamp in the file-name component of `path`.
    pub fn from_path(path: &Path) -> CommonResult<Self> {
        let name = file_name(path)?;
        Self::find(name)
    }

    /// The portion of `name` starting at the stamp, used as the sort key.
    pub fn suffix<'a>(&self, name: &'a str) -> &'a str {
        &name[self.offset..]
    }
}

/// Month number from a file's date stamp.
pub fn month_from_path(path: &Path) -> CommonResult<u32> {
    DateStamp::from_path(path).map(|stamp| stamp.month)
}

fn file_name(path: &Path) -> CommonResult<&str> {
    path.file_name()
        .and_then(|s| s.to_str())
        .ok_or_else(|| CommonError::MissingDateStamp(path.display().to_string()))
}

fn is_stamp_at(bytes: &[u8], i: usize) -> bool {
    bytes.len() >= i + 7
        && bytes[i..i + 4].iter().all(u8::is_ascii_digit)
        && bytes[i + 4] == b'-'
        && bytes[i + 5..i + 7].iter().all(u8::is_ascii_digit)
}

fn invalid(name: &str, what: &str) -> CommonError {
    CommonError::InvalidDateStamp {
        name: name.to_string(),
        message: format!("unparsable {}", what),
    }
}
