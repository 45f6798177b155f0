//! Per-month day counts for the model calendars we know how to check.
//!
//! The table is process-wide and immutable. Supporting a new calendar means
//! adding a row to [`CALENDARS`]; nothing else needs to change.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{CommonError, CommonResult};

/// Registered calendars, keyed by the CF `calendar` attribute value.
static CALENDARS: &[(&str, [u32; 12])] = &[(
    "noleap",
    [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31],
)];

/// A registered calendar.
///
/// Obtained only through [`Calendar::lookup`], so holding one proves the
/// name was present in the registry.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    name: &'static str,
    month_days: &'static [u32; 12],
}

impl Calendar {
    /// Look up a calendar by its CF name.
    pub fn lookup(name: &str) -> CommonResult<Self> {
        CALENDARS
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(key, days)| Calendar {
                name: key,
                month_days: days,
            })
            .ok_or_else(|| CommonError::UnsupportedCalendar(name.to_string()))
    }

    /// The no-leap (fixed 365-day) calendar.
    pub fn noleap() -> Self {
        Calendar {
            name: CALENDARS[0].0,
            month_days: &CALENDARS[0].1,
        }
    }

    /// Names of every registered calendar.
    pub fn supported() -> impl Iterator<Item = &'static str> {
        CALENDARS.iter().map(|(name, _)| *name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of days in `month` (1-12).
    pub fn days_in_month(&self, month: u32) -> CommonResult<u32> {
        if !(1..=12).contains(&month) {
            return Err(CommonError::InvalidMonth { month });
        }
        Ok(self.month_days[(month - 1) as usize])
    }

    /// Total days in one calendar year.
    pub fn days_in_year(&self) -> u32 {
        self.month_days.iter().sum()
    }
}

impl fmt::Debug for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Calendar").field(&self.name).finish()
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for Calendar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}
