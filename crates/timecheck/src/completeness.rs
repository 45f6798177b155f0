//! Raw history-file completeness check.
//!
//! Before a simulation's raw output is staged, every monthly history file
//! in the requested year range must be present for each component.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TimecheckError};

/// Model components with monthly history files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RawComponent {
    Atmos,
    Land,
    SeaIce,
    Ocean,
}

impl RawComponent {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawComponent::Atmos => "atmos",
            RawComponent::Land => "land",
            RawComponent::SeaIce => "sea-ice",
            RawComponent::Ocean => "ocean",
        }
    }

    /// Infix separating the case name from the date stamp, for components
    /// whose files are prefixed with the case name.
    fn case_marker(&self) -> Option<&'static str> {
        match self {
            RawComponent::Atmos => Some(".cam.h0"),
            RawComponent::Land => Some(".clm2.h0"),
            RawComponent::SeaIce | RawComponent::Ocean => None,
        }
    }

    /// Expected file name for one month.
    pub fn file_name(&self, case: &str, year: u32, month: u32) -> String {
        match self {
            RawComponent::Atmos => format!("{}.cam.h0.{:04}-{:02}.nc", case, year, month),
            RawComponent::Land => format!("{}.clm2.h0.{:04}-{:02}.nc", case, year, month),
            RawComponent::SeaIce => format!(
                "mpascice.hist.am.timeSeriesStatsMonthly.{:04}-{:02}-01.nc",
                year, month
            ),
            RawComponent::Ocean => format!(
                "mpaso.hist.am.timeSeriesStatsMonthly.{:04}-{:02}-01.nc",
                year, month
            ),
        }
    }

    /// Case name taken from a file name, e.g. `v2.LR.piControl` from
    /// `v2.LR.piControl.cam.h0.0001-01.nc`.
    pub fn case_name(&self, file_name: &str) -> Result<String> {
        match self.case_marker() {
            Some(marker) => file_name
                .find(marker)
                .map(|i| file_name[..i].to_string())
                .ok_or_else(|| TimecheckError::CaseName(file_name.to_string())),
            None => Ok(String::new()),
        }
    }
}

impl fmt::Display for RawComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RawComponent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "atmos" => Ok(RawComponent::Atmos),
            "land" => Ok(RawComponent::Land),
            "sea-ice" => Ok(RawComponent::SeaIce),
            "ocean" => Ok(RawComponent::Ocean),
            other => Err(format!("unknown raw component: {}", other)),
        }
    }
}

/// Missing and empty components found by [`check_raw_completeness`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompletenessReport {
    /// Expected file names that were not found, per component
    pub missing: BTreeMap<RawComponent, Vec<String>>,
    /// Components whose directory held no files at all
    pub empty: Vec<RawComponent>,
}

impl CompletenessReport {
    pub fn is_complete(&self) -> bool {
        self.missing.values().all(Vec::is_empty) && self.empty.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.missing.values().map(Vec::len).sum()
    }
}

/// Verify that every month from January of `start` through December of
/// `end` exists for each component directory.
pub fn check_raw_completeness(
    dirs: &BTreeMap<RawComponent, PathBuf>,
    start: u32,
    end: u32,
) -> Result<CompletenessReport> {
    let mut report = CompletenessReport::default();

    for (&component, dir) in dirs {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(dir)? {
            if let Some(name) = entry?.file_name().to_str() {
                names.insert(name.to_string());
            }
        }

        let Some(first) = names.iter().next() else {
            warn!(component = %component, dir = %dir.display(), "No raw files found");
            report.empty.push(component);
            continue;
        };
        let case = component.case_name(first)?;

        let missing: Vec<String> = (start..=end)
            .flat_map(|year| (1..=12).map(move |month| (year, month)))
            .map(|(year, month)| component.file_name(&case, year, month))
            .filter(|name| !names.contains(name))
            .collect();

        for name in &missing {
            warn!(component = %component, file = %name, "Raw file is missing");
        }
        info!(component = %component, missing = missing.len(), "Checked raw completeness");
        report.missing.insert(component, missing);
    }

    Ok(report)
}
