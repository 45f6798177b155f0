//! Registered output data types and where each one lives.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::StagingError;

/// A kind of output the staging pipeline knows how to place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Atmos,
    AtmosRegridded,
    AtmosTimeseries,
    AtmosDaily,
    Land,
    LandRegridded,
    Ocean,
    SeaIce,
    Climatology,
    AtmosMonthlyTimeseries,
    LandMonthlyTimeseries,
}

/// Directory segments implied by a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub component: &'static str,
    pub output_type: &'static str,
    /// Use the caller's grid name instead of "native"
    pub regridded: bool,
    pub frequency: &'static str,
}

impl DataType {
    pub const ALL: [DataType; 11] = [
        DataType::Atmos,
        DataType::AtmosRegridded,
        DataType::AtmosTimeseries,
        DataType::AtmosDaily,
        DataType::Land,
        DataType::LandRegridded,
        DataType::Ocean,
        DataType::SeaIce,
        DataType::Climatology,
        DataType::AtmosMonthlyTimeseries,
        DataType::LandMonthlyTimeseries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Atmos => "atmos",
            DataType::AtmosRegridded => "atmos-regridded",
            DataType::AtmosTimeseries => "atmos-timeseries",
            DataType::AtmosDaily => "atmos-daily",
            DataType::Land => "land",
            DataType::LandRegridded => "land-regridded",
            DataType::Ocean => "ocean",
            DataType::SeaIce => "sea-ice",
            DataType::Climatology => "climatology",
            DataType::AtmosMonthlyTimeseries => "atmos-monthly-timeseries",
            DataType::LandMonthlyTimeseries => "land-monthly-timeseries",
        }
    }

    pub fn layout(&self) -> Layout {
        use DataType::*;
        let (component, output_type, regridded, frequency) = match self {
            Atmos => ("atmos", "model-output", false, "mon"),
            AtmosRegridded => ("atmos", "model-output", true, "mon"),
            AtmosTimeseries => ("atmos", "time-series", true, "mon"),
            AtmosDaily => ("atmos", "model-output", false, "day"),
            Land => ("land", "model-output", false, "mon"),
            LandRegridded => ("land", "model-output", true, "mon"),
            Ocean => ("ocean", "model-output", false, "mon"),
            SeaIce => ("sea-ice", "model-output", false, "mon"),
            Climatology => ("atmos", "climo", true, "mon"),
            AtmosMonthlyTimeseries => ("atmos", "time-series", true, "mon"),
            LandMonthlyTimeseries => ("land", "time-series", true, "mon"),
        };
        Layout {
            component,
            output_type,
            regridded,
            frequency,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = StagingError;

    /// Accepts the canonical tags and the names used by older staging configs.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(found) = DataType::ALL.iter().find(|dt| dt.as_str() == s) {
            return Ok(*found);
        }
        match s {
            "atmos_regrid" => Ok(DataType::AtmosRegridded),
            "atmos_ts" => Ok(DataType::AtmosTimeseries),
            "atmos_daily" => Ok(DataType::AtmosDaily),
            "land_regrid" => Ok(DataType::LandRegridded),
            "climo" => Ok(DataType::Climatology),
            "timeseries_atm" => Ok(DataType::AtmosMonthlyTimeseries),
            "timeseries_lnd" => Ok(DataType::LandMonthlyTimeseries),
            other => Err(StagingError::InvalidDataType(other.to_string())),
        }
    }
}

impl TryFrom<String> for DataType {
    type Error = StagingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DataType> for String {
    fn from(value: DataType) -> Self {
        value.as_str().to_string()
    }
}
