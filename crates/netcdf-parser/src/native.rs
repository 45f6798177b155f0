//! libnetcdf-backed time-axis reader.

use std::path::Path;

use crate::{NetCdfError, NetCdfResult, TimeAxis, TimeAxisReader};

/// Reads the time coordinate directly with the `netcdf` crate.
#[derive(Debug, Clone)]
pub struct NativeReader {
    variable: String,
}

impl Default for NativeReader {
    fn default() -> Self {
        Self {
            variable: "time".to_string(),
        }
    }
}

impl NativeReader {
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }
}

impl TimeAxisReader for NativeReader {
    fn read_axis(&self, path: &Path) -> NetCdfResult<TimeAxis> {
        let file = netcdf::open(path)
            .map_err(|e| NetCdfError::InvalidFormat(format!("Failed to open NetCDF: {}", e)))?;

        let var = file
            .variable(&self.variable)
            .ok_or_else(|| NetCdfError::MissingData(format!("{} variable", self.variable)))?;

        let is_empty = var.dimensions().iter().any(|dim| dim.len() == 0);
        let values: Vec<f64> = if is_empty {
            Vec::new()
        } else {
            var.get_values(..).map_err(|e| {
                NetCdfError::InvalidFormat(format!("Failed to read {}: {}", self.variable, e))
            })?
        };

        let mut axis = TimeAxis::new(values);
        axis.units = string_attr(&var, "units");
        axis.calendar = string_attr(&var, "calendar");

        for attr in file.attributes() {
            if let Ok(value) = attr.value() {
                axis.global_attributes
                    .insert(attr.name().to_string(), render_value(value));
            }
        }

        Ok(axis)
    }
}

// Check presence first so HDF5 does not print errors for optional attributes.
fn string_attr(var: &netcdf::Variable, name: &str) -> Option<String> {
    if !var.attributes().any(|attr| attr.name() == name) {
        return None;
    }
    match var.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(s) => Some(s),
        other => Some(render_value(other)),
    }
}

fn render_value(value: netcdf::AttributeValue) -> String {
    use netcdf::AttributeValue as V;
    match value {
        V::Str(s) => s,
        V::Strs(v) => v.join(","),
        V::Double(x) => x.to_string(),
        V::Float(x) => x.to_string(),
        V::Int(x) => x.to_string(),
        V::Short(x) => x.to_string(),
        V::Longlong(x) => x.to_string(),
        other => format!("{:?}", other),
    }
}
