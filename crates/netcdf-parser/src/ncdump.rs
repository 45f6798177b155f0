//! `ncdump`-backed time-axis reader.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::trace;

use crate::{NetCdfError, NetCdfResult, TimeAxis, TimeAxisReader};

/// Float and double precision for `ncdump -p`.
const FULL_PRECISION: &str = "9,17";

/// Reads the time coordinate by running `ncdump -v <variable> <file>`.
#[derive(Debug, Clone)]
pub struct NcdumpReader {
    program: PathBuf,
    variable: String,
}

impl Default for NcdumpReader {
    fn default() -> Self {
        Self {
            program: PathBuf::from("ncdump"),
            variable: "time".to_string(),
        }
    }
}

impl NcdumpReader {
    /// Use a specific `ncdump` binary instead of the one on PATH.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    /// Read a coordinate other than `time`.
    pub fn with_variable(mut self, variable: impl Into<String>) -> Self {
        self.variable = variable.into();
        self
    }

    /// Arguments passed to `ncdump`.
    ///
    /// `-p 9,17` prints doubles with enough digits to round-trip; the default
    /// of 15 does not, and time offsets are compared exactly.
    pub fn arguments(&self, path: &Path) -> Vec<OsString> {
        vec![
            OsString::from("-v"),
            OsString::from(&self.variable),
            OsString::from("-p"),
            OsString::from(FULL_PRECISION),
            path.as_os_str().to_os_string(),
        ]
    }
}

impl TimeAxisReader for NcdumpReader {
    fn read_axis(&self, path: &Path) -> NetCdfResult<TimeAxis> {
        let output = Command::new(&self.program)
            .args(self.arguments(path))
            .output()
            .map_err(|e| NetCdfError::CommandError(format!("Failed to run ncdump: {}", e)))?;

        if !output.status.success() {
            return Err(NetCdfError::CommandError(format!(
                "ncdump failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let axis = parse_ncdump(&text, &self.variable)?;
        trace!(file = %path.display(), samples = axis.len(), "Read time axis");
        Ok(axis)
    }
}

/// Parse the CDL text produced by `ncdump -v <variable>`.
pub(crate) fn parse_ncdump(text: &str, variable: &str) -> NetCdfResult<TimeAxis> {
    let (header, data) = match text.find("\ndata:") {
        Some(pos) => (&text[..pos], &text[pos + "\ndata:".len()..]),
        None => (text, ""),
    };

    if !declares_variable(header, variable) {
        return Err(NetCdfError::MissingData(format!("{} variable", variable)));
    }

    let mut axis = TimeAxis::default();
    let var_prefix = format!("{}:", variable);

    for line in header.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix(':') {
            if let Some((name, value)) = split_attribute(rest) {
                axis.global_attributes.insert(name.to_string(), value);
            }
        } else if let Some(rest) = line.strip_prefix(&var_prefix) {
            match split_attribute(rest) {
                Some(("units", value)) => axis.units = Some(value),
                Some(("calendar", value)) => axis.calendar = Some(value),
                _ => {}
            }
        }
    }

    axis.values = match data_values(data, variable) {
        Some(body) => parse_values(body, variable)?,
        None if dimension_len(header, variable) == Some(0) => Vec::new(),
        None => {
            return Err(NetCdfError::MissingData(format!(
                "{} data section",
                variable
            )))
        }
    };

    Ok(axis)
}

fn declares_variable(header: &str, variable: &str) -> bool {
    let decl = format!(" {}(", variable);
    header.lines().any(|line| line.contains(&decl))
}

/// Length of a dimension, from either `time = 12 ;` or
/// `time = UNLIMITED ; // (12 currently)`.
fn dimension_len(header: &str, name: &str) -> Option<usize> {
    let pattern = format!("{} = ", name);
    let dims = header.split("variables:").next()?;
    for line in dims.lines() {
        let line = line.trim();
        let Some(rest) = line.strip_prefix(&pattern) else {
            continue;
        };
        if rest.starts_with("UNLIMITED") {
            let start = rest.find('(')? + 1;
            let end = rest.find(" currently")?;
            return rest.get(start..end)?.trim().parse().ok();
        }
        return rest.trim_end_matches(';').trim().parse().ok();
    }
    None
}

/// Split `name = value ;` and unquote string values.
fn split_attribute(rest: &str) -> Option<(&str, String)> {
    let (name, value) = rest.split_once(" = ")?;
    let value = value.trim().trim_end_matches(';').trim();
    let value = match value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) {
        Some(inner) => inner.replace("\\\"", "\""),
        None => value.to_string(),
    };
    Some((name.trim(), value))
}

/// The text between `<variable> =` and the terminating `;` in the data section.
fn data_values<'a>(data: &'a str, variable: &str) -> Option<&'a str> {
    let pattern = format!("{} =", variable);
    let start = data
        .match_indices(&pattern)
        .find(|(pos, _)| {
            // Must be at the start of a line, not a suffix of another name.
            data[..*pos]
                .chars()
                .next_back()
                .map_or(true, |c| c == '\n' || c == ' ' || c == '\t')
        })
        .map(|(pos, _)| pos + pattern.len())?;
    let body = &data[start..];
    let end = body.find(';')?;
    Some(&body[..end])
}

fn parse_values(body: &str, variable: &str) -> NetCdfResult<Vec<f64>> {
    body.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            if token == "_" {
                return Err(NetCdfError::InvalidFormat(format!(
                    "{} contains fill values",
                    variable
                )));
            }
            token.parse::<f64>().map_err(|_| {
                NetCdfError::InvalidFormat(format!("Failed to parse {} value '{}'", variable, token))
            })
        })
        .collect()
}
