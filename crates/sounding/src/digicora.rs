//! DigiCORA radiosonde text export.
//!
//! One header line followed by whitespace-separated rows:
//! `Time alt Pres temp rh dew Wdir Wspd` (s, m, hPa, °C, %, °C, deg, m/s).
//! Missing values are written as `/////`; the file may end with an `EOF` marker.

use std::path::Path;

use balloon_core::atmosphere::{fall_rate_from_pressure, wind_components};
use tracing::debug;

use crate::{ProfileError, ProfileLevel, ProfileTable, read_to_string};

const HEADER_LINES: usize = 1;
const COLUMNS: usize = 8;
const COL_TIME: usize = 0;
const COL_ALT: usize = 1;
const COL_PRESSURE: usize = 2;
const COL_WIND_DIR: usize = 6;
const COL_WIND_SPEED: usize = 7;

/// Read and parse a DigiCORA export from disk.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ProfileTable, ProfileError> {
    parse(&read_to_string(path.as_ref())?)
}

/// Parse DigiCORA text. Rows with a missing altitude, pressure or wind are skipped; the
/// table is cut at the burst altitude.
pub fn parse(text: &str) -> Result<ProfileTable, ProfileError> {
    let mut levels = Vec::new();
    for (idx, line) in text.lines().enumerate().skip(HEADER_LINES) {
        let line_no = idx + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("EOF") {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() < COLUMNS {
            return Err(ProfileError::Parse {
                line: line_no,
                message: format!("expected {COLUMNS} columns, found {}", fields.len()),
            });
        }
        let values = fields
            .iter()
            .take(COLUMNS)
            .map(|field| parse_value(field, line_no))
            .collect::<Result<Vec<_>, _>>()?;

        let (Some(time), Some(alt), Some(pressure), Some(dir), Some(speed)) = (
            values[COL_TIME],
            values[COL_ALT],
            values[COL_PRESSURE],
            values[COL_WIND_DIR],
            values[COL_WIND_SPEED],
        ) else {
            debug!(line = line_no, "skipping DigiCORA row with missing values");
            continue;
        };
        let Some(fall_rate) = fall_rate_from_pressure(pressure) else {
            debug!(line = line_no, pressure, "skipping DigiCORA row with invalid pressure");
            continue;
        };
        let (u, v) = wind_components(dir, speed);
        let mut level = ProfileLevel::new(alt, u, v, fall_rate);
        level.observation_time = Some(time);
        levels.push(level);
    }

    Ok(ProfileTable::new(levels)?.truncated_at_peak())
}

fn parse_value(field: &str, line: usize) -> Result<Option<f64>, ProfileError> {
    if field.chars().all(|c| c == '/') || field == "EOF" {
        return Ok(None);
    }
    field.parse::<f64>().map(Some).map_err(|_| ProfileError::Parse {
        line,
        message: format!("invalid number `{field}`"),
    })
}
