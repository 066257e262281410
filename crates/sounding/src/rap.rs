//! RAP/RUC point sounding in the rucsoundings.noaa.gov ASCII format.
//!
//! Every line starts with a line-type code. Types 1–3 identify the station and units; types
//! 4–9 are data rows `type pressure height temp dewpt wind_dir wind_spd` with pressure in tenths
//! of a hPa and wind speed in knots. `99999` marks a missing value.

use std::path::Path;

use balloon_core::atmosphere::{fall_rate_from_pressure, wind_components};
use balloon_core::units::{knots_to_ms, tenths_to_hpa};
use tracing::debug;

use crate::{ProfileError, ProfileLevel, ProfileTable, read_to_string};

const COLUMNS: usize = 7;
const DATA_LINE_TYPES: std::ops::RangeInclusive<u32> = 4..=9;
const MISSING: f64 = 99_999.0;

/// Read and parse a saved RAP sounding.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ProfileTable, ProfileError> {
    parse(&read_to_string(path.as_ref())?)
}

/// Parse RAP text. Rows lacking pressure, height or wind are skipped.
pub fn parse(text: &str) -> Result<ProfileTable, ProfileError> {
    let mut levels = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let is_data = fields
            .first()
            .and_then(|code| code.parse::<u32>().ok())
            .is_some_and(|code| DATA_LINE_TYPES.contains(&code));
        if !is_data {
            continue;
        }
        if fields.len() < COLUMNS {
            return Err(ProfileError::Parse {
                line: line_no,
                message: format!("expected {COLUMNS} columns, found {}", fields.len()),
            });
        }
        let mut values = [0.0; COLUMNS];
        for (slot, field) in values.iter_mut().zip(&fields) {
            *slot = field.parse::<f64>().map_err(|_| ProfileError::Parse {
                line: line_no,
                message: format!("invalid number `{field}`"),
            })?;
        }
        let [_, pressure_tenths, height, _, _, dir, speed_kt] = values;
        if [pressure_tenths, height, dir, speed_kt]
            .iter()
            .any(|v| *v >= MISSING)
        {
            debug!(line = line_no, "skipping RAP row with missing values");
            continue;
        }
        let Some(fall_rate) = fall_rate_from_pressure(tenths_to_hpa(pressure_tenths)) else {
            debug!(line = line_no, "skipping RAP row with invalid pressure");
            continue;
        };
        let (u, v) = wind_components(dir, knots_to_ms(speed_kt));
        levels.push(ProfileLevel::new(height, u, v, fall_rate));
    }

    ProfileTable::new(levels)
}
