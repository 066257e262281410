//! Radiosonde CSV export carrying a GPS fix per level.
//!
//! Layout: a few preamble lines, one header line, one units line, then data rows. Header names
//! are compared with all spaces removed and without regard to case.

use std::io::Read;
use std::path::Path;

use balloon_core::atmosphere::{fall_rate_from_pressure, wind_components};
use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::{ProfileError, ProfileLevel, ProfileTable};

/// Column naming and framing of the export.
#[derive(Debug, Clone)]
pub struct CsvLayout {
    pub preamble_lines: usize,
    pub units_lines: usize,
    pub missing_value: f64,
    pub time: &'static str,
    pub latitude: &'static str,
    pub longitude: &'static str,
    pub altitude: &'static str,
    pub pressure: &'static str,
    pub wind_direction: &'static str,
    pub wind_speed: &'static str,
}

impl Default for CsvLayout {
    fn default() -> Self {
        Self {
            preamble_lines: 3,
            units_lines: 1,
            missing_value: -999_999.0,
            time: "Time",
            latitude: "Lat",
            longitude: "Lon",
            altitude: "Alt(m)",
            pressure: "Pres(mb)",
            wind_direction: "Wdir(deg)",
            wind_speed: "Wspd(m/s)",
        }
    }
}

struct Columns {
    time: usize,
    latitude: usize,
    longitude: usize,
    altitude: usize,
    pressure: usize,
    wind_direction: usize,
    wind_speed: usize,
}

/// Read and parse an export from disk with the default layout.
pub fn from_path<P: AsRef<Path>>(path: P) -> Result<ProfileTable, ProfileError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(file, &CsvLayout::default())
}

/// Parse an export. Incomplete rows are skipped; the table is cut at the burst altitude.
pub fn parse<R: Read>(reader: R, layout: &CsvLayout) -> Result<ProfileTable, ProfileError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut records = rdr.records().skip(layout.preamble_lines);
    let header = records
        .next()
        .transpose()?
        .ok_or_else(|| ProfileError::MissingColumn(layout.altitude.to_string()))?;
    let columns = resolve_columns(&header, layout)?;

    let mut levels = Vec::new();
    for (row, record) in records.skip(layout.units_lines).enumerate() {
        let record = record?;
        let field = |idx: usize| -> Option<f64> {
            let value = record.get(idx)?.parse::<f64>().ok()?;
            (value.is_finite() && value != layout.missing_value).then_some(value)
        };
        let parsed = (|| {
            Some((
                field(columns.time)?,
                field(columns.latitude)?,
                field(columns.longitude)?,
                field(columns.altitude)?,
                field(columns.pressure)?,
                field(columns.wind_direction)?,
                field(columns.wind_speed)?,
            ))
        })();
        let Some((time, lat, lon, alt, pressure, dir, speed)) = parsed else {
            debug!(row, "skipping CSV sounding row with missing values");
            continue;
        };
        let Some(fall_rate) = fall_rate_from_pressure(pressure) else {
            debug!(row, pressure, "skipping CSV sounding row with invalid pressure");
            continue;
        };
        let (u, v) = wind_components(dir, speed);
        levels.push(ProfileLevel::new(alt, u, v, fall_rate).with_fix(lon, lat, time));
    }

    Ok(ProfileTable::new(levels)?.truncated_at_peak())
}

fn resolve_columns(header: &StringRecord, layout: &CsvLayout) -> Result<Columns, ProfileError> {
    let find = |name: &str| -> Result<usize, ProfileError> {
        let wanted = normalize(name);
        header
            .iter()
            .position(|h| normalize(h) == wanted)
            .ok_or_else(|| ProfileError::MissingColumn(name.to_string()))
    };
    Ok(Columns {
        time: find(layout.time)?,
        latitude: find(layout.latitude)?,
        longitude: find(layout.longitude)?,
        altitude: find(layout.altitude)?,
        pressure: find(layout.pressure)?,
        wind_direction: find(layout.wind_direction)?,
        wind_speed: find(layout.wind_speed)?,
    })
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SAMPLE: &str = "\
Sounding export
Station: OSW
Launch 2022-09-01 02:00Z
Time, Lat, Lon, Alt (m), Pres (mb), Temp, Wdir (deg), Wspd (m/s)
s, deg, deg, m, mb, C, deg, m/s
0, 43.70, -76.00, 300, 980.0, 12.0, 180, 3.0
10, 43.71, -76.00, 360, 973.0, 11.6, 180, 3.0
20, -999999, -999999, 420, 966.0, 11.2, 180, 3.0
30, 43.73, -76.00, 480, 959.0, 10.8, 180, 3.0
40, 43.74, -76.00, 470, 960.0, 10.8, 180, 3.0
";

    #[test]
    fn parses_gps_levels() {
        let table = parse(SAMPLE.as_bytes(), &CsvLayout::default()).expect("csv parse");
        assert_eq!(table.len(), 2);
        assert!(table.supports_gap_bridging());
        let second = table.levels()[1];
        assert_abs_diff_eq!(second.altitude, 360.0);
        assert_eq!(second.fix(), Some((-76.0, 43.71, 10.0)));
        // Southerly wind blows north.
        assert_abs_diff_eq!(second.v, 3.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_column_is_reported() {
        let text = "a\nb\nc\nTime, Lat\nunits\n0, 1\n";
        let err = parse(text.as_bytes(), &CsvLayout::default()).unwrap_err();
        assert!(matches!(err, ProfileError::MissingColumn(name) if name == "Lon"));
    }
}
