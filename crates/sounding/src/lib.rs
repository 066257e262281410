//! Atmospheric profile tables and the readers that build them.
//!
//! Every reader normalises its source into [`ProfileLevel`]s in SI units (metres, m/s) so the
//! flight engine never branches on input format. Levels carry position and observation time
//! only when the source does; [`ProfileTable::supports_gap_bridging`] is the capability check.

pub mod digicora;
pub mod gps_csv;
pub mod rap;
pub mod tracker;

use std::path::PathBuf;

use thiserror::Error;

/// One atmospheric observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileLevel {
    /// Metres above mean sea level.
    pub altitude: f64,
    /// Eastward wind (m/s).
    pub u: f64,
    /// Northward wind (m/s).
    pub v: f64,
    /// Parachute descent speed implied at this level (m/s, positive).
    pub fall_rate: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Seconds since the first observation of the source.
    pub observation_time: Option<f64>,
}

impl ProfileLevel {
    /// Level without position or timing information.
    pub fn new(altitude: f64, u: f64, v: f64, fall_rate: f64) -> Self {
        Self {
            altitude,
            u,
            v,
            fall_rate,
            latitude: None,
            longitude: None,
            observation_time: None,
        }
    }

    /// Attach a GPS fix and its observation time.
    pub fn with_fix(mut self, longitude: f64, latitude: f64, observation_time: f64) -> Self {
        self.longitude = Some(longitude);
        self.latitude = Some(latitude);
        self.observation_time = Some(observation_time);
        self
    }

    /// Position and time, when the level carries all three.
    pub fn fix(&self) -> Option<(f64, f64, f64)> {
        Some((self.longitude?, self.latitude?, self.observation_time?))
    }
}

/// Errors raised while building a profile. All of them stop a run before simulation starts.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile contains no usable levels")]
    Empty,
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("missing column `{0}`")]
    MissingColumn(String),
    #[error("non-finite value in level {index}")]
    NonFinite { index: usize },
    #[error("tracker `{0}` not present in feed")]
    TrackerNotFound(String),
    #[error("failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to parse KML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Ordered, immutable collection of profile levels. Never empty.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    levels: Vec<ProfileLevel>,
}

impl ProfileTable {
    /// Validate and wrap a set of levels.
    pub fn new(levels: Vec<ProfileLevel>) -> Result<Self, ProfileError> {
        if levels.is_empty() {
            return Err(ProfileError::Empty);
        }
        for (index, level) in levels.iter().enumerate() {
            let finite = level.altitude.is_finite()
                && level.u.is_finite()
                && level.v.is_finite()
                && level.fall_rate.is_finite();
            if !finite {
                return Err(ProfileError::NonFinite { index });
            }
        }
        Ok(Self { levels })
    }

    pub fn levels(&self) -> &[ProfileLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn last(&self) -> &ProfileLevel {
        // Non-empty by construction.
        &self.levels[self.levels.len() - 1]
    }

    /// True when every level carries latitude, longitude and observation time.
    pub fn supports_gap_bridging(&self) -> bool {
        self.levels.iter().all(|level| level.fix().is_some())
    }

    /// Drop everything recorded after the first altitude maximum (the burst).
    pub fn truncated_at_peak(self) -> Self {
        let peak = self
            .levels
            .iter()
            .enumerate()
            .fold(0, |best, (i, level)| {
                if level.altitude > self.levels[best].altitude {
                    i
                } else {
                    best
                }
            });
        let mut levels = self.levels;
        levels.truncate(peak.max(1));
        Self { levels }
    }

    /// Lowest and highest altitude in the table.
    pub fn altitude_range(&self) -> (f64, f64) {
        self.levels
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), level| {
                (lo.min(level.altitude), hi.max(level.altitude))
            })
    }
}

/// Which reader produced a table; drives the simulation presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileSource {
    /// Radiosonde text export without GPS columns.
    Sounding,
    /// Radiosonde CSV export with per-level GPS fixes.
    GpsSounding,
    /// Coarse numerical-model point sounding.
    Model,
    /// Observed flight path from a tracker feed.
    Tracker,
}

pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String, ProfileError> {
    std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(ProfileTable::new(Vec::new()), Err(ProfileError::Empty)));
    }

    #[test]
    fn non_finite_level_is_rejected() {
        let levels = vec![
            ProfileLevel::new(100.0, 1.0, 1.0, 6.0),
            ProfileLevel::new(f64::NAN, 1.0, 1.0, 6.0),
        ];
        assert!(matches!(
            ProfileTable::new(levels),
            Err(ProfileError::NonFinite { index: 1 })
        ));
    }

    #[test]
    fn truncation_keeps_levels_before_burst() {
        let levels = [100.0, 500.0, 900.0, 700.0, 300.0]
            .into_iter()
            .map(|alt| ProfileLevel::new(alt, 0.0, 0.0, 6.0))
            .collect();
        let table = ProfileTable::new(levels).unwrap().truncated_at_peak();
        let alts: Vec<f64> = table.levels().iter().map(|l| l.altitude).collect();
        assert_eq!(alts, vec![100.0, 500.0]);
    }

    #[test]
    fn altitude_range_spans_unsorted_levels() {
        let levels = [700.0, 100.0, 900.0, 300.0]
            .into_iter()
            .map(|alt| ProfileLevel::new(alt, 0.0, 0.0, 6.0))
            .collect();
        let table = ProfileTable::new(levels).unwrap();
        assert_eq!(table.altitude_range(), (100.0, 900.0));
    }

    #[test]
    fn gap_bridging_requires_every_fix() {
        let with_fix = ProfileLevel::new(100.0, 0.0, 0.0, 6.0).with_fix(-76.0, 43.7, 0.0);
        let without = ProfileLevel::new(200.0, 0.0, 0.0, 6.0);
        assert!(ProfileTable::new(vec![with_fix]).unwrap().supports_gap_bridging());
        assert!(!ProfileTable::new(vec![with_fix, without]).unwrap().supports_gap_bridging());
    }
}
