//! Ground elevation samples and the landing test used to stop the descent.

mod kdtree;

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::debug;

use kdtree::KdTree;

/// Altitude slack when comparing the balloon against the ground (m). Absorbs round-off from the
/// geodetic round trip so a descent that ends exactly on the surface counts as landed.
pub const LANDING_TOLERANCE_M: f64 = 1e-3;

/// One terrain sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainSample {
    pub longitude: f64,
    pub latitude: f64,
    pub elevation: f64,
}

/// How a (lon, lat) query is matched to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerrainLookup {
    /// Closest sample in the plane.
    #[default]
    Nearest,
    /// Closest longitude and closest latitude chosen independently, then the lattice node at
    /// their intersection. Only meaningful on regular grids.
    AxisAligned,
}

#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("terrain grid contains no samples")]
    Empty,
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("failed to read terrain file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Immutable terrain grid with both lookup indexes prebuilt.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    samples: Vec<TerrainSample>,
    lookup: TerrainLookup,
    tree: KdTree,
    lon_scale: f64,
    longitudes: Vec<f64>,
    latitudes: Vec<f64>,
    lattice: FxHashMap<(u64, u64), usize>,
}

impl TerrainGrid {
    /// Build a grid from samples. Longitudes above 180° are wrapped into (-180, 180].
    pub fn new(samples: Vec<TerrainSample>) -> Result<Self, TerrainError> {
        if samples.is_empty() {
            return Err(TerrainError::Empty);
        }
        let samples: Vec<TerrainSample> = samples
            .into_iter()
            .map(|s| TerrainSample {
                longitude: normalize_longitude(s.longitude),
                ..s
            })
            .collect();

        let mean_lat = samples.iter().map(|s| s.latitude).sum::<f64>() / samples.len() as f64;
        let lon_scale = mean_lat.to_radians().cos().abs().max(1e-6);
        let tree = KdTree::build(
            samples
                .iter()
                .map(|s| [s.longitude * lon_scale, s.latitude])
                .collect(),
        );

        let mut lattice = FxHashMap::default();
        for (idx, s) in samples.iter().enumerate() {
            lattice
                .entry((s.longitude.to_bits(), s.latitude.to_bits()))
                .or_insert(idx);
        }
        let longitudes = sorted_unique(samples.iter().map(|s| s.longitude));
        let latitudes = sorted_unique(samples.iter().map(|s| s.latitude));

        Ok(Self {
            samples,
            lookup: TerrainLookup::default(),
            tree,
            lon_scale,
            longitudes,
            latitudes,
            lattice,
        })
    }

    /// Parse whitespace-separated `lon lat elevation` rows. Blank lines and `#` comments are
    /// ignored.
    pub fn parse(text: &str) -> Result<Self, TerrainError> {
        let mut samples = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let values = trimmed
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| TerrainError::Parse {
                    line: line_no,
                    message: e.to_string(),
                })?;
            let [longitude, latitude, elevation] = values[..] else {
                return Err(TerrainError::Parse {
                    line: line_no,
                    message: format!("expected 3 columns, found {}", values.len()),
                });
            };
            samples.push(TerrainSample {
                longitude,
                latitude,
                elevation,
            });
        }
        Self::new(samples)
    }

    /// Load a terrain file from disk.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| TerrainError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Select the lookup strategy used by [`TerrainGrid::elevation_at`].
    pub fn with_lookup(mut self, lookup: TerrainLookup) -> Self {
        self.lookup = lookup;
        self
    }

    pub fn lookup(&self) -> TerrainLookup {
        self.lookup
    }

    pub fn samples(&self) -> &[TerrainSample] {
        &self.samples
    }

    /// Ground elevation (m) under a geographic position.
    pub fn elevation_at(&self, longitude: f64, latitude: f64) -> f64 {
        let longitude = normalize_longitude(longitude);
        let idx = match self.lookup {
            TerrainLookup::Nearest => self.nearest_index(longitude, latitude),
            TerrainLookup::AxisAligned => self
                .lattice_index(longitude, latitude)
                .unwrap_or_else(|| {
                    debug!(longitude, latitude, "no lattice node at nearest axes; using nearest sample");
                    self.nearest_index(longitude, latitude)
                }),
        };
        self.samples[idx].elevation
    }

    /// True once the ground at (lon, lat) reaches the given altitude.
    pub fn is_landed(&self, longitude: f64, latitude: f64, altitude: f64) -> bool {
        self.elevation_at(longitude, latitude) >= altitude - LANDING_TOLERANCE_M
    }

    fn nearest_index(&self, longitude: f64, latitude: f64) -> usize {
        // The tree is never empty: `new` rejects empty grids.
        self.tree
            .nearest([longitude * self.lon_scale, latitude])
            .unwrap_or(0)
    }

    fn lattice_index(&self, longitude: f64, latitude: f64) -> Option<usize> {
        let lon = nearest_value(&self.longitudes, longitude)?;
        let lat = nearest_value(&self.latitudes, latitude)?;
        self.lattice.get(&(lon.to_bits(), lat.to_bits())).copied()
    }
}

fn normalize_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else {
        longitude
    }
}

fn sorted_unique(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut out: Vec<f64> = values.collect();
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

/// Closest entry of a sorted slice; the lower value wins a tie.
fn nearest_value(sorted: &[f64], target: f64) -> Option<f64> {
    let pos = sorted.partition_point(|&v| v < target);
    let above = sorted.get(pos).copied();
    let below = pos.checked_sub(1).and_then(|i| sorted.get(i)).copied();
    match (below, above) {
        (Some(b), Some(a)) => Some(if target - b <= a - target { b } else { a }),
        (Some(b), None) => Some(b),
        (None, a) => a,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular_grid() -> TerrainGrid {
        let mut text = String::new();
        for i in 0..5 {
            for j in 0..5 {
                let lon = 283.5 + 0.1 * i as f64;
                let lat = 43.5 + 0.1 * j as f64;
                let elevation = 100.0 * i as f64 + 10.0 * j as f64;
                text.push_str(&format!("{lon} {lat} {elevation}\n"));
            }
        }
        TerrainGrid::parse(&text).expect("terrain parse")
    }

    #[test]
    fn longitudes_are_wrapped() {
        let grid = regular_grid();
        assert!(grid.samples().iter().all(|s| s.longitude < 0.0));
        assert!((grid.samples()[0].longitude + 76.5).abs() < 1e-9);
    }

    #[test]
    fn strategies_agree_on_regular_grid() {
        let nearest = regular_grid();
        let axis = regular_grid().with_lookup(TerrainLookup::AxisAligned);
        assert_eq!(nearest.lookup(), TerrainLookup::Nearest);
        assert_eq!(axis.lookup(), TerrainLookup::AxisAligned);
        for (lon, lat) in [(-76.48, 43.52), (-76.21, 43.79), (-76.33, 43.66), (-75.0, 45.0)] {
            assert_eq!(nearest.elevation_at(lon, lat), axis.elevation_at(lon, lat), "{lon},{lat}");
        }
        assert_eq!(nearest.elevation_at(-76.29, 43.71), 220.0);
    }

    #[test]
    fn landing_is_monotonic_in_altitude() {
        let grid = regular_grid();
        let ground = grid.elevation_at(-76.3, 43.6);
        assert!(!grid.is_landed(-76.3, 43.6, ground + 1.0));
        for alt in [ground, ground - 1.0, ground - 100.0, -500.0] {
            assert!(grid.is_landed(-76.3, 43.6, alt));
        }
    }

    #[test]
    fn axis_aligned_falls_back_on_irregular_grid() {
        let grid = TerrainGrid::parse("-76.0 43.0 10\n-75.0 44.0 20\n")
            .unwrap()
            .with_lookup(TerrainLookup::AxisAligned);
        // Nearest lon is -76.0, nearest lat is 44.0: that node does not exist.
        assert_eq!(grid.elevation_at(-75.9, 43.9), 20.0);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(TerrainGrid::parse("\n# nothing\n"), Err(TerrainError::Empty)));
        assert!(matches!(
            TerrainGrid::parse("1 2\n"),
            Err(TerrainError::Parse { line: 1, .. })
        ));
        assert!(matches!(
            TerrainGrid::parse("1 2 x\n"),
            Err(TerrainError::Parse { line: 1, .. })
        ));
    }
}
