//! Altitude-indexed wind and fall-rate estimates drawn from a profile table.

use balloon_core::vector;
use balloon_sounding::{ProfileLevel, ProfileTable};
use tracing::debug;

use crate::track::ReferenceFrame;

/// Observation times closer than this are treated as simultaneous (s).
const MIN_BRACKET_SECONDS: f64 = 1e-6;

/// How levels are chosen for a query altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingMode {
    /// Mean of the `k` levels nearest in altitude.
    Nearest,
    /// As `Nearest`, but when no level lies within `threshold` metres, derive the wind from the
    /// displacement between the closest fix below and the closest fix above.
    GapBridging { threshold: f64 },
    /// Always derive the wind from the closest fix below and the closest fix at or above.
    Bracketing,
}

/// Wind and fall rate at one altitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSample {
    pub u: f64,
    pub v: f64,
    /// `None` when no level contributed.
    pub fall_rate: Option<f64>,
}

impl LevelSample {
    fn calm(fall_rate: Option<f64>) -> Self {
        Self {
            u: 0.0,
            v: 0.0,
            fall_rate,
        }
    }
}

/// Sampler bound to one profile and one reference frame for the life of a run.
#[derive(Debug, Clone, Copy)]
pub struct LevelSampler<'a> {
    levels: &'a [ProfileLevel],
    frame: &'a ReferenceFrame,
    k: usize,
    mode: SamplingMode,
}

impl<'a> LevelSampler<'a> {
    pub fn new(profile: &'a ProfileTable, frame: &'a ReferenceFrame, k: usize, mode: SamplingMode) -> Self {
        Self::over(profile.levels(), frame, k, mode)
    }

    /// Sampler over a raw slice of levels, which may be empty.
    pub fn over(levels: &'a [ProfileLevel], frame: &'a ReferenceFrame, k: usize, mode: SamplingMode) -> Self {
        Self {
            levels,
            frame,
            k: k.max(1),
            mode,
        }
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }

    /// Estimate wind and fall rate at `altitude`. Never fails: with nothing to go on it returns
    /// a calm sample without a fall rate.
    pub fn sample(&self, altitude: f64) -> LevelSample {
        if self.levels.is_empty() {
            debug!(altitude, "empty profile; calm sample");
            return LevelSample::calm(None);
        }
        match self.mode {
            SamplingMode::Nearest => self.nearest_mean(altitude),
            SamplingMode::GapBridging { threshold } => {
                let gap = self
                    .levels
                    .iter()
                    .map(|l| (l.altitude - altitude).abs())
                    .fold(f64::INFINITY, f64::min);
                if gap <= threshold {
                    return self.nearest_mean(altitude);
                }
                match self.bracket(altitude, false) {
                    (Some(below), Some(above)) => self
                        .bridge(below, above)
                        .unwrap_or_else(|| self.nearest_mean(altitude)),
                    _ => {
                        debug!(altitude, gap, "gap without levels on both sides; using nearest mean");
                        self.nearest_mean(altitude)
                    }
                }
            }
            SamplingMode::Bracketing => match self.bracket(altitude, true) {
                (Some(below), Some(above)) => self
                    .bridge(below, above)
                    .unwrap_or_else(|| self.nearest_mean(altitude)),
                (Some(side), None) | (None, Some(side)) => {
                    debug!(altitude, "one-sided bracket; calm sample");
                    LevelSample::calm(Some(side.fall_rate))
                }
                (None, None) => LevelSample::calm(None),
            },
        }
    }

    /// Indices of the `k` levels nearest to `altitude`, ties broken by input order.
    pub fn nearest_indices(&self, altitude: f64) -> Vec<usize> {
        let mut keyed: Vec<(f64, usize)> = self
            .levels
            .iter()
            .enumerate()
            .map(|(i, l)| ((l.altitude - altitude).abs(), i))
            .collect();
        let by_key = |a: &(f64, usize), b: &(f64, usize)| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1));
        let k = self.k.min(keyed.len());
        if k < keyed.len() {
            keyed.select_nth_unstable_by(k - 1, by_key);
            keyed.truncate(k);
        }
        keyed.sort_unstable_by(by_key);
        keyed.into_iter().map(|(_, i)| i).collect()
    }

    fn nearest_mean(&self, altitude: f64) -> LevelSample {
        let picked = self.nearest_indices(altitude);
        if picked.is_empty() {
            return LevelSample::calm(None);
        }
        let n = picked.len() as f64;
        let (u, v, fall) = picked.iter().fold((0.0, 0.0, 0.0), |(u, v, f), &i| {
            let level = &self.levels[i];
            (u + level.u, v + level.v, f + level.fall_rate)
        });
        LevelSample {
            u: u / n,
            v: v / n,
            fall_rate: Some(fall / n),
        }
    }

    /// Closest level strictly below and closest level above (optionally at) `altitude`.
    fn bracket(&self, altitude: f64, inclusive_above: bool) -> (Option<&'a ProfileLevel>, Option<&'a ProfileLevel>) {
        let mut below: Option<&ProfileLevel> = None;
        let mut above: Option<&ProfileLevel> = None;
        for level in self.levels {
            if level.altitude < altitude {
                if below.is_none_or(|b| level.altitude > b.altitude) {
                    below = Some(level);
                }
            } else if level.altitude > altitude || inclusive_above {
                if above.is_none_or(|a| level.altitude < a.altitude) {
                    above = Some(level);
                }
            }
        }
        (below, above)
    }

    /// Horizontal velocity implied by the displacement between two timed fixes.
    fn bridge(&self, below: &ProfileLevel, above: &ProfileLevel) -> Option<LevelSample> {
        let (lon_lo, lat_lo, t_lo) = below.fix()?;
        let (lon_hi, lat_hi, t_hi) = above.fix()?;
        let dt = t_hi - t_lo;
        if dt.abs() < MIN_BRACKET_SECONDS {
            debug!(below = below.altitude, above = above.altitude, "bracketing fixes share a timestamp");
            return None;
        }
        let p_lo = self.frame.to_local(lon_lo, lat_lo, below.altitude);
        let p_hi = self.frame.to_local(lon_hi, lat_hi, above.altitude);
        let movement = vector::sub(&p_hi, &p_lo);
        Some(LevelSample {
            u: movement[0] / dt,
            v: movement[1] / dt,
            fall_rate: Some(0.5 * (below.fall_rate + above.fall_rate)),
        })
    }
}
