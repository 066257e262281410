//! Simulation parameters and the per-source presets.

use balloon_config::{SimulationOverrides, TerrainLookupConfig};
use balloon_core::constants::RISE_RATE_M_S;
use balloon_sounding::ProfileSource;
use balloon_terrain::TerrainLookup;

use crate::error::FlightError;

/// Smallest fall rate accepted by the descent integrator (m/s).
pub const MIN_FALL_RATE_M_S: f64 = 1e-2;

/// Parameters that stay fixed for one simulation run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationConfig {
    /// Constant ascent rate (m/s).
    pub rise_rate: f64,
    /// Ascent time step (s).
    pub ascent_interval: f64,
    /// Altitude lost per descent step (m).
    pub descent_interval: f64,
    /// Levels averaged per sample.
    pub k_nearest: usize,
    /// Altitude gap (m) above which GPS fixes are bridged.
    pub gap_threshold: f64,
    /// Levels carry position and time fixes usable for gap bridging.
    pub gps_available: bool,
    /// Always sample by bracketing fixes (tracker feeds).
    pub force_bracketing: bool,
    /// Longest ascent accepted, in steps; a cutdown time needing more is rejected.
    pub max_ascent_steps: usize,
    pub max_descent_steps: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rise_rate: RISE_RATE_M_S,
            ascent_interval: 10.0,
            descent_interval: 50.0,
            k_nearest: 10,
            gap_threshold: 100.0,
            gps_available: false,
            force_bracketing: false,
            max_ascent_steps: 10_000,
            max_descent_steps: 10_000,
        }
    }
}

impl SimulationConfig {
    /// Preset matching the resolution of each profile source.
    pub fn for_source(source: ProfileSource) -> Self {
        let base = Self::default();
        match source {
            ProfileSource::Sounding => base,
            ProfileSource::GpsSounding => Self {
                gps_available: true,
                ..base
            },
            ProfileSource::Model => Self {
                ascent_interval: 30.0,
                k_nearest: 2,
                ..base
            },
            ProfileSource::Tracker => Self {
                gps_available: true,
                force_bracketing: true,
                ..base
            },
        }
    }

    /// Apply the fields set in a run configuration.
    pub fn with_overrides(self, overrides: &SimulationOverrides) -> Self {
        Self {
            rise_rate: overrides.rise_rate.unwrap_or(self.rise_rate),
            ascent_interval: overrides.ascent_interval.unwrap_or(self.ascent_interval),
            descent_interval: overrides.descent_interval.unwrap_or(self.descent_interval),
            k_nearest: overrides.k_nearest.unwrap_or(self.k_nearest),
            gap_threshold: overrides.gap_threshold.unwrap_or(self.gap_threshold),
            gps_available: overrides.gps_available.unwrap_or(self.gps_available),
            force_bracketing: overrides.force_bracketing.unwrap_or(self.force_bracketing),
            max_ascent_steps: overrides.max_ascent_steps.unwrap_or(self.max_ascent_steps),
            max_descent_steps: overrides.max_descent_steps.unwrap_or(self.max_descent_steps),
        }
    }

    pub fn validate(&self) -> Result<(), FlightError> {
        let positive = [
            ("rise_rate", self.rise_rate),
            ("ascent_interval", self.ascent_interval),
            ("descent_interval", self.descent_interval),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FlightError::InvalidConfig(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if !(self.gap_threshold.is_finite() && self.gap_threshold >= 0.0) {
            return Err(FlightError::InvalidConfig(format!(
                "gap_threshold must be non-negative, got {}",
                self.gap_threshold
            )));
        }
        if self.k_nearest == 0 {
            return Err(FlightError::InvalidConfig("k_nearest must be at least 1".into()));
        }
        if self.max_ascent_steps == 0 || self.max_descent_steps == 0 {
            return Err(FlightError::InvalidConfig(
                "max_ascent_steps and max_descent_steps must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Number of ascent steps needed to reach cutdown, counting a shortened final step.
    pub fn ascent_steps_for(&self, time_to_cutdown: f64) -> f64 {
        (time_to_cutdown.max(0.0) / self.ascent_interval).ceil()
    }
}

/// Map the configured lookup name onto the terrain strategy.
pub fn terrain_lookup(config: TerrainLookupConfig) -> TerrainLookup {
    match config {
        TerrainLookupConfig::Nearest => TerrainLookup::Nearest,
        TerrainLookupConfig::AxisAligned => TerrainLookup::AxisAligned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_follow_source_resolution() {
        let sounding = SimulationConfig::for_source(ProfileSource::Sounding);
        assert_eq!(sounding.ascent_interval, 10.0);
        assert_eq!(sounding.k_nearest, 10);
        assert!(!sounding.gps_available);

        let model = SimulationConfig::for_source(ProfileSource::Model);
        assert_eq!(model.ascent_interval, 30.0);
        assert_eq!(model.k_nearest, 2);

        let tracker = SimulationConfig::for_source(ProfileSource::Tracker);
        assert!(tracker.force_bracketing && tracker.gps_available);
        assert!(SimulationConfig::for_source(ProfileSource::GpsSounding).gps_available);
    }

    #[test]
    fn overrides_replace_only_set_fields() {
        let overrides = SimulationOverrides {
            descent_interval: Some(25.0),
            force_bracketing: Some(true),
            ..Default::default()
        };
        let config = SimulationConfig::default().with_overrides(&overrides);
        assert_eq!(config.descent_interval, 25.0);
        assert!(config.force_bracketing);
        assert_eq!(config.rise_rate, RISE_RATE_M_S);
    }

    #[test]
    fn ascent_step_count_rounds_up() {
        let config = SimulationConfig::default();
        assert_eq!(config.ascent_steps_for(600.0), 60.0);
        assert_eq!(config.ascent_steps_for(605.0), 61.0);
        assert_eq!(config.ascent_steps_for(-30.0), 0.0);
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        assert!(SimulationConfig::default().validate().is_ok());
        for config in [
            SimulationConfig {
                rise_rate: 0.0,
                ..Default::default()
            },
            SimulationConfig {
                descent_interval: f64::NAN,
                ..Default::default()
            },
            SimulationConfig {
                k_nearest: 0,
                ..Default::default()
            },
            SimulationConfig {
                max_descent_steps: 0,
                ..Default::default()
            },
            SimulationConfig {
                max_ascent_steps: 0,
                ..Default::default()
            },
        ] {
            assert!(matches!(config.validate(), Err(FlightError::InvalidConfig(_))));
        }
    }
}
