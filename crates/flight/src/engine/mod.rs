//! Flight orchestration: ascent to cutdown, then descent to the ground.

mod ascent;
mod descent;

use balloon_sounding::ProfileTable;
use balloon_terrain::TerrainGrid;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::FlightError;
use crate::sampler::{LevelSampler, SamplingMode};
use crate::settings::SimulationConfig;
use crate::track::{BalloonState, FlightPhase, ReferenceFrame, Track};

/// Simulate one flight. The returned track starts with `initial`, holds one point per ascent
/// step up to cutdown, and ends with the descent step that met the terrain.
pub fn simulate(
    initial: BalloonState,
    time_to_cutdown: f64,
    profile: &ProfileTable,
    terrain: &TerrainGrid,
    frame: &ReferenceFrame,
    config: &SimulationConfig,
) -> Result<Track, FlightError> {
    config.validate()?;
    if !initial.is_finite() {
        return Err(FlightError::InvalidInput(format!(
            "initial state must be finite, got {initial:?}"
        )));
    }
    if !time_to_cutdown.is_finite() {
        return Err(FlightError::InvalidInput(format!(
            "time to cutdown must be finite, got {time_to_cutdown}"
        )));
    }
    let ascent_steps = config.ascent_steps_for(time_to_cutdown);
    if ascent_steps > config.max_ascent_steps as f64 {
        return Err(FlightError::InvalidInput(format!(
            "cutdown after {time_to_cutdown} s needs {ascent_steps} ascent steps, limit is {}",
            config.max_ascent_steps
        )));
    }

    let mode = sampling_mode(profile, config);
    let sampler = LevelSampler::new(profile, frame, config.k_nearest, mode);
    debug!(mode = ?sampler.mode(), levels = profile.len(), "sampler ready");
    let mut track = Track::start(initial);

    let cutdown = ascent::ascend(initial, time_to_cutdown, &sampler, frame, config, &mut track);
    info!(
        longitude = cutdown.longitude,
        latitude = cutdown.latitude,
        altitude = cutdown.altitude,
        elapsed_s = cutdown.elapsed_time,
        "cutdown"
    );

    let landing = descent::descend(cutdown, &sampler, frame, terrain, config, &mut track)?;
    info!(
        longitude = landing.longitude,
        latitude = landing.latitude,
        altitude = landing.altitude,
        elapsed_s = landing.elapsed_time,
        descent_steps = track.steps(FlightPhase::Descent),
        "landing"
    );
    Ok(track)
}

/// Simulate the same launch for several cutdown times in parallel. Results keep input order.
pub fn simulate_cutdown_sweep(
    initial: BalloonState,
    cutdown_times: &[f64],
    profile: &ProfileTable,
    terrain: &TerrainGrid,
    frame: &ReferenceFrame,
    config: &SimulationConfig,
) -> Vec<(f64, Result<Track, FlightError>)> {
    cutdown_times
        .par_iter()
        .map(|&t| (t, simulate(initial, t, profile, terrain, frame, config)))
        .collect()
}

/// Pick the sampling mode the configuration asks for, falling back to nearest-level averaging
/// when the profile lacks the fixes bridging needs.
pub fn sampling_mode(profile: &ProfileTable, config: &SimulationConfig) -> SamplingMode {
    if !(config.force_bracketing || config.gps_available) {
        return SamplingMode::Nearest;
    }
    if !profile.supports_gap_bridging() {
        warn!("profile has no position/time fixes; using nearest-level sampling");
        return SamplingMode::Nearest;
    }
    if config.force_bracketing {
        SamplingMode::Bracketing
    } else {
        SamplingMode::GapBridging {
            threshold: config.gap_threshold,
        }
    }
}
