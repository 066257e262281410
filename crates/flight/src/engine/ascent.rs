//! Constant-rate ascent under sampled winds.

use tracing::debug;

use crate::sampler::LevelSampler;
use crate::settings::SimulationConfig;
use crate::track::{BalloonState, FlightPhase, ReferenceFrame, Track};

/// Remaining times shorter than this do not start another step (s).
const TIME_EPSILON_S: f64 = 1e-9;

/// Climb from `start` for `time_to_cutdown` seconds. The last step is shortened so the ascent
/// ends exactly at cutdown; a non-positive duration takes no steps.
pub(crate) fn ascend(
    start: BalloonState,
    time_to_cutdown: f64,
    sampler: &LevelSampler<'_>,
    frame: &ReferenceFrame,
    config: &SimulationConfig,
    track: &mut Track,
) -> BalloonState {
    let cutdown_time = start.elapsed_time + time_to_cutdown;
    let mut state = start;
    while cutdown_time - state.elapsed_time > TIME_EPSILON_S {
        let dt = config.ascent_interval.min(cutdown_time - state.elapsed_time);
        let wind = sampler.sample(state.altitude);
        let displacement = [dt * wind.u, dt * wind.v, dt * config.rise_rate];
        state = frame.advect(&state, displacement, dt);
        track.push(state, FlightPhase::Ascent);
    }
    debug!(
        steps = track.steps(FlightPhase::Ascent),
        altitude = state.altitude,
        "ascent complete"
    );
    state
}
