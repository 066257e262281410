//! Fixed-altitude-step descent until the balloon meets the terrain.

use balloon_terrain::TerrainGrid;
use tracing::{debug, trace};

use crate::error::FlightError;
use crate::sampler::LevelSampler;
use crate::settings::{MIN_FALL_RATE_M_S, SimulationConfig};
use crate::track::{BalloonState, FlightPhase, ReferenceFrame, Track};

/// Fall from `start` in `descent_interval` steps; each step lasts `descent_interval / fall_rate`.
pub(crate) fn descend(
    start: BalloonState,
    sampler: &LevelSampler<'_>,
    frame: &ReferenceFrame,
    terrain: &TerrainGrid,
    config: &SimulationConfig,
    track: &mut Track,
) -> Result<BalloonState, FlightError> {
    let mut state = start;
    for step in 1..=config.max_descent_steps {
        let sample = sampler.sample(state.altitude);
        let fall_rate = match sample.fall_rate {
            Some(rate) if rate.is_finite() && rate >= MIN_FALL_RATE_M_S => rate,
            other => {
                return Err(FlightError::NonPhysicalFallRate {
                    altitude: state.altitude,
                    step,
                    fall_rate: other,
                });
            }
        };
        let dt = config.descent_interval / fall_rate;
        let displacement = [dt * sample.u, dt * sample.v, -config.descent_interval];
        state = frame.advect(&state, displacement, dt);
        track.push(state, FlightPhase::Descent);
        trace!(step, altitude = state.altitude, fall_rate, "descent step");

        if terrain.is_landed(state.longitude, state.latitude, state.altitude) {
            debug!(steps = step, altitude = state.altitude, "landed");
            return Ok(state);
        }
    }
    Err(FlightError::NonTermination {
        steps: config.max_descent_steps,
        altitude: state.altitude,
    })
}
