//! Trajectory engine: samples winds from a profile, integrates the ascent to cutdown and the
//! descent to the terrain, and records the track.

mod engine;
mod error;
pub mod sampler;
mod settings;
mod summary;
pub mod track;

pub use engine::{sampling_mode, simulate, simulate_cutdown_sweep};
pub use error::FlightError;
pub use sampler::{LevelSample, LevelSampler, SamplingMode};
pub use settings::{MIN_FALL_RATE_M_S, SimulationConfig, terrain_lookup};
pub use summary::LandingSummary;
pub use track::{BalloonState, FlightPhase, ReferenceFrame, Track, TrackPoint};
