//! Prediction pipeline shared by the command-line front-ends: build the simulation inputs,
//! run the engine, and turn the result into exported artifacts.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use balloon_config::{RunConfig, TerrainLookupConfig};
use balloon_export::summary::{Position, Summary, SweepEntry};
use balloon_export::track::{Record, write_header, writer_for_path};
use balloon_flight::{
    BalloonState, FlightError, LandingSummary, ReferenceFrame, SimulationConfig, Track,
    simulate, simulate_cutdown_sweep, terrain_lookup,
};
use balloon_sounding::{ProfileError, ProfileSource, ProfileTable};
use balloon_terrain::{TerrainError, TerrainGrid};
use thiserror::Error;
use tracing::{info, warn};

use crate::plot::PlotError;

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Terrain(#[from] TerrainError),
    #[error(transparent)]
    Flight(#[from] FlightError),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error("failed to write {path}: {source}")]
    Export {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no terrain file given (use --terrain or terrain.path in the run config)")]
    MissingTerrain,
}

/// Launch point and cutdown delay for a forward prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Launch {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres above mean sea level.
    pub altitude: f64,
    /// Seconds from launch to cutdown.
    pub cutdown_s: f64,
}

/// Completed prediction plus any extra cutdown scenarios.
#[derive(Debug)]
pub struct Prediction {
    pub source: ProfileSource,
    pub track: Track,
    pub summary: LandingSummary,
    /// Cutdown time (s) and its outcome, in the order requested.
    pub sweep: Vec<(f64, Result<LandingSummary, FlightError>)>,
}

/// Source preset with the run configuration's overrides applied.
pub fn simulation_config(source: ProfileSource, run: &RunConfig) -> SimulationConfig {
    SimulationConfig::for_source(source).with_overrides(&run.simulation)
}

/// Load the terrain grid. An explicit path or lookup wins over the run configuration.
pub fn load_terrain(
    path: Option<&Path>,
    lookup: Option<TerrainLookupConfig>,
    run: &RunConfig,
) -> Result<TerrainGrid, RunError> {
    let path = path
        .map(Path::to_path_buf)
        .or_else(|| run.terrain.as_ref().map(|t| t.path.clone()))
        .ok_or(RunError::MissingTerrain)?;
    let lookup = lookup
        .or_else(|| run.terrain.as_ref().map(|t| t.lookup))
        .unwrap_or_default();
    let grid = TerrainGrid::from_path(&path)?.with_lookup(terrain_lookup(lookup));
    info!(
        path = %path.display(),
        samples = grid.samples().len(),
        lookup = ?grid.lookup(),
        "terrain loaded"
    );
    Ok(grid)
}

/// Ascent from `launch` to cutdown, then descent to the terrain. Each `sweep_s` entry is an
/// additional cutdown time simulated in parallel.
pub fn predict_launch(
    source: ProfileSource,
    profile: &ProfileTable,
    terrain: &TerrainGrid,
    launch: Launch,
    sweep_s: &[f64],
    config: &SimulationConfig,
) -> Result<Prediction, FlightError> {
    let (lowest, highest) = profile.altitude_range();
    info!(levels = profile.len(), lowest, highest, "profile coverage");
    if launch.altitude > highest {
        warn!(
            launch_altitude = launch.altitude,
            highest, "launch is above the profile; winds come from its top levels"
        );
    }
    let frame = ReferenceFrame::new(launch.longitude, launch.latitude);
    let initial = BalloonState::new(launch.longitude, launch.latitude, launch.altitude);
    let track = simulate(initial, launch.cutdown_s, profile, terrain, &frame, config)?;
    let sweep = simulate_cutdown_sweep(initial, sweep_s, profile, terrain, &frame, config)
        .into_iter()
        .map(|(t, result)| (t, result.map(|track| LandingSummary::from_track(&track))))
        .collect();
    Ok(Prediction {
        source,
        summary: LandingSummary::from_track(&track),
        track,
        sweep,
    })
}

/// Descent only, starting from the last observed fix of a tracked flight.
pub fn predict_descent(
    profile: &ProfileTable,
    terrain: &TerrainGrid,
    config: &SimulationConfig,
) -> Result<Prediction, FlightError> {
    let last = profile.last();
    let (longitude, latitude, _) = last.fix().ok_or_else(|| {
        FlightError::InvalidInput("tracked flight has no position fix to descend from".into())
    })?;
    let initial = BalloonState::new(longitude, latitude, last.altitude);
    let frame = ReferenceFrame::below(&initial);
    let track = simulate(initial, 0.0, profile, terrain, &frame, config)?;
    Ok(Prediction {
        source: ProfileSource::Tracker,
        summary: LandingSummary::from_track(&track),
        track,
        sweep: Vec::new(),
    })
}

/// The two lines printed for a finished prediction.
pub fn landing_report(summary: &LandingSummary) -> String {
    format!(
        "{:.1} minutes to impact\nEstimated landing lat, lon, alt (m MSL): {:.4} {:.4} {:.1}",
        summary.minutes_to_impact(),
        summary.landing.latitude,
        summary.landing.longitude,
        summary.landing.altitude,
    )
}

/// Write every track point as a CSV row. `-` writes to stdout.
pub fn write_track_csv(path: &Path, track: &Track) -> Result<(), RunError> {
    let export_err = |source| RunError::Export {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = writer_for_path(path).map_err(export_err)?;
    write_header(writer.as_mut()).map_err(export_err)?;
    for (index, point) in track.points().iter().enumerate() {
        Record {
            index,
            phase: point.phase.label(),
            elapsed_s: point.state.elapsed_time,
            longitude_deg: point.state.longitude,
            latitude_deg: point.state.latitude,
            altitude_m: point.state.altitude,
        }
        .write_to(writer.as_mut())
        .map_err(export_err)?;
    }
    writer.flush().map_err(export_err)?;
    Ok(())
}

/// JSON summary of a prediction.
pub fn summary_record(prediction: &Prediction) -> Summary {
    let summary = &prediction.summary;
    Summary {
        source: source_label(prediction.source).to_string(),
        launch: position(&summary.launch),
        cutdown: position(&summary.cutdown),
        landing: position(&summary.landing),
        max_altitude_m: summary.max_altitude,
        minutes_to_impact: summary.minutes_to_impact(),
        ascent_steps: summary.ascent_steps,
        descent_steps: summary.descent_steps,
        sweep: prediction
            .sweep
            .iter()
            .map(|(t, outcome)| SweepEntry {
                cutdown_minutes: balloon_core::units::seconds_to_minutes(*t),
                landing: outcome.as_ref().ok().map(|s| position(&s.landing)),
                error: outcome.as_ref().err().map(ToString::to_string),
            })
            .collect(),
    }
}

pub fn write_summary_json(path: &Path, prediction: &Prediction) -> Result<(), RunError> {
    balloon_export::summary::write_summary(path, &summary_record(prediction)).map_err(|source| {
        RunError::Export {
            path: path.to_path_buf(),
            source,
        }
    })
}

pub fn source_label(source: ProfileSource) -> &'static str {
    match source {
        ProfileSource::Sounding => "sounding",
        ProfileSource::GpsSounding => "gps_sounding",
        ProfileSource::Model => "model",
        ProfileSource::Tracker => "tracker",
    }
}

fn position(state: &BalloonState) -> Position {
    Position {
        longitude_deg: state.longitude,
        latitude_deg: state.latitude,
        altitude_m: state.altitude,
        elapsed_s: state.elapsed_time,
    }
}
