//! Balloon state, the local reference frame, and the append-only flight track.

use balloon_core::vector::{self, Vector3};
use balloon_geodesy::TangentPlane;

/// Simulation cursor: where the balloon is and how long it has been flying.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalloonState {
    pub longitude: f64,
    pub latitude: f64,
    /// Metres above mean sea level.
    pub altitude: f64,
    /// Seconds since launch (or since the first tracker fix in descent-only runs).
    pub elapsed_time: f64,
}

impl BalloonState {
    pub fn new(longitude: f64, latitude: f64, altitude: f64) -> Self {
        Self {
            longitude,
            latitude,
            altitude,
            elapsed_time: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && self.altitude.is_finite()
            && self.elapsed_time.is_finite()
    }
}

/// Tangent plane fixed for a whole run, anchored on the ground (altitude 0) below a point.
///
/// The anchor never follows the balloon; positions far from it inherit the flat-plane error,
/// which stays small over the tens of kilometres a sounding balloon drifts.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceFrame {
    plane: TangentPlane,
}

impl ReferenceFrame {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            plane: TangentPlane::new(longitude, latitude, 0.0),
        }
    }

    /// Frame anchored below the given state.
    pub fn below(state: &BalloonState) -> Self {
        Self::new(state.longitude, state.latitude)
    }

    pub fn plane(&self) -> &TangentPlane {
        &self.plane
    }

    /// Local (east, north, up) coordinates of a geographic point.
    pub fn to_local(&self, longitude: f64, latitude: f64, altitude: f64) -> Vector3 {
        self.plane.geodetic_to_local(longitude, latitude, altitude)
    }

    /// Move a state by a local displacement and advance its clock by `dt`.
    pub fn advect(&self, state: &BalloonState, displacement: Vector3, dt: f64) -> BalloonState {
        let local = self.to_local(state.longitude, state.latitude, state.altitude);
        let moved = self.plane.local_to_geodetic(&vector::add(&local, &displacement));
        BalloonState {
            longitude: moved.longitude_deg,
            latitude: moved.latitude_deg,
            altitude: moved.altitude_m,
            elapsed_time: state.elapsed_time + dt,
        }
    }
}

/// Flight phase that produced a track point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightPhase {
    Launch,
    Ascent,
    Descent,
}

impl FlightPhase {
    pub fn label(self) -> &'static str {
        match self {
            FlightPhase::Launch => "launch",
            FlightPhase::Ascent => "ascent",
            FlightPhase::Descent => "descent",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackPoint {
    pub state: BalloonState,
    pub phase: FlightPhase,
}

/// Ordered record of a run, starting with the initial state. Only the simulation appends to it.
#[derive(Debug, Clone)]
pub struct Track {
    points: Vec<TrackPoint>,
}

impl Track {
    pub(crate) fn start(initial: BalloonState) -> Self {
        Self {
            points: vec![TrackPoint {
                state: initial,
                phase: FlightPhase::Launch,
            }],
        }
    }

    pub(crate) fn push(&mut self, state: BalloonState, phase: FlightPhase) {
        self.points.push(TrackPoint { state, phase });
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> &TrackPoint {
        &self.points[0]
    }

    /// Final point: the landing once a run has completed.
    pub fn last(&self) -> &TrackPoint {
        &self.points[self.points.len() - 1]
    }

    /// Number of integration steps taken in a phase.
    pub fn steps(&self, phase: FlightPhase) -> usize {
        self.points.iter().filter(|p| p.phase == phase).count()
    }

    /// Last point before the descent started.
    pub fn cutdown(&self) -> &TrackPoint {
        self.points
            .iter()
            .rev()
            .find(|p| p.phase != FlightPhase::Descent)
            .unwrap_or(&self.points[0])
    }

    pub fn states(&self) -> impl Iterator<Item = &BalloonState> {
        self.points.iter().map(|p| &p.state)
    }
}
