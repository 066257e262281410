use balloon_core::units::seconds_to_minutes;

use crate::track::{BalloonState, FlightPhase, Track};

/// Landing estimate read off a completed track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandingSummary {
    pub launch: BalloonState,
    pub cutdown: BalloonState,
    pub landing: BalloonState,
    pub ascent_steps: usize,
    pub descent_steps: usize,
    pub max_altitude: f64,
}

impl LandingSummary {
    pub fn from_track(track: &Track) -> Self {
        Self {
            launch: track.first().state,
            cutdown: track.cutdown().state,
            landing: track.last().state,
            ascent_steps: track.steps(FlightPhase::Ascent),
            descent_steps: track.steps(FlightPhase::Descent),
            max_altitude: track
                .states()
                .map(|s| s.altitude)
                .fold(f64::NEG_INFINITY, f64::max),
        }
    }

    /// Seconds from the first track point to impact.
    pub fn flight_time(&self) -> f64 {
        self.landing.elapsed_time - self.launch.elapsed_time
    }

    pub fn minutes_to_impact(&self) -> f64 {
        seconds_to_minutes(self.flight_time())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reads_track_ends() {
        let launch = BalloonState::new(-76.0, 43.7, 300.0);
        let mut track = Track::start(launch);
        let top = BalloonState {
            altitude: 360.9,
            elapsed_time: 10.0,
            ..launch
        };
        track.push(top, FlightPhase::Ascent);
        let ground = BalloonState {
            altitude: 299.0,
            elapsed_time: 130.0,
            ..launch
        };
        track.push(ground, FlightPhase::Descent);

        let summary = LandingSummary::from_track(&track);
        assert_eq!(summary.cutdown, top);
        assert_eq!(summary.landing, ground);
        assert_eq!((summary.ascent_steps, summary.descent_steps), (1, 1));
        assert_eq!(summary.max_altitude, 360.9);
        assert_eq!(summary.minutes_to_impact(), 130.0 / 60.0);
    }
}
