use thiserror::Error;

/// Failures raised while integrating a flight.
#[derive(Debug, Error)]
pub enum FlightError {
    /// The sampled fall rate was missing, non-finite, or too close to zero to divide by.
    #[error("non-physical fall rate {fall_rate:?} at {altitude:.1} m (descent step {step})")]
    NonPhysicalFallRate {
        altitude: f64,
        step: usize,
        fall_rate: Option<f64>,
    },
    #[error("descent did not reach terrain after {steps} steps (last altitude {altitude:.1} m)")]
    NonTermination { steps: usize, altitude: f64 },
    #[error("invalid simulation configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid simulation input: {0}")]
    InvalidInput(String),
}
