//! Core units, constants, and shared primitives for the balloon predictor workspace.

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Nominal free-lift ascent rate of the sounding balloons (m/s).
    pub const RISE_RATE_M_S: f64 = 6.09;
    /// Knots per metre per second.
    pub const KNOTS_PER_M_S: f64 = 1.943_844;
    /// Numerator of the empirical pressure/fall-rate law (m/s · hPa).
    pub const FALL_LAW_SCALE: f64 = 917.02;
    /// Pressure offset of the fall-rate law (hPa).
    pub const FALL_LAW_PRESSURE_OFFSET_HPA: f64 = 11.0;
    /// Asymptotic fall rate near the surface (m/s).
    pub const FALL_LAW_FLOOR_M_S: f64 = 5.167;
    /// Seconds per minute.
    pub const SECONDS_PER_MINUTE: f64 = 60.0;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::{KNOTS_PER_M_S, SECONDS_PER_MINUTE};

    /// Convert knots to metres per second.
    #[inline]
    pub fn knots_to_ms(v: f64) -> f64 {
        v / KNOTS_PER_M_S
    }

    /// Convert tenths of a hectopascal (RAP text soundings) to hectopascals.
    #[inline]
    pub fn tenths_to_hpa(v: f64) -> f64 {
        v / 10.0
    }

    /// Convert minutes to seconds.
    #[inline]
    pub fn minutes_to_seconds(minutes: f64) -> f64 {
        minutes * SECONDS_PER_MINUTE
    }

    /// Convert seconds to minutes.
    #[inline]
    pub fn seconds_to_minutes(seconds: f64) -> f64 {
        seconds / SECONDS_PER_MINUTE
    }
}

/// Wind and descent-rate relationships shared by all profile readers.
pub mod atmosphere {
    use super::constants::{FALL_LAW_FLOOR_M_S, FALL_LAW_PRESSURE_OFFSET_HPA, FALL_LAW_SCALE};

    /// Split a meteorological wind report (direction the wind blows *from*, degrees) into
    /// eastward and northward components.
    #[inline]
    pub fn wind_components(direction_deg: f64, speed: f64) -> (f64, f64) {
        let rad = direction_deg.to_radians();
        (-rad.sin() * speed, -rad.cos() * speed)
    }

    /// Parachute fall rate (m/s, positive downward) at the given pressure.
    ///
    /// Empirical fit from recovered flights. Returns `None` for pressures outside the domain
    /// of the fit (non-finite or non-positive) so callers can drop the level instead of
    /// carrying a nonsense rate into the descent.
    pub fn fall_rate_from_pressure(pressure_hpa: f64) -> Option<f64> {
        if !pressure_hpa.is_finite() || pressure_hpa <= 0.0 {
            return None;
        }
        let rate = FALL_LAW_SCALE / (pressure_hpa + FALL_LAW_PRESSURE_OFFSET_HPA) + FALL_LAW_FLOOR_M_S;
        (rate.is_finite() && rate > 0.0).then_some(rate)
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres (ECEF or local ENU depending on context).
    pub type Vector3 = [f64; 3];

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }
}

#[cfg(test)]
mod tests {
    use super::atmosphere::{fall_rate_from_pressure, wind_components};
    use approx::assert_abs_diff_eq;

    #[test]
    fn northerly_wind_blows_south() {
        let (u, v) = wind_components(0.0, 10.0);
        assert_abs_diff_eq!(u, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v, -10.0, epsilon = 1e-12);
    }

    #[test]
    fn westerly_wind_blows_east() {
        let (u, v) = wind_components(270.0, 4.0);
        assert_abs_diff_eq!(u, 4.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn fall_rate_increases_with_altitude() {
        let surface = fall_rate_from_pressure(1000.0).unwrap();
        let aloft = fall_rate_from_pressure(100.0).unwrap();
        assert!(surface > 5.167 && surface < 6.2, "surface = {surface}");
        assert!(aloft > surface);
    }

    #[test]
    fn fall_rate_rejects_invalid_pressure() {
        assert!(fall_rate_from_pressure(0.0).is_none());
        assert!(fall_rate_from_pressure(-5.0).is_none());
        assert!(fall_rate_from_pressure(f64::NAN).is_none());
    }
}
