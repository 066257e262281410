//! WGS-84 geodetic transforms: geographic ↔ ECEF ↔ local East-North-Up tangent plane.
//!
//! Angles cross the public API in degrees, distances in metres. Altitudes are heights above
//! the ellipsoid.

use balloon_core::vector::{self, Vector3};

/// Semi-major axis (m).
pub const WGS84_A: f64 = 6_378_137.0;
/// Flattening.
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// First eccentricity squared.
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

const MAX_LATITUDE_ITERATIONS: usize = 16;
const LATITUDE_CONVERGENCE_RAD: f64 = 1e-14;

/// Geographic position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geodetic {
    pub longitude_deg: f64,
    pub latitude_deg: f64,
    pub altitude_m: f64,
}

/// Convert a geographic position to ECEF (m).
pub fn geodetic_to_ecef(longitude_deg: f64, latitude_deg: f64, altitude_m: f64) -> Vector3 {
    let lat = latitude_deg.to_radians();
    let lon = longitude_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let n = prime_vertical_radius(sin_lat);

    [
        (n + altitude_m) * cos_lat * cos_lon,
        (n + altitude_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + altitude_m) * sin_lat,
    ]
}

/// Convert ECEF (m) back to a geographic position.
///
/// Fixed-point iteration on geodetic latitude; the height uses the form that stays well
/// conditioned at the poles.
pub fn ecef_to_geodetic(ecef: &Vector3) -> Geodetic {
    let [x, y, z] = *ecef;
    let p = x.hypot(y);
    let lon = y.atan2(x);

    let mut lat = z.atan2(p * (1.0 - WGS84_E2));
    for _ in 0..MAX_LATITUDE_ITERATIONS {
        let sin_lat = lat.sin();
        let n = prime_vertical_radius(sin_lat);
        let next = (z + WGS84_E2 * n * sin_lat).atan2(p);
        let converged = (next - lat).abs() < LATITUDE_CONVERGENCE_RAD;
        lat = next;
        if converged {
            break;
        }
    }

    let (sin_lat, cos_lat) = lat.sin_cos();
    let altitude = p * cos_lat + z * sin_lat - WGS84_A * (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Geodetic {
        longitude_deg: lon.to_degrees(),
        latitude_deg: lat.to_degrees(),
        altitude_m: altitude,
    }
}

#[inline]
fn prime_vertical_radius(sin_lat: f64) -> f64 {
    WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt()
}

/// Local East-North-Up frame anchored at a fixed geographic point.
#[derive(Debug, Clone, Copy)]
pub struct TangentPlane {
    origin_ecef: Vector3,
    east: Vector3,
    north: Vector3,
    up: Vector3,
}

impl TangentPlane {
    /// Build the plane tangent to the ellipsoid at the given anchor.
    pub fn new(longitude_deg: f64, latitude_deg: f64, altitude_m: f64) -> Self {
        let (sin_lat, cos_lat) = latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = longitude_deg.to_radians().sin_cos();
        Self {
            origin_ecef: geodetic_to_ecef(longitude_deg, latitude_deg, altitude_m),
            east: [-sin_lon, cos_lon, 0.0],
            north: [-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat],
            up: [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat],
        }
    }

    /// Rotate an ECEF point into local (east, north, up) metres.
    pub fn to_local(&self, ecef: &Vector3) -> Vector3 {
        let d = vector::sub(ecef, &self.origin_ecef);
        [
            vector::dot(&self.east, &d),
            vector::dot(&self.north, &d),
            vector::dot(&self.up, &d),
        ]
    }

    /// Inverse of [`TangentPlane::to_local`].
    pub fn from_local(&self, local: &Vector3) -> Vector3 {
        let offset = vector::add(
            &vector::add(
                &vector::scale(&self.east, local[0]),
                &vector::scale(&self.north, local[1]),
            ),
            &vector::scale(&self.up, local[2]),
        );
        vector::add(&self.origin_ecef, &offset)
    }

    pub fn geodetic_to_local(&self, longitude_deg: f64, latitude_deg: f64, altitude_m: f64) -> Vector3 {
        self.to_local(&geodetic_to_ecef(longitude_deg, latitude_deg, altitude_m))
    }

    pub fn local_to_geodetic(&self, local: &Vector3) -> Geodetic {
        ecef_to_geodetic(&self.from_local(local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn equator_prime_meridian_lies_on_x_axis() {
        let ecef = geodetic_to_ecef(0.0, 0.0, 0.0);
        assert_abs_diff_eq!(ecef[0], WGS84_A, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef[1], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(ecef[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn round_trip_reproduces_geographic_position() {
        let cases = [
            (-76.0, 43.7, 300.0),
            (-97.4, 35.2, 12_500.0),
            (151.2, -33.9, 0.0),
            (10.0, 89.9, 30_000.0),
            (-179.5, -60.0, 5.0),
        ];
        for (lon, lat, alt) in cases {
            let back = ecef_to_geodetic(&geodetic_to_ecef(lon, lat, alt));
            assert!((back.longitude_deg - lon).abs() < 1e-6, "lon {lon}: {}", back.longitude_deg);
            assert!((back.latitude_deg - lat).abs() < 1e-6, "lat {lat}: {}", back.latitude_deg);
            assert!((back.altitude_m - alt).abs() < 1e-3, "alt {alt}: {}", back.altitude_m);
        }
    }

    #[test]
    fn anchor_maps_to_local_origin() {
        let plane = TangentPlane::new(-76.0, 43.7, 0.0);
        let local = plane.geodetic_to_local(-76.0, 43.7, 0.0);
        for c in local {
            assert_abs_diff_eq!(c, 0.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn height_above_anchor_is_local_up() {
        let plane = TangentPlane::new(-76.0, 43.7, 0.0);
        let local = plane.geodetic_to_local(-76.0, 43.7, 1_000.0);
        assert_abs_diff_eq!(local[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(local[1], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(local[2], 1_000.0, epsilon = 1e-6);
    }

    #[test]
    fn eastward_offset_increases_longitude() {
        let plane = TangentPlane::new(-76.0, 43.7, 0.0);
        let moved = plane.local_to_geodetic(&[1_000.0, 0.0, 0.0]);
        assert!(moved.longitude_deg > -76.0);
        assert_abs_diff_eq!(moved.latitude_deg, 43.7, epsilon = 1e-3);
    }

    #[test]
    fn local_round_trip_is_identity() {
        let plane = TangentPlane::new(-76.0, 43.7, 0.0);
        let local = [12_345.0, -6_789.0, 4_321.0];
        let back = plane.to_local(&plane.from_local(&local));
        for i in 0..3 {
            assert_abs_diff_eq!(back[i], local[i], epsilon = 1e-6);
        }
    }
}
