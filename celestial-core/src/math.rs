//! Spherical trigonometry kernels.
//!
//! Both kernels take the sines and cosines of the two latitudes plus the
//! longitude difference in radians, so callers that already hold those values
//! (or that evaluate both kernels for the same pair of points) pay for the trig
//! once.

use crate::constants::{PI, TWOPI};

/// Great-circle distance between two points, in radians.
///
/// Vincenty formula for a sphere. Stable for tiny and near-antipodal
/// separations, where the law of cosines and haversine lose precision.
/// The result lies in `[0, π]`.
#[inline]
pub fn vincenty_angular_separation(
    sin_lat1: f64,
    cos_lat1: f64,
    sin_lat2: f64,
    cos_lat2: f64,
    delta_lon: f64,
) -> f64 {
    let (sin_delta_lon, cos_delta_lon) = libm::sincos(delta_lon);

    let num = libm::hypot(
        cos_lat2 * sin_delta_lon,
        cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_delta_lon,
    );
    let den = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_delta_lon;

    libm::atan2(num, den)
}

/// Bearing from point 1 to point 2, in radians.
///
/// North is 0 and east is +π/2. The result lies in `(-π, π]`; a due-south
/// target reached through a `-0.0` longitude difference gives `π`, not `-π`.
/// Undefined when the points coincide.
#[inline]
pub fn spherical_bearing(
    sin_lat1: f64,
    cos_lat1: f64,
    sin_lat2: f64,
    cos_lat2: f64,
    delta_lon: f64,
) -> f64 {
    let (sin_delta_lon, cos_delta_lon) = libm::sincos(delta_lon);

    let x = sin_lat2 * cos_lat1 - cos_lat2 * sin_lat1 * cos_delta_lon;
    let y = sin_delta_lon * cos_lat2;

    let bearing = libm::atan2(y, x);
    if bearing <= -PI {
        bearing + TWOPI
    } else {
        bearing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::HALF_PI;
    use approx::assert_abs_diff_eq;

    fn sc(lat: f64) -> (f64, f64) {
        libm::sincos(lat)
    }

    #[test]
    fn test_separation_same_point_is_zero() {
        let (s, c) = sc(0.3);
        assert_eq!(vincenty_angular_separation(s, c, s, c, 0.0), 0.0);
    }

    #[test]
    fn test_separation_along_equator() {
        let (s, c) = sc(0.0);
        assert_abs_diff_eq!(
            vincenty_angular_separation(s, c, s, c, 0.5),
            0.5,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_separation_antipodal() {
        let (s1, c1) = sc(0.2);
        let (s2, c2) = sc(-0.2);
        assert_abs_diff_eq!(
            vincenty_angular_separation(s1, c1, s2, c2, PI),
            PI,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_separation_pole_to_equator() {
        let (s1, c1) = sc(HALF_PI);
        let (s2, c2) = sc(0.0);
        assert_abs_diff_eq!(
            vincenty_angular_separation(s1, c1, s2, c2, 1.234),
            HALF_PI,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let (s0, c0) = sc(0.0);
        let (sn, cn) = sc(0.01);
        let (ss, cs) = sc(-0.01);

        assert_abs_diff_eq!(spherical_bearing(s0, c0, sn, cn, 0.0), 0.0, epsilon = 1e-15);
        assert_abs_diff_eq!(spherical_bearing(s0, c0, ss, cs, 0.0), PI, epsilon = 1e-15);
        assert_abs_diff_eq!(
            spherical_bearing(s0, c0, s0, c0, 0.01),
            HALF_PI,
            epsilon = 1e-15
        );
        assert_abs_diff_eq!(
            spherical_bearing(s0, c0, s0, c0, -0.01),
            -HALF_PI,
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_bearing_due_south_with_negative_zero_lon() {
        let (s0, c0) = sc(0.0);
        let (ss, cs) = sc(-0.01);
        assert_eq!(spherical_bearing(s0, c0, ss, cs, -0.0), PI);
    }

    #[test]
    fn test_bearing_toward_pole_is_north() {
        let (s1, c1) = sc(0.7);
        let (s2, c2) = sc(HALF_PI);
        assert_abs_diff_eq!(spherical_bearing(s1, c1, s2, c2, 2.0), 0.0, epsilon = 1e-12);
    }
}
