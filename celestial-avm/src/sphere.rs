//! Great-circle separation and position angle between sky positions.
//!
//! Positions are given in degrees and results are returned in radians. Each
//! angular argument is converted exactly once, in `to_radians`,
//! before any trig is evaluated.

use celestial_core::constants::DEG_TO_RAD;
use celestial_core::math::{spherical_bearing, vincenty_angular_separation};

/// Latitude sines/cosines and longitude difference of a pair of points.
struct PointPair {
    sin_lat1: f64,
    cos_lat1: f64,
    sin_lat2: f64,
    cos_lat2: f64,
    delta_lon: f64,
}

#[inline]
fn to_radians(deg: f64) -> f64 {
    deg * DEG_TO_RAD
}

impl PointPair {
    #[inline]
    fn from_degrees(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> Self {
        let lat1 = to_radians(lat1);
        let lat2 = to_radians(lat2);
        let delta_lon = to_radians(lon2 - lon1);

        let (sin_lat1, cos_lat1) = libm::sincos(lat1);
        let (sin_lat2, cos_lat2) = libm::sincos(lat2);
        Self {
            sin_lat1,
            cos_lat1,
            sin_lat2,
            cos_lat2,
            delta_lon,
        }
    }
}

/// Angular separation between two sky positions given in degrees.
///
/// Returns radians in `[0, π]`. Uses the Vincenty formula, so it stays accurate
/// for sub-arcsecond offsets as well as for nearly antipodal points.
pub fn angular_separation(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let p = PointPair::from_degrees(lon1, lat1, lon2, lat2);
    vincenty_angular_separation(p.sin_lat1, p.cos_lat1, p.sin_lat2, p.cos_lat2, p.delta_lon)
}

/// Position angle of point 2 seen from point 1, both given in degrees.
///
/// Returns radians in `(-π, π]`, with north 0 and east +π/2. When the two
/// points coincide the value is meaningless and should not be used.
pub fn position_angle(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let p = PointPair::from_degrees(lon1, lat1, lon2, lat2);
    spherical_bearing(p.sin_lat1, p.cos_lat1, p.sin_lat2, p.cos_lat2, p.delta_lon)
}
