//! Angle normalization helpers.
//!
//! | Function | Input | Output Range |
//! |----------|-------|--------------|
//! | [`normalize_angle_rad`] | radians | (-π, π] |
//! | [`normalize_angle_to_positive`] | radians | [0, 2π) |

use crate::constants::{PI, TWOPI};

/// Normalizes an angle in radians to the range (-π, π].
#[inline]
pub fn normalize_angle_rad(angle: f64) -> f64 {
    let mut normalized = angle % TWOPI;
    if normalized > PI {
        normalized -= TWOPI;
    } else if normalized <= -PI {
        normalized += TWOPI;
    }
    normalized
}

/// Normalizes an angle in radians to the range [0, 2π).
#[inline]
pub fn normalize_angle_to_positive(angle: f64) -> f64 {
    let mut a = angle % TWOPI;
    if a < 0.0 {
        a += TWOPI;
    }
    if a >= TWOPI {
        a -= TWOPI;
    }
    a
}
