//! CD-matrix plate calibration.
//!
//! AVM can describe the linear pixel-to-sky mapping either as a per-axis
//! scale plus a rotation, or as a 2×2 CD matrix of degrees/pixel
//! coefficients. [`CdMatrix::decompose`] turns the matrix form into the first
//! form so the rest of the crate only ever deals with scale and rotation.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{AvmError, AvmResult};

/// Scale and rotation recovered from a CD matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateSolution {
    /// Degrees per pixel, x negative (RA increases to the left).
    pub scale: [f64; 2],
    /// Radians, in `(-π, π]`.
    pub rotation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CdMatrix {
    cd: [[f64; 2]; 2],
}

/// Orientation of the pixel grid relative to the sky.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Handedness {
    /// Positive determinant.
    Direct,
    /// Negative determinant, the usual case for sky images.
    Mirrored,
}

impl Handedness {
    fn sign(self) -> f64 {
        match self {
            Handedness::Direct => 1.0,
            Handedness::Mirrored => -1.0,
        }
    }
}

impl CdMatrix {
    #[inline]
    pub fn new(cd: [[f64; 2]; 2]) -> Self {
        Self { cd }
    }

    /// Matrix from the four row-major components of a `Spatial.CDMatrix` tag.
    #[inline]
    pub fn from_row_major(values: [f64; 4]) -> Self {
        Self::new([[values[0], values[1]], [values[2], values[3]]])
    }

    /// Standard FITS composition `CDELTi · PCij` with a pure rotation PC.
    pub fn from_scale_rotation(scale: [f64; 2], rotation: f64) -> Self {
        let (sin_r, cos_r) = libm::sincos(rotation);
        Self::new([
            [scale[0] * cos_r, -scale[1] * sin_r],
            [scale[0] * sin_r, scale[1] * cos_r],
        ])
    }

    #[inline]
    pub fn components(&self) -> [[f64; 2]; 2] {
        self.cd
    }

    #[inline]
    pub fn determinant(&self) -> f64 {
        self.cd[0][0] * self.cd[1][1] - self.cd[0][1] * self.cd[1][0]
    }

    /// Splits the matrix into a plate scale and a rotation.
    ///
    /// The scale magnitude is `sqrt(|det|)`, reported with the x axis flipped.
    /// The sign of the determinant is folded into the rotation so that
    /// mirrored and direct grids both give a well-defined angle.
    pub fn decompose(&self) -> AvmResult<PlateSolution> {
        let determinant = self.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            return Err(AvmError::invalid_calibration(format!(
                "CD matrix is singular (determinant = {})",
                determinant
            )));
        }

        let handedness = if determinant > 0.0 {
            Handedness::Direct
        } else {
            Handedness::Mirrored
        };
        let sign = handedness.sign();

        let magnitude = libm::sqrt(determinant.abs());
        let rotation = libm::atan2(sign * self.cd[0][1], sign * self.cd[0][0]);

        Ok(PlateSolution {
            scale: [-magnitude, magnitude],
            rotation,
        })
    }
}
