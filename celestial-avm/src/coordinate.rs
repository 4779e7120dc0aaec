#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pixel position in the image frame.
///
/// 1-based, with (1, 1) at the centre of the upper-left pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PixelCoord {
    x: f64,
    y: f64,
}

impl PixelCoord {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.y
    }

    /// Nearest 0-based `(row, col)` index, or `None` left of or above the image.
    #[inline]
    pub fn to_array_index(&self) -> Option<(usize, usize)> {
        let row = (self.y - 1.0).round();
        let col = (self.x - 1.0).round();
        if row < 0.0 || col < 0.0 || !row.is_finite() || !col.is_finite() {
            return None;
        }
        Some((row as usize, col as usize))
    }

    #[inline]
    pub fn from_array_index(row: usize, col: usize) -> Self {
        Self {
            x: col as f64 + 1.0,
            y: row as f64 + 1.0,
        }
    }
}

impl From<PixelCoord> for (f64, f64) {
    fn from(p: PixelCoord) -> Self {
        (p.x, p.y)
    }
}

/// Equatorial sky position in degrees.
///
/// Right ascension is not wrapped and declination is not clamped.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SkyCoord {
    ra: f64,
    dec: f64,
}

impl SkyCoord {
    #[inline]
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra: ra_deg,
            dec: dec_deg,
        }
    }

    #[inline]
    pub fn ra_deg(&self) -> f64 {
        self.ra
    }

    #[inline]
    pub fn dec_deg(&self) -> f64 {
        self.dec
    }

    /// Great-circle distance to `other`, in radians.
    pub fn separation(&self, other: &SkyCoord) -> f64 {
        crate::sphere::angular_separation(self.ra, self.dec, other.ra, other.dec)
    }

    /// Position angle of `other` as seen from `self`, in radians east of north.
    pub fn position_angle(&self, other: &SkyCoord) -> f64 {
        crate::sphere::position_angle(self.ra, self.dec, other.ra, other.dec)
    }
}
