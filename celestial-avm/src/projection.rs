//! Sky position to pixel position.
//!
//! The mapping is a linear zenithal-equidistant approximation about the
//! reference pixel: the angular distance from the reference position is laid
//! out along its position angle, scaled by the plate scale and turned by the
//! plate rotation. Good over the few-arcminute fields of survey cut-outs,
//! increasingly wrong at tens of degrees. No distortion terms are applied.

use celestial_core::constants::RAD_TO_DEG;

use crate::coordinate::{PixelCoord, SkyCoord};
use crate::sphere::{angular_separation, position_angle};
use crate::wcs::AvmWcs;

/// Pixel position of (`ra`, `dec`) degrees in the image described by `wcs`.
///
/// The result is 1-based with (1, 1) at the upper-left pixel. Points off the
/// image are still projected; check with [`AvmWcs::contains_pixel`].
pub fn world_to_pixel(wcs: &AvmWcs, ra: f64, dec: f64) -> PixelCoord {
    let [ra0, dec0] = wcs.reference_value();
    let [x0, y0] = wcs.reference_pixel();
    let [scale_x, scale_y] = wcs.scale();

    let rho_deg = angular_separation(ra0, dec0, ra, dec) * RAD_TO_DEG;
    let phi = position_angle(ra0, dec0, ra, dec);

    let (sin_t, cos_t) = libm::sincos(phi + wcs.rotation());
    let x = rho_deg * sin_t / scale_x + x0;
    let y = rho_deg * cos_t / scale_y + y0;

    // lower-left origin to upper-left origin
    PixelCoord::new(x, wcs.size()[1] as f64 - y + 1.0)
}

impl AvmWcs {
    pub fn world_to_pixel(&self, ra: f64, dec: f64) -> PixelCoord {
        world_to_pixel(self, ra, dec)
    }

    pub fn sky_to_pixel(&self, sky: SkyCoord) -> PixelCoord {
        world_to_pixel(self, sky.ra_deg(), sky.dec_deg())
    }
}
