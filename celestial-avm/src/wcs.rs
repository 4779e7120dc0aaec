//! The calibration record of one image and its extraction from AVM tags.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::coordinate::{PixelCoord, SkyCoord};
use crate::error::{AvmError, AvmResult};
use crate::linear::CdMatrix;
use crate::tags::{
    TagProvider, CD_MATRIX, COORDINATE_FRAME, IMAGE_HEIGHT, IMAGE_WIDTH, REFERENCE_DIMENSION,
    REFERENCE_PIXEL, REFERENCE_VALUE, ROTATION, SCALE,
};
use crate::trace::{trace_event, trace_span};

/// Equatorial frames accepted in `Spatial.CoordinateFrame`.
const EQUATORIAL_FRAMES: [&str; 3] = ["ICRS", "FK5", "FK4"];

/// Linear sky calibration of an image, as carried by AVM metadata.
///
/// Built once per image and then only read. Use [`AvmWcs::new`] to construct
/// one from known values or [`AvmWcs::from_tags`] to decode one from
/// metadata; both reject records that would make projection meaningless.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AvmWcs {
    reference_value: [f64; 2],
    reference_pixel: [f64; 2],
    size: [u32; 2],
    scale: [f64; 2],
    rotation: f64,
}

impl AvmWcs {
    /// * `reference_value` - (RA, Dec) in degrees at `reference_pixel`.
    /// * `reference_pixel` - 1-based (x, y).
    /// * `size` - (width, height) in pixels.
    /// * `scale` - signed degrees per pixel on each axis.
    /// * `rotation` - radians.
    pub fn new(
        reference_value: [f64; 2],
        reference_pixel: [f64; 2],
        size: [u32; 2],
        scale: [f64; 2],
        rotation: f64,
    ) -> AvmResult<Self> {
        if !reference_value.iter().all(|v| v.is_finite()) {
            return Err(AvmError::invalid_calibration(format!(
                "reference value {:?} is not finite",
                reference_value
            )));
        }
        if !reference_pixel.iter().all(|v| v.is_finite()) {
            return Err(AvmError::invalid_calibration(format!(
                "reference pixel {:?} is not finite",
                reference_pixel
            )));
        }
        if size.contains(&0) {
            return Err(AvmError::invalid_calibration(format!(
                "image size {}x{} is empty",
                size[0], size[1]
            )));
        }
        if !scale.iter().all(|s| s.is_finite() && *s != 0.0) {
            return Err(AvmError::invalid_calibration(format!(
                "scale {:?} must be finite and non-zero",
                scale
            )));
        }
        if !rotation.is_finite() {
            return Err(AvmError::invalid_calibration("rotation is not finite"));
        }

        Ok(Self {
            reference_value,
            reference_pixel,
            size,
            scale,
            rotation,
        })
    }

    /// Decodes the calibration from AVM tags.
    ///
    /// `Spatial.CDMatrix` wins over `Spatial.Scale` + `Spatial.Rotation` when
    /// both are present. Image size comes from the `Image Width` and
    /// `Image Height` tags, or from `Spatial.ReferenceDimension` when those are
    /// absent.
    pub fn from_tags<P: TagProvider>(tags: &P) -> AvmResult<Self> {
        let _span = trace_span!("extract_wcs").entered();

        check_frame(tags)?;

        let reference_value = tags.require_numbers::<2>(REFERENCE_VALUE)?;
        let reference_pixel = tags.require_numbers::<2>(REFERENCE_PIXEL)?;
        let size = image_size(tags)?;

        let (scale, rotation, encoding) = if tags.contains(CD_MATRIX) {
            let cd = CdMatrix::from_row_major(tags.require_numbers::<4>(CD_MATRIX)?);
            let plate = cd.decompose()?;
            (plate.scale, plate.rotation, "cd_matrix")
        } else {
            let scale = tags.require_numbers::<2>(SCALE)?;
            let rotation = tags.require_number(ROTATION)?.to_radians();
            (scale, rotation, "scale_rotation")
        };

        trace_event!(
            "wcs_extracted",
            encoding = encoding,
            scale_x = scale[0],
            scale_y = scale[1],
            rotation = rotation,
        );

        Self::new(reference_value, reference_pixel, size, scale, rotation)
    }

    #[inline]
    pub fn reference_value(&self) -> [f64; 2] {
        self.reference_value
    }

    #[inline]
    pub fn reference_sky(&self) -> SkyCoord {
        SkyCoord::new(self.reference_value[0], self.reference_value[1])
    }

    #[inline]
    pub fn reference_pixel(&self) -> [f64; 2] {
        self.reference_pixel
    }

    #[inline]
    pub fn size(&self) -> [u32; 2] {
        self.size
    }

    #[inline]
    pub fn scale(&self) -> [f64; 2] {
        self.scale
    }

    #[inline]
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Same calibration with a different rotation.
    pub fn with_rotation(&self, rotation: f64) -> AvmResult<Self> {
        Self::new(
            self.reference_value,
            self.reference_pixel,
            self.size,
            self.scale,
            rotation,
        )
    }

    /// Whether `pixel` falls on the image, counting each pixel as the unit
    /// square centred on its integer coordinate.
    pub fn contains_pixel(&self, pixel: PixelCoord) -> bool {
        let width = self.size[0] as f64;
        let height = self.size[1] as f64;
        (0.5..=width + 0.5).contains(&pixel.x()) && (0.5..=height + 0.5).contains(&pixel.y())
    }
}

/// Free-function form of [`AvmWcs::from_tags`].
pub fn extract_wcs<P: TagProvider>(tags: &P) -> AvmResult<AvmWcs> {
    AvmWcs::from_tags(tags)
}

fn check_frame<P: TagProvider>(tags: &P) -> AvmResult<()> {
    match tags.get_text(COORDINATE_FRAME) {
        Some(frame) if !EQUATORIAL_FRAMES.iter().any(|f| f.eq_ignore_ascii_case(frame)) => {
            Err(AvmError::unsupported_frame(frame))
        }
        _ => Ok(()),
    }
}

fn image_size<P: TagProvider>(tags: &P) -> AvmResult<[u32; 2]> {
    if tags.contains(IMAGE_WIDTH) || !tags.contains(REFERENCE_DIMENSION) {
        let width = pixel_count(IMAGE_WIDTH, tags.require_number(IMAGE_WIDTH)?)?;
        let height = pixel_count(IMAGE_HEIGHT, tags.require_number(IMAGE_HEIGHT)?)?;
        return Ok([width, height]);
    }

    let [width, height] = tags.require_numbers::<2>(REFERENCE_DIMENSION)?;
    Ok([
        pixel_count(REFERENCE_DIMENSION, width)?,
        pixel_count(REFERENCE_DIMENSION, height)?,
    ])
}

fn pixel_count(tag: &str, value: f64) -> AvmResult<u32> {
    if value < 1.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
        return Err(AvmError::malformed_value(
            tag,
            format!("{} is not a positive whole number of pixels", value),
        ));
    }
    Ok(value as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::TagMap;
    use approx::assert_abs_diff_eq;
    use celestial_core::constants::PI;

    fn scale_rotation_tags() -> TagMap {
        let mut tags = TagMap::new();
        tags.set_numbers(REFERENCE_VALUE, &[174.6223379922916479, 17.9759266940022933])
            .set_numbers(REFERENCE_PIXEL, &[149.0, 149.0])
            .set_numbers(SCALE, &[-0.000280556, 0.000280556])
            .set_number(ROTATION, 90.0)
            .set_number(IMAGE_WIDTH, 298.0)
            .set_number(IMAGE_HEIGHT, 298.0);
        tags
    }

    #[test]
    fn test_extract_scale_rotation() {
        let wcs = AvmWcs::from_tags(&scale_rotation_tags()).unwrap();
        assert_eq!(wcs.reference_value(), [174.6223379922916479, 17.9759266940022933]);
        assert_eq!(wcs.reference_pixel(), [149.0, 149.0]);
        assert_eq!(wcs.size(), [298, 298]);
        assert_eq!(wcs.scale(), [-0.000280556, 0.000280556]);
        assert_abs_diff_eq!(wcs.rotation(), PI / 2.0, epsilon = 1e-15);
    }

    #[test]
    fn test_cd_matrix_takes_precedence() {
        let mut tags = scale_rotation_tags();
        tags.set_numbers(CD_MATRIX, &[-0.5, 0.0, 0.0, 0.5]);
        let wcs = extract_wcs(&tags).unwrap();
        assert_eq!(wcs.scale(), [-0.5, 0.5]);
        assert_abs_diff_eq!(wcs.rotation(), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn test_cd_matrix_without_scale_tags() {
        let mut tags = scale_rotation_tags();
        tags.remove(SCALE);
        tags.remove(ROTATION);
        tags.set_numbers(CD_MATRIX, &[-0.5, 0.0, 0.0, 0.5]);
        assert!(extract_wcs(&tags).is_ok());
    }

    #[test]
    fn test_zero_cd_matrix() {
        let mut tags = scale_rotation_tags();
        tags.set_numbers(CD_MATRIX, &[0.0, 0.0, 0.0, 0.0]);
        assert!(matches!(
            extract_wcs(&tags),
            Err(AvmError::InvalidCalibration { .. })
        ));
    }

    #[test]
    fn test_missing_reference_value() {
        let mut tags = scale_rotation_tags();
        tags.remove(REFERENCE_VALUE);
        match extract_wcs(&tags) {
            Err(AvmError::MissingTag { tag }) => assert_eq!(tag, REFERENCE_VALUE),
            other => panic!("Expected MissingTag, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_rotation_without_cd_matrix() {
        let mut tags = scale_rotation_tags();
        tags.remove(ROTATION);
        assert!(matches!(
            extract_wcs(&tags),
            Err(AvmError::MissingTag { ref tag }) if tag == ROTATION
        ));
    }

    #[test]
    fn test_zero_scale_is_invalid() {
        let mut tags = scale_rotation_tags();
        tags.set_numbers(SCALE, &[0.0, 0.000280556]);
        assert!(matches!(
            extract_wcs(&tags),
            Err(AvmError::InvalidCalibration { .. })
        ));
    }

    #[test]
    fn test_reference_dimension_fallback() {
        let mut tags = scale_rotation_tags();
        tags.remove(IMAGE_WIDTH);
        tags.remove(IMAGE_HEIGHT);
        tags.set_numbers(REFERENCE_DIMENSION, &[640.0, 480.0]);
        assert_eq!(extract_wcs(&tags).unwrap().size(), [640, 480]);
    }

    #[test]
    fn test_missing_size() {
        let mut tags = scale_rotation_tags();
        tags.remove(IMAGE_WIDTH);
        tags.remove(IMAGE_HEIGHT);
        assert!(matches!(
            extract_wcs(&tags),
            Err(AvmError::MissingTag { ref tag }) if tag == IMAGE_WIDTH
        ));
    }

    #[test]
    fn test_fractional_size_is_malformed() {
        let mut tags = scale_rotation_tags();
        tags.set_number(IMAGE_HEIGHT, 297.5);
        assert!(matches!(
            extract_wcs(&tags),
            Err(AvmError::MalformedValue { ref tag, .. }) if tag == IMAGE_HEIGHT
        ));
    }

    #[test]
    fn test_equatorial_frame_accepted() {
        let mut tags = scale_rotation_tags();
        tags.set_text(COORDINATE_FRAME, "icrs");
        assert!(extract_wcs(&tags).is_ok());
    }

    #[test]
    fn test_galactic_frame_rejected() {
        let mut tags = scale_rotation_tags();
        tags.set_text(COORDINATE_FRAME, "GAL");
        assert!(matches!(
            extract_wcs(&tags),
            Err(AvmError::UnsupportedFrame { ref frame }) if frame == "GAL"
        ));
    }

    #[test]
    fn test_new_rejects_empty_size() {
        let result = AvmWcs::new([10.0, 0.0], [3.0, 3.0], [0, 5], [-1.0, 1.0], 0.0);
        assert!(matches!(result, Err(AvmError::InvalidCalibration { .. })));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(AvmWcs::new([f64::NAN, 0.0], [3.0, 3.0], [5, 5], [-1.0, 1.0], 0.0).is_err());
        assert!(AvmWcs::new([10.0, 0.0], [3.0, f64::INFINITY], [5, 5], [-1.0, 1.0], 0.0).is_err());
        assert!(AvmWcs::new([10.0, 0.0], [3.0, 3.0], [5, 5], [-1.0, 1.0], f64::NAN).is_err());
    }

    #[test]
    fn test_contains_pixel() {
        let wcs = AvmWcs::new([10.0, 0.0], [3.0, 3.0], [5, 5], [-1.0, 1.0], 0.0).unwrap();
        assert!(wcs.contains_pixel(PixelCoord::new(1.0, 1.0)));
        assert!(wcs.contains_pixel(PixelCoord::new(5.5, 0.5)));
        assert!(!wcs.contains_pixel(PixelCoord::new(5.6, 3.0)));
        assert!(!wcs.contains_pixel(PixelCoord::new(3.0, 0.4)));
    }

    #[test]
    fn test_with_rotation() {
        let wcs = AvmWcs::new([10.0, 0.0], [3.0, 3.0], [5, 5], [-1.0, 1.0], 0.0).unwrap();
        let rotated = wcs.with_rotation(1.0).unwrap();
        assert_eq!(rotated.rotation(), 1.0);
        assert_eq!(rotated.reference_pixel(), wcs.reference_pixel());
    }
}
