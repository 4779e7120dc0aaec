//! Sky-to-pixel astrometry from the AVM calibration embedded in images.
//!
//! Survey cut-outs served as JPEG or PNG carry their sky calibration as
//! Astronomical Visualization Metadata (AVM) inside an XMP packet. This crate
//! decodes that calibration into an [`AvmWcs`] and projects equatorial
//! coordinates onto the image.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`tags`] | [`TagValue`], the [`TagProvider`] lookup trait, [`TagMap`], AVM tag names |
//! | [`wcs`] | [`AvmWcs`] record and its extraction from tags |
//! | [`linear`] | [`CdMatrix`] decomposition into plate scale and rotation |
//! | [`sphere`] | Angular separation and position angle |
//! | [`projection`] | [`world_to_pixel`] |
//! | [`xmp`] | XMP packet search and parsing into a [`TagMap`] |
//! | [`coordinate`] | [`SkyCoord`] and [`PixelCoord`] |
//!
//! # Quick Start
//!
//! ```
//! use celestial_avm::{extract_wcs, world_to_pixel, TagMap};
//! use celestial_avm::tags::{IMAGE_HEIGHT, IMAGE_WIDTH, REFERENCE_PIXEL, REFERENCE_VALUE, ROTATION, SCALE};
//!
//! let mut tags = TagMap::new();
//! tags.set_numbers(REFERENCE_VALUE, &[10.0, 0.0])
//!     .set_numbers(REFERENCE_PIXEL, &[3.0, 3.0])
//!     .set_numbers(SCALE, &[-1.0, 1.0])
//!     .set_number(ROTATION, 0.0)
//!     .set_number(IMAGE_WIDTH, 5.0)
//!     .set_number(IMAGE_HEIGHT, 5.0);
//!
//! let wcs = extract_wcs(&tags)?;
//! let pixel = world_to_pixel(&wcs, 10.0, 1.0);
//! assert!((pixel.x() - 3.0).abs() < 1e-9);
//! assert!((pixel.y() - 2.0).abs() < 1e-9);
//! # Ok::<(), celestial_avm::AvmError>(())
//! ```
//!
//! Reading from a file instead:
//!
//! ```ignore
//! let tags = celestial_avm::xmp::read_tags("cutout.jpeg")?;
//! let wcs = celestial_avm::extract_wcs(&tags)?;
//! ```
//!
//! # Features
//!
//! - **`serde`**: `Serialize`/`Deserialize` for [`AvmWcs`], [`CdMatrix`],
//!   [`SkyCoord`] and [`PixelCoord`].
//! - **`tracing`**: spans and events around extraction and XMP parsing.
//! - **`cli`**: the `avm-locate` binary.

pub mod coordinate;
pub mod error;
pub mod linear;
pub mod projection;
pub mod sphere;
pub mod tags;
mod trace;
pub mod wcs;
pub mod xmp;

pub use coordinate::{PixelCoord, SkyCoord};
pub use error::{AvmError, AvmResult};
pub use linear::{CdMatrix, PlateSolution};
pub use projection::world_to_pixel;
pub use sphere::{angular_separation, position_angle};
pub use tags::{
    TagMap, TagProvider, TagValue, CD_MATRIX, COORDINATE_FRAME, IMAGE_HEIGHT, IMAGE_WIDTH,
    REFERENCE_DIMENSION, REFERENCE_PIXEL, REFERENCE_VALUE, ROTATION, SCALE,
};
pub use wcs::{extract_wcs, AvmWcs};
