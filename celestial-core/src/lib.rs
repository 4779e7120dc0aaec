//! Shared numeric building blocks for the celestial workspace.
//!
//! `celestial-core` holds the pieces every higher-level crate needs and nothing
//! else: unit-conversion constants, the spherical trigonometry kernels, and
//! angle normalization helpers.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | π multiples and degree/radian/arcsecond conversion factors |
//! | [`math`] | Vincenty separation and bearing kernels on pre-computed sines/cosines |
//! | [`utils`] | Angle normalization |
//!
//! # Design Notes
//!
//! - **Radians internally**: the kernels in [`math`] take radians (or their
//!   sines and cosines). Degree handling belongs to callers, which convert each
//!   argument once before calling in.
//!
//! - **No state**: everything here is a free function over `f64`.

pub mod constants;
pub mod math;
pub mod utils;
