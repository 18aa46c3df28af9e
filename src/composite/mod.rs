//! Compositing algebra: operators, their parameters, per-pixel blending and the row driver.

/// Image-level and row-level drivers.
pub mod driver;
/// Scalar blend functions on normalized channels.
pub mod formulas;
/// The operator set and its names.
pub mod op;
/// Operator arguments and their typed form.
pub mod params;
/// Channel masks and per-pixel blending.
pub mod pixel;
/// Canvas resampling through a map for Blur, Displace and Distort.
pub(crate) mod resample;
