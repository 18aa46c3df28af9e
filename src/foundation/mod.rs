//! Shared numeric primitives, pixel records and the error taxonomy.

/// RGB/CMYK and RGB/HCL conversions.
pub mod colorspace;
/// Pixel records and the caller-owned image buffer.
pub mod core;
/// Error and diagnostics types.
pub mod error;
/// Quantum constants, scaling and numeric guards.
pub mod math;
