//! Raw sample transcoding: byte buffers of any supported depth and layout into pixel records.

/// Cross-call bit state for packed samples.
pub mod accumulator;
/// Row and image decode entry points.
pub mod decode;
/// Channel layouts and their sample tables.
pub mod layout;
/// Transcoding profile (depth, byte order, format, padding).
pub mod profile;
pub(crate) mod reader;
