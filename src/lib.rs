//! pixelcore is the pixel-level core of a raster image library.
//!
//! Two subsystems share one numeric model (16-bit quanta, `f64` working arithmetic):
//!
//! - the quantum codec turns raw sample buffers of any depth from 1 to 64 bits and any of the
//!   supported channel layouts into [`PixelPacket`] rows ([`decode_row`], [`decode_image`])
//! - the compositing algebra blends a source [`Image`] onto a canvas with one of the
//!   [`CompositeOp`] operators, row by row and optionally in parallel ([`composite_image`])
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Raw sample decoding.
pub mod codec;
/// Compositing operators and the row driver.
pub mod composite;
/// Numeric model, pixel records and errors.
pub mod foundation;

pub use crate::foundation::core::{Colorspace, Image, MagickPixel, PixelPacket};
pub use crate::foundation::error::{Diagnostic, FaultKind, PixelError, PixelResult, Severity};
pub use crate::foundation::math::{QUANTUM_MAX, QUANTUM_RANGE, Quantum};

pub use crate::codec::accumulator::BitAccumulator;
pub use crate::codec::decode::{
    DecodeOutcome, DecodeTarget, decode_image, decode_into, decode_pixels, decode_row,
};
pub use crate::codec::layout::{Channel, QuantumLayout};
pub use crate::codec::profile::{AlphaAssociation, Endian, PackWord, QuantumFormat, QuantumProfile};

pub use crate::composite::driver::{
    CanvasRow, CompositeOptions, CompositeReport, RowThreading, SourceRow, composite_image,
    composite_row, texture_image,
};
pub use crate::composite::op::CompositeOp;
pub use crate::composite::params::{CompositeArgs, CompositeParams};
pub use crate::composite::pixel::{ChannelMask, blend};
