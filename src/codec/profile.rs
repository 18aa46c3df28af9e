use crate::codec::layout::QuantumLayout;
use crate::foundation::error::{PixelError, PixelResult};
use crate::foundation::math::QUANTUM_RANGE;

/// Byte order of multi-byte samples.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    /// Least-significant byte first.
    #[value(alias = "little")]
    Lsb,
    /// Most-significant byte first.
    #[value(alias = "big")]
    Msb,
    /// Unspecified; read as [`Endian::Msb`].
    #[default]
    Undefined,
}

impl Endian {
    pub(crate) fn is_lsb(self) -> bool {
        matches!(self, Self::Lsb)
    }
}

/// Numeric interpretation of each sample.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum QuantumFormat {
    /// Unsigned integer.
    #[default]
    Unsigned,
    /// Two's-complement integer (16-bit samples are re-biased by 32768).
    Signed,
    /// IEEE float (16, 24, 32 or 64 bits).
    #[serde(alias = "float")]
    #[value(alias = "float")]
    FloatingPoint,
}

/// Whether color samples are premultiplied by alpha.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlphaAssociation {
    /// Color is independent of alpha.
    #[default]
    Straight,
    /// Color is premultiplied; decoding divides it back out.
    Associated,
}

/// Refill unit of the packed bit stream.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum PackWord {
    /// Bytes, most-significant bit first.
    #[default]
    Byte,
    /// 32-bit words in the profile's byte order, least-significant bit first (DPX style).
    Long,
}

/// Immutable description of how one raw buffer encodes samples.
///
/// Constructed once per image and shared read-only by every decode call.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QuantumProfile {
    /// Bits per sample, `1..=64`.
    pub depth: u32,
    /// Byte order.
    pub endian: Endian,
    /// Numeric interpretation.
    pub format: QuantumFormat,
    /// `true` when samples are bit-packed; `false` selects the word-aligned 10/12-bit paths.
    pub pack: bool,
    /// Refill unit for packed non-byte-aligned depths.
    pub word: PackWord,
    /// Unused bytes following each pixel.
    pub pad: usize,
    /// Offset subtracted from 32/64-bit float samples before scaling.
    pub minimum: f64,
    /// Multiplier applied to 32/64-bit float samples.
    pub scale: f64,
    /// Premultiplied or straight color.
    pub alpha: AlphaAssociation,
    /// Flip 0/max polarity for gray and bilevel index data.
    pub min_is_white: bool,
}

impl Default for QuantumProfile {
    fn default() -> Self {
        Self {
            depth: 8,
            endian: Endian::Undefined,
            format: QuantumFormat::Unsigned,
            pack: true,
            word: PackWord::Byte,
            pad: 0,
            minimum: 0.0,
            scale: QUANTUM_RANGE,
            alpha: AlphaAssociation::Straight,
            min_is_white: false,
        }
    }
}

impl QuantumProfile {
    /// Unsigned profile of the given depth with defaults elsewhere.
    pub fn with_depth(depth: u32) -> Self {
        Self {
            depth,
            ..Self::default()
        }
    }

    /// Builder-style byte-order setter.
    pub fn endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    /// Builder-style format setter.
    pub fn format(mut self, format: QuantumFormat) -> Self {
        self.format = format;
        self
    }

    /// Check depth, format and float normalization parameters.
    pub fn validate(&self) -> PixelResult<()> {
        if self.depth == 0 || self.depth > 64 {
            return Err(PixelError::validation(format!(
                "quantum depth must be in 1..=64, got {}",
                self.depth
            )));
        }
        if self.format == QuantumFormat::FloatingPoint
            && !matches!(self.depth, 16 | 24 | 32 | 64)
        {
            return Err(PixelError::validation(format!(
                "floating-point samples must be 16, 24, 32 or 64 bits, got {}",
                self.depth
            )));
        }
        if !self.scale.is_finite() || !self.minimum.is_finite() {
            return Err(PixelError::validation(
                "quantum minimum/scale must be finite",
            ));
        }
        Ok(())
    }

    /// Nominal byte extent of `count` pixels of `layout`, including pad bytes.
    ///
    /// Exact for byte-aligned and packed data; the word-aligned 10/12-bit paths and the
    /// sub-byte gray/index paths may consume slightly more, which [`decode_row`] reports.
    ///
    /// [`decode_row`]: crate::decode_row
    pub fn extent(&self, layout: QuantumLayout, count: usize) -> usize {
        let samples = layout.samples_per_pixel();
        let depth = self.depth as usize;
        let body = if self.pack {
            (samples * count * depth).div_ceil(8)
        } else {
            samples * count * depth.div_ceil(8)
        };
        if self.pads_pixels(layout) {
            body + self.pad * count
        } else {
            body
        }
    }

    /// Whether `pad` bytes follow each pixel of `layout`.
    ///
    /// 1- and 4-bit gray and palette samples are bit-packed across pixels and carry no padding.
    pub fn pads_pixels(&self, layout: QuantumLayout) -> bool {
        !(matches!(self.depth, 1 | 4)
            && matches!(
                layout,
                QuantumLayout::Gray
                    | QuantumLayout::GrayAlpha
                    | QuantumLayout::Index
                    | QuantumLayout::IndexAlpha
            ))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/profile.rs"]
mod tests;
