use std::fmt;
use std::str::FromStr;

use crate::foundation::error::PixelError;

/// Destination field a decoded sample is written to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Red (or cyan).
    Red,
    /// Green (or magenta).
    Green,
    /// Blue (or yellow).
    Blue,
    /// Broadcast into red, green and blue.
    Gray,
    /// Conventional alpha; stored as `range - v` opacity.
    Alpha,
    /// Legacy opacity, stored as-is.
    Opacity,
    /// CMYK black, stored in the index channel.
    Black,
    /// Palette index, resolved through the colormap.
    Index,
}

/// Channel ordering of an encoded pixel stream.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QuantumLayout {
    /// Alpha only.
    Alpha,
    /// Blue, green, red.
    Bgr,
    /// Blue, green, red, alpha.
    Bgra,
    /// Blue, green, red, opacity.
    Bgro,
    /// CMYK black only.
    Black,
    /// Blue only.
    Blue,
    /// Yellow only (same field as blue).
    Yellow,
    /// Chroma-ordered RGB; red and green are swapped after decode.
    CbYCr,
    /// [`QuantumLayout::CbYCr`] plus alpha.
    CbYCrA,
    /// 4:2:2 chroma pairs.
    CbYCrY,
    /// Cyan, magenta, yellow, black.
    Cmyk,
    /// CMYK plus alpha.
    Cmyka,
    /// CMYK plus opacity.
    Cmyko,
    /// Single gray sample.
    Gray,
    /// Gray plus alpha.
    GrayAlpha,
    /// Green only.
    Green,
    /// Magenta only (same field as green).
    Magenta,
    /// Palette index.
    Index,
    /// Palette index plus alpha.
    IndexAlpha,
    /// Red only.
    Red,
    /// Cyan only (same field as red).
    Cyan,
    /// Red, green, blue.
    Rgb,
    /// Red, green, blue, alpha.
    Rgba,
    /// Red, green, blue, opacity.
    Rgbo,
}

use Channel as C;

impl QuantumLayout {
    /// Every layout, in name order.
    pub const ALL: [QuantumLayout; 24] = [
        Self::Alpha,
        Self::Bgr,
        Self::Bgra,
        Self::Bgro,
        Self::Black,
        Self::Blue,
        Self::Yellow,
        Self::CbYCr,
        Self::CbYCrA,
        Self::CbYCrY,
        Self::Cmyk,
        Self::Cmyka,
        Self::Cmyko,
        Self::Gray,
        Self::GrayAlpha,
        Self::Green,
        Self::Magenta,
        Self::Index,
        Self::IndexAlpha,
        Self::Red,
        Self::Cyan,
        Self::Rgb,
        Self::Rgba,
        Self::Rgbo,
    ];

    /// Ordered destination channels, one entry per encoded sample.
    pub fn channels(self) -> &'static [Channel] {
        match self {
            Self::Alpha => &[C::Alpha],
            Self::Bgr => &[C::Blue, C::Green, C::Red],
            Self::Bgra => &[C::Blue, C::Green, C::Red, C::Alpha],
            Self::Bgro => &[C::Blue, C::Green, C::Red, C::Opacity],
            Self::Black => &[C::Black],
            Self::Blue | Self::Yellow => &[C::Blue],
            Self::CbYCr | Self::Rgb => &[C::Red, C::Green, C::Blue],
            Self::CbYCrA | Self::Rgba => &[C::Red, C::Green, C::Blue, C::Alpha],
            Self::CbYCrY => &[C::Red, C::Green],
            Self::Cmyk => &[C::Red, C::Green, C::Blue, C::Black],
            Self::Cmyka => &[C::Red, C::Green, C::Blue, C::Black, C::Alpha],
            Self::Cmyko => &[C::Red, C::Green, C::Blue, C::Black, C::Opacity],
            Self::Gray => &[C::Gray],
            Self::GrayAlpha => &[C::Gray, C::Alpha],
            Self::Green | Self::Magenta => &[C::Green],
            Self::Index => &[C::Index],
            Self::IndexAlpha => &[C::Index, C::Alpha],
            Self::Red | Self::Cyan => &[C::Red],
            Self::Rgbo => &[C::Red, C::Green, C::Blue, C::Opacity],
        }
    }

    /// Encoded samples per pixel.
    pub fn samples_per_pixel(self) -> usize {
        self.channels().len()
    }

    /// Layouts that carry black and so need a CMYK target.
    pub fn requires_cmyk(self) -> bool {
        self.channels().contains(&C::Black)
    }

    /// Layouts resolved through a colormap.
    pub fn is_indexed(self) -> bool {
        self.channels().contains(&C::Index)
    }

    /// Layouts carrying an alpha or opacity sample.
    pub fn has_alpha(self) -> bool {
        self.channels()
            .iter()
            .any(|c| matches!(c, C::Alpha | C::Opacity))
    }

    /// Full-color layouts without alpha; decoding marks their pixels opaque.
    pub(crate) fn fills_opaque(self) -> bool {
        matches!(
            self,
            Self::Gray | Self::Rgb | Self::Bgr | Self::CbYCr | Self::CbYCrY | Self::Cmyk
        )
    }

    /// Chroma-ordered layouts whose red and green are swapped after decode.
    pub(crate) fn swaps_chroma(self) -> bool {
        matches!(self, Self::CbYCr | Self::CbYCrA)
    }

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Alpha => "alpha",
            Self::Bgr => "bgr",
            Self::Bgra => "bgra",
            Self::Bgro => "bgro",
            Self::Black => "black",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::CbYCr => "cbycr",
            Self::CbYCrA => "cbycra",
            Self::CbYCrY => "cbycry",
            Self::Cmyk => "cmyk",
            Self::Cmyka => "cmyka",
            Self::Cmyko => "cmyko",
            Self::Gray => "gray",
            Self::GrayAlpha => "grayalpha",
            Self::Green => "green",
            Self::Magenta => "magenta",
            Self::Index => "index",
            Self::IndexAlpha => "indexalpha",
            Self::Red => "red",
            Self::Cyan => "cyan",
            Self::Rgb => "rgb",
            Self::Rgba => "rgba",
            Self::Rgbo => "rgbo",
        }
    }
}

impl fmt::Display for QuantumLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QuantumLayout {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self::ALL
            .into_iter()
            .find(|l| l.name() == key)
            .ok_or_else(|| PixelError::validation(format!("unknown quantum layout '{s}'")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/layout.rs"]
mod tests;
