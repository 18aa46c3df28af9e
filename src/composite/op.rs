use crate::foundation::error::PixelError;

/// Compositing operator.
///
/// Names display in kebab-case (`src-over`, `modulus-add`) and parse from kebab-case, snake_case
/// or CamelCase. `minus`, `divide`, `add` and `subtract` are accepted as the historical aliases of
/// [`CompositeOp::MinusDst`], [`CompositeOp::DivideDst`], [`CompositeOp::ModulusAdd`] and
/// [`CompositeOp::ModulusSubtract`].
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum CompositeOp {
    /// No operator selected; leaves the canvas untouched.
    Undefined,
    /// Leaves the canvas untouched.
    No,
    /// Source over canvas.
    #[default]
    Over,
    /// Source where the canvas is.
    In,
    /// Source where the canvas is not.
    Out,
    /// Source over canvas, only where the canvas is.
    Atop,
    /// Source and canvas where the other is not.
    Xor,
    /// Sum of both, with additive coverage.
    Plus,
    /// Source minus canvas.
    #[serde(alias = "minus")]
    MinusDst,
    /// Canvas minus source.
    MinusSrc,
    /// Sum of both, wrapped into range.
    #[serde(alias = "add")]
    ModulusAdd,
    /// Difference of both, wrapped into range.
    #[serde(alias = "subtract")]
    ModulusSubtract,
    /// Absolute difference.
    Difference,
    /// Product.
    Multiply,
    /// Canvas shaded by source intensity.
    Bumpmap,
    /// Source replaces canvas.
    Copy,
    /// Source red replaces canvas red.
    CopyRed,
    /// Source green replaces canvas green.
    CopyGreen,
    /// Source blue replaces canvas blue.
    CopyBlue,
    /// Source opacity (or inverse intensity) replaces canvas opacity.
    CopyOpacity,
    /// Fully transparent black.
    Clear,
    /// Over with scaled coverages.
    Dissolve,
    /// Source replaces canvas.
    Replace,
    /// Canvas only.
    Dst,
    /// Canvas where the source is.
    DstIn,
    /// Canvas where the source is not.
    DstOut,
    /// Canvas over source, only where the source is.
    DstAtop,
    /// Canvas over source.
    DstOver,
    /// Source only.
    Src,
    /// Alias of [`CompositeOp::In`].
    SrcIn,
    /// Alias of [`CompositeOp::Out`].
    SrcOut,
    /// Alias of [`CompositeOp::Atop`].
    SrcAtop,
    /// Alias of [`CompositeOp::Over`].
    SrcOver,
    /// Canvas moved toward source where they differ past a threshold.
    Threshold,
    /// Per-channel minimum.
    Darken,
    /// Per-channel maximum.
    Lighten,
    /// Source hue, canvas chroma and luma.
    Hue,
    /// Source chroma, canvas hue and luma.
    Saturate,
    /// Source hue and chroma, canvas luma.
    Colorize,
    /// Source luma, canvas hue and chroma.
    Luminize,
    /// Inverse product of inverses.
    Screen,
    /// Hard light with source and canvas swapped.
    Overlay,
    /// Alias of [`CompositeOp::CopyRed`] for CMYK canvases.
    CopyCyan,
    /// Alias of [`CompositeOp::CopyGreen`] for CMYK canvases.
    CopyMagenta,
    /// Alias of [`CompositeOp::CopyBlue`] for CMYK canvases.
    CopyYellow,
    /// Source black replaces canvas black.
    CopyBlack,
    /// Canvas made transparent where it matches the source.
    ChangeMask,
    /// Source divided by canvas.
    #[serde(alias = "divide")]
    DivideDst,
    /// Canvas divided by source.
    DivideSrc,
    /// Sum minus twice the product.
    Exclusion,
    /// Multiply or screen, keyed on the source.
    HardLight,
    /// Posterized sum.
    HardMix,
    /// Darken or lighten, keyed on the source.
    SoftLight,
    /// Darken the canvas by increasing contrast.
    ColorBurn,
    /// Brighten the canvas by decreasing contrast.
    ColorDodge,
    /// Sum minus one.
    LinearBurn,
    /// Sum.
    LinearDodge,
    /// Linear burn or dodge, keyed on the source.
    LinearLight,
    /// Color burn or dodge, keyed on the source.
    VividLight,
    /// Replace colors depending on the source.
    PinLight,
    /// Continuous soft-light variant.
    PegtopLight,
    /// Free-form `A*Sc*Dc + B*Sc + C*Dc + D`.
    Mathematics,
    /// Plus with scaled coverages.
    Blend,
    /// Canvas luma and chroma shifted by source intensity.
    Modulate,
    /// Whole-pixel minimum by intensity.
    DarkenIntensity,
    /// Whole-pixel maximum by intensity.
    LightenIntensity,
    /// Source red with canvas green and blue.
    Stereo,
    /// Canvas blurred by a map: red and green scale the blur ellipse.
    Blur,
    /// Canvas resampled at positions shifted by a map's red and green.
    Displace,
    /// Like Displace, with shifts measured from a fixed center.
    Distort,
}

impl CompositeOp {
    /// Every operator, in declaration order.
    pub const ALL: [CompositeOp; 70] = [
        Self::Undefined,
        Self::No,
        Self::Over,
        Self::In,
        Self::Out,
        Self::Atop,
        Self::Xor,
        Self::Plus,
        Self::MinusDst,
        Self::MinusSrc,
        Self::ModulusAdd,
        Self::ModulusSubtract,
        Self::Difference,
        Self::Multiply,
        Self::Bumpmap,
        Self::Copy,
        Self::CopyRed,
        Self::CopyGreen,
        Self::CopyBlue,
        Self::CopyOpacity,
        Self::Clear,
        Self::Dissolve,
        Self::Replace,
        Self::Dst,
        Self::DstIn,
        Self::DstOut,
        Self::DstAtop,
        Self::DstOver,
        Self::Src,
        Self::SrcIn,
        Self::SrcOut,
        Self::SrcAtop,
        Self::SrcOver,
        Self::Threshold,
        Self::Darken,
        Self::Lighten,
        Self::Hue,
        Self::Saturate,
        Self::Colorize,
        Self::Luminize,
        Self::Screen,
        Self::Overlay,
        Self::CopyCyan,
        Self::CopyMagenta,
        Self::CopyYellow,
        Self::CopyBlack,
        Self::ChangeMask,
        Self::DivideDst,
        Self::DivideSrc,
        Self::Exclusion,
        Self::HardLight,
        Self::HardMix,
        Self::SoftLight,
        Self::ColorBurn,
        Self::ColorDodge,
        Self::LinearBurn,
        Self::LinearDodge,
        Self::LinearLight,
        Self::VividLight,
        Self::PinLight,
        Self::PegtopLight,
        Self::Mathematics,
        Self::Blend,
        Self::Modulate,
        Self::DarkenIntensity,
        Self::LightenIntensity,
        Self::Stereo,
        Self::Blur,
        Self::Displace,
        Self::Distort,
    ];

    /// Canonical kebab-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::No => "no",
            Self::Over => "over",
            Self::In => "in",
            Self::Out => "out",
            Self::Atop => "atop",
            Self::Xor => "xor",
            Self::Plus => "plus",
            Self::MinusDst => "minus-dst",
            Self::MinusSrc => "minus-src",
            Self::ModulusAdd => "modulus-add",
            Self::ModulusSubtract => "modulus-subtract",
            Self::Difference => "difference",
            Self::Multiply => "multiply",
            Self::Bumpmap => "bumpmap",
            Self::Copy => "copy",
            Self::CopyRed => "copy-red",
            Self::CopyGreen => "copy-green",
            Self::CopyBlue => "copy-blue",
            Self::CopyOpacity => "copy-opacity",
            Self::Clear => "clear",
            Self::Dissolve => "dissolve",
            Self::Replace => "replace",
            Self::Dst => "dst",
            Self::DstIn => "dst-in",
            Self::DstOut => "dst-out",
            Self::DstAtop => "dst-atop",
            Self::DstOver => "dst-over",
            Self::Src => "src",
            Self::SrcIn => "src-in",
            Self::SrcOut => "src-out",
            Self::SrcAtop => "src-atop",
            Self::SrcOver => "src-over",
            Self::Threshold => "threshold",
            Self::Darken => "darken",
            Self::Lighten => "lighten",
            Self::Hue => "hue",
            Self::Saturate => "saturate",
            Self::Colorize => "colorize",
            Self::Luminize => "luminize",
            Self::Screen => "screen",
            Self::Overlay => "overlay",
            Self::CopyCyan => "copy-cyan",
            Self::CopyMagenta => "copy-magenta",
            Self::CopyYellow => "copy-yellow",
            Self::CopyBlack => "copy-black",
            Self::ChangeMask => "change-mask",
            Self::DivideDst => "divide-dst",
            Self::DivideSrc => "divide-src",
            Self::Exclusion => "exclusion",
            Self::HardLight => "hard-light",
            Self::HardMix => "hard-mix",
            Self::SoftLight => "soft-light",
            Self::ColorBurn => "color-burn",
            Self::ColorDodge => "color-dodge",
            Self::LinearBurn => "linear-burn",
            Self::LinearDodge => "linear-dodge",
            Self::LinearLight => "linear-light",
            Self::VividLight => "vivid-light",
            Self::PinLight => "pin-light",
            Self::PegtopLight => "pegtop-light",
            Self::Mathematics => "mathematics",
            Self::Blend => "blend",
            Self::Modulate => "modulate",
            Self::DarkenIntensity => "darken-intensity",
            Self::LightenIntensity => "lighten-intensity",
            Self::Stereo => "stereo",
            Self::Blur => "blur",
            Self::Displace => "displace",
            Self::Distort => "distort",
        }
    }

    /// Whether only the canvas area under the source is touched when no override is given.
    ///
    /// The Porter-Duff operators whose result is transparent where the source is absent return
    /// `false`, as do [`CompositeOp::CopyOpacity`] and [`CompositeOp::ChangeMask`].
    pub fn default_clip_to_self(self) -> bool {
        !matches!(
            self,
            Self::Clear
                | Self::Src
                | Self::In
                | Self::SrcIn
                | Self::Out
                | Self::SrcOut
                | Self::DstIn
                | Self::DstAtop
                | Self::CopyOpacity
                | Self::ChangeMask
        )
    }

    /// Operators that treat the source as a map and resample the canvas before blending.
    pub fn resamples_canvas(self) -> bool {
        matches!(self, Self::Blur | Self::Displace | Self::Distort)
    }

    /// Operators that never change the canvas.
    pub fn is_noop(self) -> bool {
        matches!(self, Self::Undefined | Self::No | Self::Dst)
    }

    /// Operators whose result depends on the channel mask and sync flag.
    pub fn honors_channel_mask(self) -> bool {
        matches!(
            self,
            Self::Plus
                | Self::MinusDst
                | Self::MinusSrc
                | Self::ModulusAdd
                | Self::ModulusSubtract
                | Self::Difference
                | Self::Multiply
                | Self::Screen
                | Self::DivideDst
                | Self::DivideSrc
                | Self::Exclusion
                | Self::Darken
                | Self::Lighten
                | Self::DarkenIntensity
                | Self::LightenIntensity
                | Self::Mathematics
        )
    }
}

impl std::fmt::Display for CompositeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for CompositeOp {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize(s);
        let alias = match key.as_str() {
            "minus" => Some(Self::MinusDst),
            "divide" => Some(Self::DivideDst),
            "add" => Some(Self::ModulusAdd),
            "subtract" => Some(Self::ModulusSubtract),
            _ => None,
        };
        alias
            .or_else(|| {
                Self::ALL
                    .into_iter()
                    .find(|op| normalize(op.name()) == key)
            })
            .ok_or_else(|| PixelError::validation(format!("unknown composite operator '{s}'")))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/composite/op.rs"]
mod tests;
