use crate::composite::formulas as f;
use crate::composite::op::CompositeOp;
use crate::composite::params::CompositeParams;
use crate::foundation::colorspace::{
    Hcl, convert_rgb_to_cmyk, hcl_to_rgb, is_color_similar, magick_pixel_intensity, rgb_to_hcl,
};
use crate::foundation::core::MagickPixel;
use crate::foundation::error::PixelError;
use crate::foundation::math::{
    MAGICK_EPSILON, QUANTUM_RANGE, QUANTUM_SCALE, clamp_to_quantum, round_to_unity,
    safe_reciprocal,
};

/// Set of channels an unsynced operator may write.
///
/// Parses from channel letters (`r`, `g`, `b`, `a`/`o`, `k`/`i`, and `c`/`m`/`y` for the CMYK
/// reading of red/green/blue) or from `all`/`default`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelMask(u32);

impl ChannelMask {
    /// Red (or cyan).
    pub const RED: Self = Self(0x01);
    /// Green (or magenta).
    pub const GREEN: Self = Self(0x02);
    /// Blue (or yellow).
    pub const BLUE: Self = Self(0x04);
    /// Opacity.
    pub const OPACITY: Self = Self(0x08);
    /// Black or palette index.
    pub const INDEX: Self = Self(0x20);
    /// No channels.
    pub const NONE: Self = Self(0);
    /// Every channel.
    pub const ALL: Self = Self(0x01 | 0x02 | 0x04 | 0x08 | 0x20);
    /// Channels used when the caller names none.
    pub const DEFAULT: Self = Self::ALL;

    /// Raw bits.
    pub fn bits(self) -> u32 {
        self.0
    }

    /// `true` if every channel in `other` is set.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// `true` when no channel is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for ChannelMask {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::ops::BitOr for ChannelMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for ChannelMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::str::FromStr for ChannelMask {
    type Err = PixelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "all" => return Ok(Self::ALL),
            "default" => return Ok(Self::DEFAULT),
            "" => return Err(PixelError::validation("channel mask must not be empty")),
            _ => {}
        }
        let mut mask = Self::NONE;
        for c in lower.chars() {
            mask |= match c {
                'r' | 'c' => Self::RED,
                'g' | 'm' => Self::GREEN,
                'b' | 'y' => Self::BLUE,
                'a' | 'o' => Self::OPACITY,
                'k' | 'i' => Self::INDEX,
                ',' | ' ' => continue,
                other => {
                    return Err(PixelError::validation(format!(
                        "unknown channel '{other}' in '{s}'"
                    )));
                }
            };
        }
        Ok(mask)
    }
}

impl std::fmt::Display for ChannelMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::ALL {
            return f.write_str("all");
        }
        for (flag, c) in [
            (Self::RED, 'r'),
            (Self::GREEN, 'g'),
            (Self::BLUE, 'b'),
            (Self::OPACITY, 'a'),
            (Self::INDEX, 'k'),
        ] {
            if self.contains(flag) {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for ChannelMask {
    type Error = PixelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelMask> for String {
    fn from(mask: ChannelMask) -> Self {
        mask.to_string()
    }
}

/// Midpoint of the quantum scale used by Modulate.
const MIDPOINT: f64 = (QUANTUM_RANGE + 1.0) / 2.0;

/// Blend one source pixel onto one destination pixel.
///
/// Inputs are working pixels in additive form (CMYK callers invert first). The result starts as
/// `destination`; the operator overwrites what it computes. With `sync` every operator acts on
/// the whole pixel; without it the operators that honor the mask recompute each channel in
/// `channels` independently as if both coverages were one. The index channel is only written
/// when `destination` is CMYK.
pub fn blend(
    source: &MagickPixel,
    destination: &MagickPixel,
    op: CompositeOp,
    params: &CompositeParams,
    channels: ChannelMask,
    sync: bool,
) -> MagickPixel {
    let p = source;
    let q = destination;
    let mut out = *q;
    match op {
        CompositeOp::Clear => clear(q, &mut out),
        CompositeOp::Src | CompositeOp::Copy | CompositeOp::Replace => out = *p,
        // source already holds the resampled canvas
        CompositeOp::Blur | CompositeOp::Displace | CompositeOp::Distort => out = *p,
        CompositeOp::Undefined | CompositeOp::No | CompositeOp::Dst => {}
        CompositeOp::Over | CompositeOp::SrcOver => over(p, p.opacity, q, q.opacity, &mut out),
        CompositeOp::DstOver => over(q, q.opacity, p, p.opacity, &mut out),
        CompositeOp::In | CompositeOp::SrcIn => porter_in(p, q, &mut out),
        CompositeOp::DstIn => porter_in(q, p, &mut out),
        CompositeOp::Out | CompositeOp::SrcOut => porter_out(p, q, &mut out),
        CompositeOp::DstOut => porter_out(q, p, &mut out),
        CompositeOp::Atop | CompositeOp::SrcAtop => porter_atop(p, q, &mut out),
        CompositeOp::DstAtop => porter_atop(q, p, &mut out),
        CompositeOp::Xor => porter_xor(p, q, &mut out),

        CompositeOp::Plus => {
            if sync {
                plus(p, p.opacity, q, q.opacity, &mut out);
            } else {
                if channels.contains(ChannelMask::OPACITY) {
                    out.opacity = p.opacity + q.opacity - QUANTUM_RANGE;
                }
                each_selected(p, q, &mut out, channels, |s, d| s + d);
            }
        }
        CompositeOp::MinusDst => minus(p, q, channels, sync, &mut out),
        CompositeOp::MinusSrc => minus(q, p, channels, sync, &mut out),
        CompositeOp::ModulusAdd => modulus(p, q, channels, sync, f::modulus_add, &mut out),
        CompositeOp::ModulusSubtract => {
            modulus(p, q, channels, sync, f::modulus_subtract, &mut out)
        }
        CompositeOp::Difference => difference(p, q, channels, sync, &mut out),
        CompositeOp::Exclusion => normalized(p, q, channels, sync, f::exclusion, &mut out),
        CompositeOp::Multiply => normalized(p, q, channels, sync, f::multiply, &mut out),
        CompositeOp::Screen => {
            normalized(p, q, channels, sync, |s, _, d, _| f::screen(s, d), &mut out)
        }
        CompositeOp::DivideDst => normalized(p, q, channels, sync, f::divide, &mut out),
        CompositeOp::DivideSrc => normalized(q, p, channels, sync, f::divide, &mut out),
        CompositeOp::Mathematics => {
            let k = match *params {
                CompositeParams::Mathematics { a, b, c, d } => [a, b, c, d],
                _ => [0.0; 4],
            };
            normalized(
                p,
                q,
                channels,
                sync,
                |sca, sa, dca, da| f::mathematics(sca, sa, dca, da, k),
                &mut out,
            );
        }
        CompositeOp::Darken => select_channel(p, q, channels, sync, false, &mut out),
        CompositeOp::Lighten => select_channel(p, q, channels, sync, true, &mut out),
        CompositeOp::DarkenIntensity => select_intensity(p, q, channels, sync, false, &mut out),
        CompositeOp::LightenIntensity => select_intensity(p, q, channels, sync, true, &mut out),

        CompositeOp::ColorDodge => svg(p, q, f::color_dodge, &mut out),
        CompositeOp::ColorBurn => svg(p, q, f::color_burn, &mut out),
        CompositeOp::LinearDodge => linear_dodge(p, q, &mut out),
        CompositeOp::LinearBurn => svg(p, q, f::linear_burn, &mut out),
        CompositeOp::HardLight => svg(p, q, f::hard_light, &mut out),
        CompositeOp::Overlay => svg(q, p, f::hard_light, &mut out),
        CompositeOp::HardMix => hard_mix(p, q, &mut out),
        CompositeOp::SoftLight => svg(p, q, f::soft_light, &mut out),
        CompositeOp::LinearLight => svg(p, q, f::linear_light, &mut out),
        CompositeOp::PegtopLight => svg(p, q, f::pegtop_light, &mut out),
        CompositeOp::VividLight => svg(p, q, f::vivid_light, &mut out),
        CompositeOp::PinLight => svg(p, q, f::pin_light, &mut out),

        CompositeOp::ChangeMask => {
            let fuzz = match *params {
                CompositeParams::ChangeMask { fuzz } => fuzz,
                _ => 0.0,
            };
            out.opacity = if out.opacity > QUANTUM_RANGE / 2.0 || is_color_similar(p, q, fuzz) {
                QUANTUM_RANGE
            } else {
                0.0
            };
        }
        CompositeOp::Bumpmap => {
            if !p.is_transparent() {
                bumpmap(p, q, &mut out);
            }
        }
        CompositeOp::Dissolve => {
            let sd = params.source_dissolve();
            let cd = params.canvas_dissolve();
            over(
                p,
                QUANTUM_RANGE - sd * (QUANTUM_RANGE - p.opacity),
                q,
                QUANTUM_RANGE - cd * (QUANTUM_RANGE - q.opacity),
                &mut out,
            );
        }
        CompositeOp::Blend => {
            let sd = params.source_dissolve();
            let cd = params.canvas_dissolve();
            plus(
                p,
                QUANTUM_RANGE - sd * (QUANTUM_RANGE - p.opacity),
                q,
                QUANTUM_RANGE - cd * (QUANTUM_RANGE - q.opacity),
                &mut out,
            );
        }
        CompositeOp::Stereo => {
            out.red = p.red;
            out.opacity = (p.opacity + q.opacity) / 2.0;
        }
        CompositeOp::Threshold => {
            let (amount, limit) = match *params {
                CompositeParams::Threshold { amount, threshold } => (amount, threshold),
                _ => (0.5, 0.05 * QUANTUM_RANGE),
            };
            each_color(p, q, &mut out, |s, d| f::threshold(s, d, limit, amount));
            out.opacity = QUANTUM_RANGE - f::threshold(p.opacity, q.opacity, limit, amount);
        }
        CompositeOp::Modulate => {
            let (luma_percent, chroma_percent) = match *params {
                CompositeParams::Modulate {
                    luma_percent,
                    chroma_percent,
                } => (luma_percent, chroma_percent),
                _ => (100.0, 100.0),
            };
            modulate(p, q, luma_percent, chroma_percent, &mut out);
        }
        CompositeOp::Hue => hcl_mix(p, q, &mut out, |c, s| Hcl { hue: s.hue, ..c }),
        CompositeOp::Saturate => hcl_mix(p, q, &mut out, |c, s| Hcl {
            chroma: s.chroma,
            ..c
        }),
        CompositeOp::Luminize => hcl_mix(p, q, &mut out, |c, s| Hcl { luma: s.luma, ..c }),
        CompositeOp::Colorize => hcl_mix(p, q, &mut out, |c, s| Hcl { luma: c.luma, ..s }),

        CompositeOp::CopyRed | CompositeOp::CopyCyan => out.red = p.red,
        CompositeOp::CopyGreen | CompositeOp::CopyMagenta => out.green = p.green,
        CompositeOp::CopyBlue | CompositeOp::CopyYellow => out.blue = p.blue,
        CompositeOp::CopyOpacity => {
            out.opacity = if p.matte {
                p.opacity
            } else {
                QUANTUM_RANGE - f64::from(clamp_to_quantum(magick_pixel_intensity(p)))
            };
        }
        CompositeOp::CopyBlack => {
            let mut black = *p;
            if !black.colorspace.is_cmyk() {
                convert_rgb_to_cmyk(&mut black);
            }
            out.index = black.index;
        }
    }
    out
}

fn each_color(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel, op: impl Fn(f64, f64) -> f64) {
    out.red = op(p.red, q.red);
    out.green = op(p.green, q.green);
    out.blue = op(p.blue, q.blue);
    if q.colorspace.is_cmyk() {
        out.index = op(p.index, q.index);
    }
}

fn each_selected(
    p: &MagickPixel,
    q: &MagickPixel,
    out: &mut MagickPixel,
    channels: ChannelMask,
    op: impl Fn(f64, f64) -> f64,
) {
    if channels.contains(ChannelMask::RED) {
        out.red = op(p.red, q.red);
    }
    if channels.contains(ChannelMask::GREEN) {
        out.green = op(p.green, q.green);
    }
    if channels.contains(ChannelMask::BLUE) {
        out.blue = op(p.blue, q.blue);
    }
    if channels.contains(ChannelMask::INDEX) && q.colorspace.is_cmyk() {
        out.index = op(p.index, q.index);
    }
}

fn clear(q: &MagickPixel, out: &mut MagickPixel) {
    out.opacity = QUANTUM_RANGE;
    out.red = 0.0;
    out.green = 0.0;
    out.blue = 0.0;
    if q.colorspace.is_cmyk() {
        out.index = 0.0;
    }
}

/// Over with explicit opacities.
fn over(p: &MagickPixel, alpha: f64, q: &MagickPixel, beta: f64, out: &mut MagickPixel) {
    let sa = 1.0 - QUANTUM_SCALE * alpha;
    let da = 1.0 - QUANTUM_SCALE * beta;
    let gamma = sa + da - sa * da;
    out.opacity = QUANTUM_RANGE * (1.0 - round_to_unity(gamma));
    let g = safe_reciprocal(gamma);
    each_color(p, q, out, |s, d| g * f::over(s, alpha, d, beta));
}

/// Plus with explicit opacities: coverage is the clamped sum, not the over union.
fn plus(p: &MagickPixel, alpha: f64, q: &MagickPixel, beta: f64, out: &mut MagickPixel) {
    let sa = 1.0 - QUANTUM_SCALE * alpha;
    let da = 1.0 - QUANTUM_SCALE * beta;
    let gamma = round_to_unity(sa + da);
    out.opacity = QUANTUM_RANGE * (1.0 - gamma);
    let g = safe_reciprocal(gamma);
    each_color(p, q, out, |s, d| g * (sa * s + da * d));
}

fn porter_in(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel) {
    let (sa, da) = (p.coverage(), q.coverage());
    let gamma = sa * da;
    out.opacity = QUANTUM_RANGE * (1.0 - gamma);
    let g = safe_reciprocal(gamma);
    each_color(p, q, out, |s, _| g * f::in_(s, sa, da));
}

fn porter_out(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel) {
    let (sa, da) = (p.coverage(), q.coverage());
    let gamma = sa * (1.0 - da);
    out.opacity = QUANTUM_RANGE * (1.0 - gamma);
    let g = safe_reciprocal(gamma);
    each_color(p, q, out, |s, _| g * f::out(s, sa, da));
}

fn porter_atop(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel) {
    let sa = p.coverage();
    out.opacity = q.opacity;
    each_color(p, q, out, |s, d| f::atop(s, sa, d));
}

fn porter_xor(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel) {
    let (sa, da) = (p.coverage(), q.coverage());
    let gamma = sa + da - 2.0 * sa * da;
    out.opacity = QUANTUM_RANGE * (1.0 - gamma);
    let g = safe_reciprocal(gamma);
    each_color(p, q, out, |s, d| g * f::xor(s * sa, sa, d * da, da));
}

/// Over-union coverage and its opacity; returns `(sa, da, gamma)`.
fn over_coverage(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel) -> (f64, f64, f64) {
    let (sa, da) = (p.coverage(), q.coverage());
    let gamma = round_to_unity(sa + da - sa * da);
    out.opacity = QUANTUM_RANGE * (1.0 - gamma);
    (sa, da, gamma)
}

/// Normalized SVG form: `f` sees premultiplied `[0, 1]` colors, the result is un-premultiplied
/// by the over-union coverage.
fn svg(
    p: &MagickPixel,
    q: &MagickPixel,
    blend: impl Fn(f64, f64, f64, f64) -> f64,
    out: &mut MagickPixel,
) {
    let (sa, da, gamma) = over_coverage(p, q, out);
    let g = QUANTUM_RANGE * safe_reciprocal(gamma);
    each_color(p, q, out, |s, d| {
        g * blend(QUANTUM_SCALE * s * sa, sa, QUANTUM_SCALE * d * da, da)
    });
}

/// [`svg`] when synced, otherwise the same `f` per channel with both coverages at one.
fn normalized(
    p: &MagickPixel,
    q: &MagickPixel,
    channels: ChannelMask,
    sync: bool,
    blend: impl Fn(f64, f64, f64, f64) -> f64,
    out: &mut MagickPixel,
) {
    if sync {
        svg(p, q, blend, out);
        return;
    }
    if channels.contains(ChannelMask::OPACITY) {
        out.opacity = QUANTUM_RANGE * (1.0 - blend(p.coverage(), 1.0, q.coverage(), 1.0));
    }
    each_selected(p, q, out, channels, |s, d| {
        QUANTUM_RANGE * blend(QUANTUM_SCALE * s, 1.0, QUANTUM_SCALE * d, 1.0)
    });
}

fn minus(p: &MagickPixel, q: &MagickPixel, channels: ChannelMask, sync: bool, out: &mut MagickPixel) {
    if sync {
        let (sa, da, gamma) = over_coverage(p, q, out);
        let g = safe_reciprocal(gamma);
        each_color(p, q, out, |s, d| g * f::minus(s * sa, sa, d * da));
        return;
    }
    if channels.contains(ChannelMask::OPACITY) {
        out.opacity = QUANTUM_RANGE * (1.0 - (p.coverage() - q.coverage()));
    }
    each_selected(p, q, out, channels, |s, d| s - d);
}

fn modulus(
    p: &MagickPixel,
    q: &MagickPixel,
    channels: ChannelMask,
    sync: bool,
    wrap: fn(f64, f64, f64, f64) -> f64,
    out: &mut MagickPixel,
) {
    if sync {
        let (sa, da, _) = over_coverage(p, q, out);
        each_color(p, q, out, |s, d| wrap(s, sa, d, da));
        return;
    }
    if channels.contains(ChannelMask::OPACITY) {
        out.opacity = QUANTUM_RANGE
            - wrap(
                QUANTUM_RANGE - p.opacity,
                1.0,
                QUANTUM_RANGE - q.opacity,
                1.0,
            );
    }
    each_selected(p, q, out, channels, |s, d| wrap(s, 1.0, d, 1.0));
}

fn difference(
    p: &MagickPixel,
    q: &MagickPixel,
    channels: ChannelMask,
    sync: bool,
    out: &mut MagickPixel,
) {
    if sync {
        let (sa, da, gamma) = over_coverage(p, q, out);
        let g = safe_reciprocal(gamma);
        each_color(p, q, out, |s, d| g * f::difference(s, sa, d, da));
        return;
    }
    if channels.contains(ChannelMask::OPACITY) {
        out.opacity = QUANTUM_RANGE - (p.opacity - q.opacity).abs();
    }
    each_selected(p, q, out, channels, |s, d| (s - d).abs());
}

/// Darken (`lighter == false`) or Lighten.
fn select_channel(
    p: &MagickPixel,
    q: &MagickPixel,
    channels: ChannelMask,
    sync: bool,
    lighter: bool,
    out: &mut MagickPixel,
) {
    if sync {
        out.opacity = QUANTUM_SCALE * p.opacity * q.opacity;
        let g = safe_reciprocal(1.0 - QUANTUM_SCALE * out.opacity);
        let (alpha, beta) = (p.opacity, q.opacity);
        each_color(p, q, out, |s, d| {
            let source_wins = if lighter { s > d } else { s < d };
            if source_wins {
                g * f::over(s, alpha, d, beta)
            } else {
                g * f::over(d, beta, s, alpha)
            }
        });
        return;
    }
    if channels.contains(ChannelMask::OPACITY) {
        out.opacity = if lighter {
            p.opacity.min(q.opacity)
        } else {
            p.opacity.max(q.opacity)
        };
    }
    each_selected(p, q, out, channels, |s, d| {
        if lighter { s.max(d) } else { s.min(d) }
    });
}

/// DarkenIntensity (`lighter == false`) or LightenIntensity.
fn select_intensity(
    p: &MagickPixel,
    q: &MagickPixel,
    channels: ChannelMask,
    sync: bool,
    lighter: bool,
    out: &mut MagickPixel,
) {
    let (ip, iq) = (magick_pixel_intensity(p), magick_pixel_intensity(q));
    if sync {
        let (wp, wq) = (p.coverage() * ip, q.coverage() * iq);
        let from_p = if lighter { wp > wq } else { wp < wq };
        *out = if from_p { *p } else { *q };
        return;
    }
    let from_p = if lighter { ip > iq } else { ip < iq };
    if channels.contains(ChannelMask::OPACITY) {
        out.opacity = if from_p { p.opacity } else { q.opacity };
    }
    each_selected(p, q, out, channels, |s, d| if from_p { s } else { d });
}

fn linear_dodge(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel) {
    let (sa, da, gamma) = over_coverage(p, q, out);
    let g = safe_reciprocal(gamma);
    each_color(p, q, out, |s, d| g * (s * sa + d * da));
}

fn hard_mix(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel) {
    let (sa, da, gamma) = over_coverage(p, q, out);
    let g = QUANTUM_RANGE * safe_reciprocal(gamma);
    each_color(p, q, out, |s, d| g * f::hard_mix(s * sa, d * da));
}

fn bumpmap(p: &MagickPixel, q: &MagickPixel, out: &mut MagickPixel) {
    let shade = QUANTUM_SCALE * magick_pixel_intensity(p);
    out.red = shade * q.red;
    out.green = shade * q.green;
    out.blue = shade * q.blue;
    out.opacity = shade * p.opacity;
    if q.colorspace.is_cmyk() {
        out.index = shade * q.index;
    }
}

fn modulate(
    p: &MagickPixel,
    q: &MagickPixel,
    luma_percent: f64,
    chroma_percent: f64,
    out: &mut MagickPixel,
) {
    if p.is_transparent() {
        return;
    }
    let offset = (f64::from(clamp_to_quantum(magick_pixel_intensity(p))) - MIDPOINT).trunc();
    if offset.abs() < MAGICK_EPSILON {
        return;
    }
    let mut hcl = rgb_to_hcl(q.red, q.green, q.blue);
    hcl.luma += 0.01 * luma_percent * offset / MIDPOINT;
    hcl.chroma *= 0.01 * chroma_percent;
    (out.red, out.green, out.blue) = hcl_to_rgb(hcl);
}

/// Hue/Saturate/Luminize/Colorize: `mix(canvas, source)` picks the HCL components.
fn hcl_mix(
    p: &MagickPixel,
    q: &MagickPixel,
    out: &mut MagickPixel,
    mix: impl Fn(Hcl, Hcl) -> Hcl,
) {
    if p.is_transparent() {
        return;
    }
    if q.is_transparent() {
        *out = *p;
        return;
    }
    let canvas = rgb_to_hcl(q.red, q.green, q.blue);
    let source = rgb_to_hcl(p.red, p.green, p.blue);
    (out.red, out.green, out.blue) = hcl_to_rgb(mix(canvas, source));
    if p.opacity < q.opacity {
        out.opacity = p.opacity;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/pixel.rs"]
mod tests;
