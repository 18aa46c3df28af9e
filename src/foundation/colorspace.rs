//! Color-model primitives used by the compositing algebra: RGB/CMYK and RGB/HCL.

use crate::foundation::core::{Colorspace, Image, MagickPixel, PixelPacket};
use crate::foundation::math::{
    MAGICK_EPSILON, QUANTUM_RANGE, QUANTUM_SCALE, clamp_to_quantum, pixel_intensity,
    safe_reciprocal,
};

/// Convert an RGB working pixel to CMYK in place (black goes to `index`).
///
/// Pure black only sets `index` to full range; the color channels and tag are left as-is.
pub fn convert_rgb_to_cmyk(pixel: &mut MagickPixel) {
    let red = QUANTUM_SCALE * pixel.red;
    let green = QUANTUM_SCALE * pixel.green;
    let blue = QUANTUM_SCALE * pixel.blue;
    if red.abs() < MAGICK_EPSILON && green.abs() < MAGICK_EPSILON && blue.abs() < MAGICK_EPSILON
    {
        pixel.index = QUANTUM_RANGE;
        return;
    }
    let cyan = 1.0 - red;
    let magenta = 1.0 - green;
    let yellow = 1.0 - blue;
    let black = cyan.min(magenta).min(yellow);
    let k = safe_reciprocal(1.0 - black);
    pixel.colorspace = Colorspace::Cmyk;
    pixel.red = QUANTUM_RANGE * k * (cyan - black);
    pixel.green = QUANTUM_RANGE * k * (magenta - black);
    pixel.blue = QUANTUM_RANGE * k * (yellow - black);
    pixel.index = QUANTUM_RANGE * black;
}

/// Convert a CMYK working pixel back to RGB in place.
pub fn convert_cmyk_to_rgb(pixel: &mut MagickPixel) {
    let k = pixel.index;
    pixel.red = QUANTUM_RANGE - (QUANTUM_SCALE * pixel.red * (QUANTUM_RANGE - k) + k);
    pixel.green = QUANTUM_RANGE - (QUANTUM_SCALE * pixel.green * (QUANTUM_RANGE - k) + k);
    pixel.blue = QUANTUM_RANGE - (QUANTUM_SCALE * pixel.blue * (QUANTUM_RANGE - k) + k);
    pixel.colorspace = Colorspace::Rgb;
}

/// Move a working pixel read in `from` into the sample model of `to`.
///
/// Only the CMYK boundary changes samples; RGB, Gray and Other share one model.
pub fn convert_pixel_colorspace(pixel: &mut MagickPixel, from: Colorspace, to: Colorspace) {
    match (from.is_cmyk(), to.is_cmyk()) {
        (false, true) => convert_rgb_to_cmyk(pixel),
        (true, false) => convert_cmyk_to_rgb(pixel),
        _ => {}
    }
    pixel.colorspace = to;
}

/// Copy of `image` with its samples moved into `colorspace`.
///
/// Converting to CMYK allocates the black channel and drops the colormap; converting away from
/// CMYK drops the black channel. Opacity is carried unchanged.
pub fn transform_image_colorspace(image: &Image, colorspace: Colorspace) -> Image {
    let mut out = image.clone();
    out.colorspace = colorspace;
    if image.is_cmyk() == colorspace.is_cmyk() {
        return out;
    }
    let mut black = Vec::with_capacity(image.pixels.len());
    for (i, p) in out.pixels.iter_mut().enumerate() {
        let mut m = MagickPixel::from_packet(p, image.index_at(i), image.colorspace, image.matte);
        convert_pixel_colorspace(&mut m, image.colorspace, colorspace);
        *p = PixelPacket {
            opacity: p.opacity,
            ..m.to_packet()
        };
        black.push(clamp_to_quantum(m.index));
    }
    if colorspace.is_cmyk() {
        out.indexes = Some(black);
        out.colormap = None;
    } else {
        out.indexes = None;
    }
    out
}

/// Luma-weighted intensity of a working pixel, on the quantum scale.
#[inline]
pub fn magick_pixel_intensity(p: &MagickPixel) -> f64 {
    pixel_intensity(p.red, p.green, p.blue)
}

/// Hue/chroma/luma triple, each in `[0, 1]` for in-gamut input.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Hcl {
    /// Hue as a fraction of the full turn.
    pub hue: f64,
    /// Chroma (max - min), normalized.
    pub chroma: f64,
    /// Luma, normalized.
    pub luma: f64,
}

/// Quantum-scale RGB to HCL.
pub fn rgb_to_hcl(red: f64, green: f64, blue: f64) -> Hcl {
    let max = red.max(green).max(blue);
    let c = max - red.min(green).min(blue);
    let h = if c == 0.0 {
        0.0
    } else if red == max {
        ((green - blue) / c + 6.0) % 6.0
    } else if green == max {
        (blue - red) / c + 2.0
    } else {
        (red - green) / c + 4.0
    };
    Hcl {
        hue: h / 6.0,
        chroma: QUANTUM_SCALE * c,
        luma: QUANTUM_SCALE * pixel_intensity(red, green, blue),
    }
}

/// HCL back to quantum-scale RGB.
pub fn hcl_to_rgb(hcl: Hcl) -> (f64, f64, f64) {
    let h = 6.0 * hcl.hue;
    let c = hcl.chroma;
    let x = c * (1.0 - ((h % 2.0) - 1.0).abs());
    let (r, g, b) = match h {
        h if (0.0..1.0).contains(&h) => (c, x, 0.0),
        h if (1.0..2.0).contains(&h) => (x, c, 0.0),
        h if (2.0..3.0).contains(&h) => (0.0, c, x),
        h if (3.0..4.0).contains(&h) => (0.0, x, c),
        h if (4.0..5.0).contains(&h) => (x, 0.0, c),
        h if (5.0..6.0).contains(&h) => (c, 0.0, x),
        _ => (0.0, 0.0, 0.0),
    };
    let m = hcl.luma - pixel_intensity(r, g, b);
    (
        QUANTUM_RANGE * (r + m),
        QUANTUM_RANGE * (g + m),
        QUANTUM_RANGE * (b + m),
    )
}

/// Color similarity within `fuzz` (quantum scale, Euclidean over the participating channels).
///
/// Opacity participates when either pixel has `matte`; black participates for CMYK.
pub fn is_color_similar(p: &MagickPixel, q: &MagickPixel, fuzz: f64) -> bool {
    let mut distance = 0.0;
    let mut push = |a: f64, b: f64| {
        let d = a - b;
        distance += d * d;
    };
    push(p.red, q.red);
    push(p.green, q.green);
    push(p.blue, q.blue);
    if p.matte || q.matte {
        push(p.opacity, q.opacity);
    }
    if p.colorspace.is_cmyk() && q.colorspace.is_cmyk() {
        push(p.index, q.index);
    }
    distance <= fuzz.max(0.0) * fuzz.max(0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/colorspace.rs"]
mod tests;
