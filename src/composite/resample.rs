//! Map-driven resampling of the canvas for Blur, Displace and Distort.
//!
//! These operators read the canvas through a map: each map pixel picks where (Displace,
//! Distort) or how widely (Blur) the canvas is sampled. The resampled pixels form a new source
//! with the map's size, which the driver then copies over the canvas.

use crate::composite::driver::{RowJob, RowRunner, row_jobs};
use crate::composite::op::CompositeOp;
use crate::composite::params::CompositeParams;
use crate::foundation::core::{Colorspace, Image, MagickPixel, PixelPacket};
use crate::foundation::math::{QUANTUM_RANGE, QUANTUM_SCALE, clamp_to_quantum, safe_reciprocal};

/// Map value that leaves a displacement at the center.
const MIDPOINT: f64 = (QUANTUM_RANGE + 1.0) / 2.0;

/// Smallest Gaussian variance, in squared pixels, used by the blur.
const MIN_VARIANCE: f64 = 0.25;

/// Blur support radius in standard deviations.
const SUPPORT: f64 = 3.0;

/// Resample `canvas` through `map`, placed at `(x_offset, y_offset)`.
///
/// The result has the map's size and the canvas colorspace. Map pixels lying off the canvas
/// produce transparent pixels; the driver never reads them.
pub(crate) fn resample_canvas(
    canvas: &Image,
    map: &Image,
    op: CompositeOp,
    params: &CompositeParams,
    x_offset: isize,
    y_offset: isize,
    runner: &RowRunner,
) -> Image {
    let sampler = Sampler::resolve(canvas, map, op, params, (x_offset, y_offset));
    let matte = match sampler {
        Sampler::Blur(_) => canvas.matte,
        Sampler::Displace(_) => canvas.matte || map.matte,
    };
    let len = map.pixels.len();
    let mut out = Image {
        columns: map.columns,
        rows: map.rows,
        colorspace: canvas.colorspace,
        matte,
        depth: canvas.depth,
        fuzz: canvas.fuzz,
        pixels: vec![PixelPacket::transparent(); len],
        indexes: canvas.is_cmyk().then(|| vec![0; len]),
        colormap: None,
    };

    let rows = out.rows;
    runner.run(row_jobs(&mut out, 0..rows), |(y, (pixels, mut indexes)): RowJob<'_>| {
        let cy = y as isize + y_offset;
        if cy < 0 || cy >= canvas.rows as isize {
            return;
        }
        for (x, px) in pixels.iter_mut().enumerate() {
            let cx = x as isize + x_offset;
            if cx < 0 || cx >= canvas.columns as isize {
                continue;
            }
            let i = y * map.columns + x;
            let m = MagickPixel::from_packet(&map.pixels[i], 0, Colorspace::Rgb, map.matte);
            let mut value = match &sampler {
                Sampler::Displace(d) => d.sample(canvas, x, y, &m),
                Sampler::Blur(b) => b.sample(canvas, cx, cy, &m),
            };
            value.matte = matte;
            *px = value.to_packet();
            if let Some(slot) = indexes.as_deref_mut().and_then(|ix| ix.get_mut(x)) {
                *slot = clamp_to_quantum(value.index);
            }
        }
    });
    out
}

enum Sampler {
    Displace(Displacement),
    Blur(BlurEllipse),
}

impl Sampler {
    fn resolve(
        canvas: &Image,
        map: &Image,
        op: CompositeOp,
        params: &CompositeParams,
        offset: (isize, isize),
    ) -> Self {
        let params = match params {
            CompositeParams::None => CompositeParams::defaults_for(op),
            other => *other,
        };
        match params {
            CompositeParams::Blur {
                sigma_x,
                sigma_y,
                angle,
                angle_end,
            } => Self::Blur(BlurEllipse::new(sigma_x, sigma_y, angle, angle_end)),
            CompositeParams::Displacement {
                horizontal,
                vertical,
                percent,
                relative_to_canvas,
                center_x,
                center_y,
            } => {
                let reference = if relative_to_canvas { canvas } else { map };
                let span_x = reference.columns.saturating_sub(1) as f64;
                let span_y = reference.rows.saturating_sub(1) as f64;
                let (horizontal, vertical) = match horizontal {
                    None => (span_x / 2.0, span_y / 2.0),
                    Some(h) => {
                        let (mut h, mut v) = (h, vertical.unwrap_or(0.0));
                        if percent {
                            h *= span_x / 200.0;
                            v *= span_y / 200.0;
                        }
                        if vertical.is_none() {
                            v = h;
                        }
                        (h, v)
                    }
                };
                let (xo, yo) = (offset.0 as f64, offset.1 as f64);
                let absolute = op == CompositeOp::Distort;
                let center = |given: Option<f64>, origin: f64, canvas_len: usize, map_len: usize| {
                    if !absolute {
                        return origin;
                    }
                    match (given, relative_to_canvas) {
                        (None, true) => canvas_len.saturating_sub(1) as f64 / 2.0,
                        (None, false) => origin + map_len.saturating_sub(1) as f64 / 2.0,
                        (Some(c), true) => c,
                        (Some(c), false) => origin + c,
                    }
                };
                Self::Displace(Displacement {
                    horizontal,
                    vertical,
                    center_x: center(center_x, xo, canvas.columns, map.columns),
                    center_y: center(center_y, yo, canvas.rows, map.rows),
                    absolute,
                })
            }
            _ => Self::Blur(BlurEllipse::new(0.0, 0.0, None, None)),
        }
    }
}

/// Displace shifts relative to each pixel; Distort places pixels relative to a fixed center.
struct Displacement {
    horizontal: f64,
    vertical: f64,
    center_x: f64,
    center_y: f64,
    absolute: bool,
}

impl Displacement {
    fn position(&self, x: usize, y: usize, m: &MagickPixel) -> (f64, f64) {
        let shift = |v: f64, scale: f64| scale * (v - MIDPOINT) / MIDPOINT;
        let (dx, dy) = if self.absolute {
            (0.0, 0.0)
        } else {
            (x as f64, y as f64)
        };
        (
            shift(m.red, self.horizontal) + self.center_x + dx,
            shift(m.green, self.vertical) + self.center_y + dy,
        )
    }

    fn sample(&self, canvas: &Image, x: usize, y: usize, m: &MagickPixel) -> MagickPixel {
        let (sx, sy) = self.position(x, y, m);
        let mut pixel = bilinear(canvas, sx, sy);
        pixel.opacity = QUANTUM_RANGE
            * (1.0 - (1.0 - QUANTUM_SCALE * pixel.opacity) * (1.0 - QUANTUM_SCALE * m.opacity));
        pixel
    }
}

/// Elliptical Gaussian whose axes are scaled per pixel by map red and green.
struct BlurEllipse {
    width: f64,
    height: f64,
    angle: f64,
    sweep: Option<(f64, f64)>,
}

impl BlurEllipse {
    fn new(sigma_x: f64, sigma_y: f64, angle: Option<f64>, angle_end: Option<f64>) -> Self {
        let start = angle.unwrap_or(0.0).to_radians();
        Self {
            width: 2.0 * sigma_x,
            height: 2.0 * sigma_y,
            angle: start,
            sweep: angle_end.map(|end| (start, end.to_radians() - start)),
        }
    }

    fn sample(&self, canvas: &Image, cx: isize, cy: isize, m: &MagickPixel) -> MagickPixel {
        let angle = match self.sweep {
            Some((start, range)) => start + range * QUANTUM_SCALE * m.blue,
            None => self.angle,
        };
        let (sin, cos) = angle.sin_cos();
        let (r, g) = (QUANTUM_SCALE * m.red, QUANTUM_SCALE * m.green);
        let (dux, dvx) = (self.width * cos * r, self.width * sin * r);
        let (duy, dvy) = (-self.height * sin * g, self.height * cos * g);
        // Gaussian sigma is half the ellipse axis.
        let sxx = 0.25 * (dux * dux + duy * duy);
        let sxy = 0.25 * (dux * dvx + duy * dvy);
        let syy = 0.25 * (dvx * dvx + dvy * dvy);
        gaussian(canvas, cx, cy, sxx, sxy, syy)
    }
}

/// Alpha-weighted mean of canvas samples around `(cx, cy)` under the covariance
/// `[[sxx, sxy], [sxy, syy]]`, lifted so no axis has less than [`MIN_VARIANCE`].
fn gaussian(canvas: &Image, cx: isize, cy: isize, sxx: f64, sxy: f64, syy: f64) -> MagickPixel {
    let half_trace = 0.5 * (sxx + syy);
    let spread = (0.25 * (sxx - syy) * (sxx - syy) + sxy * sxy).sqrt();
    let lift = (MIN_VARIANCE - (half_trace - spread)).max(0.0);
    let (a, b, c) = (sxx + lift, sxy, syy + lift);
    let det = a * c - b * b;
    let (ia, ib, ic) = (c / det, -b / det, a / det);
    let rx = (SUPPORT * a.sqrt()).floor() as isize;
    let ry = (SUPPORT * c.sqrt()).floor() as isize;

    let mut acc = WeightedPixel::default();
    for dy in -ry..=ry {
        for dx in -rx..=rx {
            let (fx, fy) = (dx as f64, dy as f64);
            let q = ia * fx * fx + 2.0 * ib * fx * fy + ic * fy * fy;
            if q > SUPPORT * SUPPORT {
                continue;
            }
            let p = canvas_pixel(canvas, cx.saturating_add(dx), cy.saturating_add(dy));
            acc.add(&p, (-0.5 * q).exp());
        }
    }
    acc.finish(canvas.colorspace, canvas.matte)
}

/// Bilinear sample at a fractional canvas position, edges extended.
fn bilinear(canvas: &Image, x: f64, y: f64) -> MagickPixel {
    let (x0, y0) = (x.floor(), y.floor());
    let (fx, fy) = (x - x0, y - y0);
    let (ix, iy) = (x0 as isize, y0 as isize);
    let mut acc = WeightedPixel::default();
    for (ox, oy, w) in [
        (0, 0, (1.0 - fx) * (1.0 - fy)),
        (1, 0, fx * (1.0 - fy)),
        (0, 1, (1.0 - fx) * fy),
        (1, 1, fx * fy),
    ] {
        let p = canvas_pixel(canvas, ix.saturating_add(ox), iy.saturating_add(oy));
        acc.add(&p, w);
    }
    acc.finish(canvas.colorspace, canvas.matte)
}

/// Canvas pixel with coordinates clamped to the nearest edge.
fn canvas_pixel(canvas: &Image, x: isize, y: isize) -> MagickPixel {
    let x = x.clamp(0, canvas.columns as isize - 1) as usize;
    let y = y.clamp(0, canvas.rows as isize - 1) as usize;
    let i = y * canvas.columns + x;
    MagickPixel::from_packet(
        &canvas.pixels[i],
        canvas.index_at(i),
        canvas.colorspace,
        canvas.matte,
    )
}

/// Running sum for filters: colors weighted by coverage so transparent samples do not bleed.
#[derive(Default)]
struct WeightedPixel {
    weight: f64,
    alpha: f64,
    red: f64,
    green: f64,
    blue: f64,
    index: f64,
}

impl WeightedPixel {
    fn add(&mut self, p: &MagickPixel, w: f64) {
        let a = w * p.coverage();
        self.weight += w;
        self.alpha += a;
        self.red += a * p.red;
        self.green += a * p.green;
        self.blue += a * p.blue;
        self.index += a * p.index;
    }

    fn finish(&self, colorspace: Colorspace, matte: bool) -> MagickPixel {
        let g = safe_reciprocal(self.alpha);
        MagickPixel {
            colorspace,
            matte,
            red: g * self.red,
            green: g * self.green,
            blue: g * self.blue,
            opacity: QUANTUM_RANGE * (1.0 - self.alpha * safe_reciprocal(self.weight)),
            index: g * self.index,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composite/resample.rs"]
mod tests;
