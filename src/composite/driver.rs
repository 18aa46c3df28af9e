use std::borrow::Cow;
use std::ops::Range;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use rayon::prelude::*;

use crate::composite::op::CompositeOp;
use crate::composite::params::CompositeParams;
use crate::composite::pixel::{ChannelMask, blend};
use crate::composite::resample::resample_canvas;
use crate::foundation::colorspace::{convert_pixel_colorspace, transform_image_colorspace};
use crate::foundation::core::{Colorspace, Image, MagickPixel, PixelPacket};
use crate::foundation::error::{Diagnostic, PixelError, PixelResult};
use crate::foundation::math::{QUANTUM_RANGE, Quantum, clamp_pixel, clamp_to_quantum};

/// Row scheduling for [`composite_image`] and [`texture_image`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RowThreading {
    /// Run rows on a rayon pool.
    pub parallel: bool,
    /// Pool size; `None` lets rayon decide. `Some(0)` is rejected.
    pub threads: Option<usize>,
}

impl Default for RowThreading {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Caller options for the compositing driver.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompositeOptions {
    /// Channels written by unsynced operators.
    pub channels: ChannelMask,
    /// Apply operators to the whole pixel with alpha blending.
    pub sync: bool,
    /// Saturate results to the quantum range before CMYK re-inversion.
    pub clamp: bool,
    /// Override the operator's clip-to-self default.
    pub clip_to_self: Option<bool>,
    /// Row scheduling.
    pub threading: RowThreading,
}

impl Default for CompositeOptions {
    fn default() -> Self {
        Self {
            channels: ChannelMask::DEFAULT,
            sync: true,
            clamp: true,
            clip_to_self: None,
            threading: RowThreading::default(),
        }
    }
}

impl CompositeOptions {
    /// Reject settings the driver cannot honor.
    pub fn validate(&self) -> PixelResult<()> {
        if self.threading.threads == Some(0) {
            return Err(PixelError::validation(
                "composite threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }

    fn clip_to_self(&self, op: CompositeOp, params: &CompositeParams) -> bool {
        self.clip_to_self
            .or_else(|| params.implied_clip_to_self())
            .unwrap_or_else(|| op.default_clip_to_self())
    }
}

/// Outcome of a driver call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompositeReport {
    /// `false` when any row failed or the call was skipped.
    pub status: bool,
    /// Canvas rows considered.
    pub rows_total: u64,
    /// Rows written.
    pub rows_processed: u64,
    /// Rows left untouched (outside the window, or after a failure).
    pub rows_skipped: u64,
    /// Faults collected along the way.
    pub diagnostics: Vec<Diagnostic>,
}

impl CompositeReport {
    fn untouched(rows: usize) -> Self {
        Self {
            status: true,
            rows_total: rows as u64,
            rows_processed: 0,
            rows_skipped: rows as u64,
            diagnostics: Vec::new(),
        }
    }

    fn merge(&mut self, other: CompositeReport) {
        self.status &= other.status;
        self.rows_total += other.rows_total;
        self.rows_processed += other.rows_processed;
        self.rows_skipped += other.rows_skipped;
        self.diagnostics.extend(other.diagnostics);
    }
}

/// One canvas row, writable.
#[derive(Debug)]
pub struct CanvasRow<'a> {
    /// Full-width pixels.
    pub pixels: &'a mut [PixelPacket],
    /// Black channel for CMYK canvases.
    pub indexes: Option<&'a mut [Quantum]>,
    /// Canvas colorspace; CMYK rows are blended inverted.
    pub colorspace: Colorspace,
    /// Whether the canvas carries opacity.
    pub matte: bool,
}

/// The source row overlapping a canvas row.
#[derive(Clone, Copy, Debug)]
pub struct SourceRow<'a> {
    /// Source pixels.
    pub pixels: &'a [PixelPacket],
    /// Source black channel, read only for CMYK sources.
    pub indexes: Option<&'a [Quantum]>,
    /// Source colorspace; pixels are moved into the canvas colorspace before blending.
    pub colorspace: Colorspace,
    /// Whether the source carries opacity.
    pub matte: bool,
    /// Canvas column of source column 0; may be negative.
    pub x_offset: isize,
}

/// Blend one canvas row with the source row over it, or with nothing when `source` is `None`.
///
/// Canvas pixels outside the source follow the operator's outside rule unless clip-to-self is
/// in effect, in which case they are left alone.
pub fn composite_row(
    canvas: CanvasRow<'_>,
    source: Option<SourceRow<'_>>,
    op: CompositeOp,
    params: &CompositeParams,
    options: &CompositeOptions,
) -> PixelResult<()> {
    let clip = options.clip_to_self(op, params);
    let cmyk = canvas.colorspace.is_cmyk();
    let CanvasRow {
        pixels,
        mut indexes,
        colorspace,
        matte,
    } = canvas;
    if let Some(ix) = indexes.as_deref()
        && ix.len() < pixels.len()
    {
        return Err(PixelError::validation("canvas index row shorter than pixel row"));
    }
    let source_len = source.map_or(0, |s| s.pixels.len());
    let x_offset = source.map_or(0, |s| s.x_offset);

    for (x, px) in pixels.iter_mut().enumerate() {
        let sx = x as isize - x_offset;
        let under = source.is_some() && sx >= 0 && (sx as usize) < source_len;
        if clip && !under {
            if sx < 0 {
                continue;
            }
            break;
        }
        let index = indexes.as_deref().and_then(|ix| ix.get(x).copied()).unwrap_or(0);
        let mut dst = MagickPixel::from_packet(px, index, colorspace, matte);
        if cmyk {
            dst.invert_color();
        }

        let mut composite = match source {
            Some(src) if under => {
                let sx = sx as usize;
                let spx = src.pixels.get(sx).ok_or_else(|| {
                    PixelError::validation(format!("source column {sx} out of bounds"))
                })?;
                let six = src.indexes.and_then(|ix| ix.get(sx).copied()).unwrap_or(0);
                let mut s = MagickPixel::from_packet(spx, six, src.colorspace, src.matte);
                convert_pixel_colorspace(&mut s, src.colorspace, colorspace);
                if cmyk {
                    s.invert_color();
                }
                blend(&s, &dst, op, params, options.channels, options.sync)
            }
            _ => outside(op, params, &dst),
        };

        if options.clamp {
            composite.red = clamp_pixel(composite.red);
            composite.green = clamp_pixel(composite.green);
            composite.blue = clamp_pixel(composite.blue);
            composite.opacity = clamp_pixel(composite.opacity);
            composite.index = clamp_pixel(composite.index);
        }
        if cmyk {
            composite.invert_color();
        }
        px.red = clamp_to_quantum(composite.red);
        px.green = clamp_to_quantum(composite.green);
        px.blue = clamp_to_quantum(composite.blue);
        if under || matte {
            px.opacity = clamp_to_quantum(composite.opacity);
        }
        if cmyk && let Some(slot) = indexes.as_deref_mut().and_then(|ix| ix.get_mut(x)) {
            *slot = clamp_to_quantum(composite.index);
        }
    }
    Ok(())
}

/// Canvas pixel not covered by the source.
fn outside(op: CompositeOp, params: &CompositeParams, canvas: &MagickPixel) -> MagickPixel {
    let mut out = *canvas;
    match op {
        CompositeOp::Dissolve | CompositeOp::Blend => {
            out.opacity = QUANTUM_RANGE - params.canvas_dissolve() * (QUANTUM_RANGE - out.opacity);
        }
        CompositeOp::Clear | CompositeOp::Src => {
            out.opacity = QUANTUM_RANGE;
            out.red = 0.0;
            out.green = 0.0;
            out.blue = 0.0;
            if canvas.colorspace.is_cmyk() {
                out.index = 0.0;
            }
        }
        CompositeOp::In
        | CompositeOp::SrcIn
        | CompositeOp::Out
        | CompositeOp::SrcOut
        | CompositeOp::DstIn
        | CompositeOp::DstAtop
        | CompositeOp::CopyOpacity
        | CompositeOp::ChangeMask => out.opacity = QUANTUM_RANGE,
        _ => {}
    }
    out
}

/// Composite `source` onto `canvas` with its top-left corner at `(x_offset, y_offset)`.
///
/// A source in another colorspace is converted to the canvas colorspace first. Rows run on a
/// rayon pool unless `options.threading.parallel` is off. A failing row sets a shared flag;
/// rows not yet started are then skipped while rows in flight complete, so a failed report can
/// come with a partially written canvas.
#[tracing::instrument(
    skip(canvas, source, params, options),
    fields(op = %op, columns = canvas.columns, rows = canvas.rows)
)]
pub fn composite_image(
    canvas: &mut Image,
    source: &Image,
    op: CompositeOp,
    params: &CompositeParams,
    x_offset: isize,
    y_offset: isize,
    options: &CompositeOptions,
) -> PixelResult<CompositeReport> {
    options.validate()?;
    check_shape(canvas, "canvas")?;
    check_shape(source, "source")?;
    let runner = RowRunner::new(&options.threading)?;
    composite_with(canvas, source, op, params, (x_offset, y_offset), options, &runner)
}

fn composite_with(
    canvas: &mut Image,
    source: &Image,
    op: CompositeOp,
    params: &CompositeParams,
    (x_offset, y_offset): (isize, isize),
    options: &CompositeOptions,
    runner: &RowRunner,
) -> PixelResult<CompositeReport> {
    if op.is_noop() {
        tracing::debug!("operator leaves canvas unchanged");
        return Ok(CompositeReport::untouched(canvas.rows));
    }
    if op == CompositeOp::CopyBlack && !canvas.is_cmyk() {
        let d = PixelError::domain_mismatch(format!("operator '{op}' requires a CMYK canvas"))
            .to_diagnostic();
        tracing::warn!(message = %d.message, "composite skipped");
        let mut report = CompositeReport::untouched(canvas.rows);
        report.status = false;
        report.diagnostics.push(d);
        return Ok(report);
    }

    let source = if op.resamples_canvas() {
        tracing::debug!(%op, "resampling canvas through map");
        Cow::Owned(resample_canvas(canvas, source, op, params, x_offset, y_offset, runner))
    } else {
        in_colorspace(source, canvas.colorspace)
    };
    let source: &Image = &source;

    if let Some(report) = copy_fast_path(canvas, source, op, x_offset, y_offset, runner) {
        return Ok(report);
    }
    let turns_on_matte = matches!(op, CompositeOp::CopyOpacity | CompositeOp::ChangeMask)
        || (op.resamples_canvas() && source.matte);
    if turns_on_matte && !canvas.matte {
        canvas.set_opaque_alpha();
    }

    let params = match *params {
        CompositeParams::ChangeMask { fuzz } => CompositeParams::ChangeMask {
            fuzz: fuzz.max(canvas.fuzz).max(source.fuzz),
        },
        other => other,
    };
    let clip = options.clip_to_self(op, &params);
    let (rows, colorspace, matte) = (canvas.rows, canvas.colorspace, canvas.matte);
    let window = if clip {
        overlap(rows, y_offset, source.rows)
    } else {
        0..rows
    };

    let failed = AtomicBool::new(false);
    let processed = AtomicU64::new(0);
    let skipped = AtomicU64::new((rows - window.len()) as u64);
    let diagnostics = Mutex::new(Vec::<Diagnostic>::new());

    let run = |(y, (pixels, indexes)): RowJob<'_>| {
        if failed.load(Ordering::Relaxed) {
            skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let sy = y as isize - y_offset;
        let src = (sy >= 0 && (sy as usize) < source.rows).then(|| {
            let sy = sy as usize;
            let start = sy * source.columns;
            SourceRow {
                pixels: &source.pixels[start..start + source.columns],
                indexes: source.index_row(sy),
                colorspace: source.colorspace,
                matte: source.matte,
                x_offset,
            }
        });
        if clip && src.is_none() {
            skipped.fetch_add(1, Ordering::Relaxed);
            return;
        }
        let row = CanvasRow {
            pixels,
            indexes,
            colorspace,
            matte,
        };
        match composite_row(row, src, op, &params, options) {
            Ok(()) => {
                processed.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                failed.store(true, Ordering::Relaxed);
                skipped.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(row = y, error = %err, "composite row failed");
                if let Ok(mut sink) = diagnostics.lock() {
                    sink.push(err.to_diagnostic());
                }
            }
        }
    };
    runner.run(row_jobs(canvas, window), run);

    let diagnostics = diagnostics
        .into_inner()
        .map_err(|_| PixelError::Other(anyhow::anyhow!("diagnostics lock poisoned")))?;
    Ok(CompositeReport {
        status: !failed.load(Ordering::Relaxed),
        rows_total: rows as u64,
        rows_processed: processed.load(Ordering::Relaxed),
        rows_skipped: skipped.load(Ordering::Relaxed),
        diagnostics,
    })
}

/// Tile `texture` across `canvas`.
///
/// The texture is converted to the canvas colorspace first. Copy, and Over when neither image
/// has opacity, copy texture rows directly; every other operator composites the texture once per
/// tile on one shared pool, and the tile reports are summed.
#[tracing::instrument(
    skip(canvas, texture, options),
    fields(op = %op, columns = canvas.columns, rows = canvas.rows)
)]
pub fn texture_image(
    canvas: &mut Image,
    texture: &Image,
    op: CompositeOp,
    options: &CompositeOptions,
) -> PixelResult<CompositeReport> {
    options.validate()?;
    check_shape(canvas, "canvas")?;
    check_shape(texture, "texture")?;
    let runner = RowRunner::new(&options.threading)?;
    let texture = in_colorspace(texture, canvas.colorspace);
    let texture: &Image = &texture;

    let direct = op == CompositeOp::Copy
        || (op == CompositeOp::Over && !canvas.matte && !texture.matte);
    if !direct {
        let params = CompositeParams::defaults_for(op);
        let mut report = CompositeReport {
            status: true,
            ..CompositeReport::default()
        };
        for y in (0..canvas.rows).step_by(texture.rows) {
            for x in (0..canvas.columns).step_by(texture.columns) {
                let tile = composite_with(
                    canvas,
                    texture,
                    op,
                    &params,
                    (x as isize, y as isize),
                    options,
                    &runner,
                )?;
                let failed = !tile.status;
                report.merge(tile);
                if failed {
                    return Ok(report);
                }
            }
        }
        return Ok(report);
    }

    tracing::debug!("texture row copy");
    let rows = canvas.rows;
    let copy_indexes = canvas.is_cmyk() && texture.is_cmyk();
    runner.run(row_jobs(canvas, 0..rows), |(y, (pixels, indexes)): RowJob<'_>| {
        let ty = y % texture.rows;
        let start = ty * texture.columns;
        let tile = &texture.pixels[start..start + texture.columns];
        for chunk in pixels.chunks_mut(texture.columns) {
            chunk.copy_from_slice(&tile[..chunk.len()]);
        }
        if copy_indexes
            && let (Some(dst), Some(src)) = (indexes, texture.index_row(ty))
        {
            for chunk in dst.chunks_mut(texture.columns) {
                chunk.copy_from_slice(&src[..chunk.len()]);
            }
        }
    });
    Ok(CompositeReport {
        status: true,
        rows_total: rows as u64,
        rows_processed: rows as u64,
        rows_skipped: 0,
        diagnostics: Vec::new(),
    })
}

/// Sequential or pooled execution of row jobs. The pool is built once per driver call and
/// shared by every tile of a texture.
pub(crate) enum RowRunner {
    Sequential,
    Pool(rayon::ThreadPool),
}

impl RowRunner {
    pub(crate) fn new(threading: &RowThreading) -> PixelResult<Self> {
        if threading.parallel {
            Ok(Self::Pool(build_thread_pool(threading.threads)?))
        } else {
            Ok(Self::Sequential)
        }
    }

    pub(crate) fn run<T, F>(&self, jobs: Vec<T>, job: F)
    where
        T: Send,
        F: Fn(T) + Sync + Send,
    {
        match self {
            Self::Sequential => jobs.into_iter().for_each(job),
            Self::Pool(pool) => pool.install(|| jobs.into_par_iter().for_each(job)),
        }
    }
}

/// `image` as stored in `colorspace`, borrowed when no sample changes.
fn in_colorspace(image: &Image, colorspace: Colorspace) -> Cow<'_, Image> {
    if image.is_cmyk() == colorspace.is_cmyk() {
        Cow::Borrowed(image)
    } else {
        tracing::debug!(from = ?image.colorspace, to = ?colorspace, "converting source colorspace");
        Cow::Owned(transform_image_colorspace(image, colorspace))
    }
}

/// Canvas rows covered by a source of `source_rows` rows placed at `offset`.
fn overlap(canvas_rows: usize, offset: isize, source_rows: usize) -> Range<usize> {
    let clamp = |v: isize| v.clamp(0, canvas_rows as isize) as usize;
    let start = clamp(offset);
    let end = clamp(offset.saturating_add(source_rows as isize));
    start..end.max(start)
}

pub(crate) type RowJob<'a> = (usize, (&'a mut [PixelPacket], Option<&'a mut [Quantum]>));

/// Mutable pixel and index rows of `canvas` for the rows in `window`.
pub(crate) fn row_jobs(canvas: &mut Image, window: Range<usize>) -> Vec<RowJob<'_>> {
    let columns = canvas.columns;
    let Image {
        pixels, indexes, ..
    } = canvas;
    let mut index_rows = indexes
        .as_deref_mut()
        .map(|ix| ix.chunks_mut(columns).skip(window.start));
    pixels
        .chunks_mut(columns)
        .enumerate()
        .skip(window.start)
        .take(window.len())
        .map(|(y, row)| (y, (row, index_rows.as_mut().and_then(|it| it.next()))))
        .collect()
}

/// Direct row copy for Copy, and for Over when neither image has opacity, when the source
/// lies strictly inside the canvas.
fn copy_fast_path(
    canvas: &mut Image,
    source: &Image,
    op: CompositeOp,
    x_offset: isize,
    y_offset: isize,
    runner: &RowRunner,
) -> Option<CompositeReport> {
    let eligible = match op {
        CompositeOp::Copy => true,
        CompositeOp::Over => !canvas.matte && !source.matte,
        _ => false,
    };
    if !eligible || x_offset < 0 || y_offset < 0 {
        return None;
    }
    let (x, y) = (x_offset as usize, y_offset as usize);
    if x + source.columns >= canvas.columns || y + source.rows >= canvas.rows {
        return None;
    }
    tracing::debug!(%op, x, y, "row copy fast path");

    let rows = canvas.rows;
    let width = source.columns;
    runner.run(
        row_jobs(canvas, y..y + source.rows),
        |(cy, (pixels, indexes)): RowJob<'_>| {
            let sy = cy - y;
            let start = sy * source.columns;
            pixels[x..x + width].copy_from_slice(&source.pixels[start..start + width]);
            if let (Some(dst), Some(src)) = (indexes, source.index_row(sy)) {
                dst[x..x + width].copy_from_slice(src);
            }
        },
    );
    Some(CompositeReport {
        status: true,
        rows_total: rows as u64,
        rows_processed: source.rows as u64,
        rows_skipped: (rows - source.rows) as u64,
        diagnostics: Vec::new(),
    })
}

fn check_shape(image: &Image, what: &str) -> PixelResult<()> {
    let expected = image.columns.checked_mul(image.rows);
    if image.columns == 0 || image.rows == 0 || expected != Some(image.pixels.len()) {
        return Err(PixelError::validation(format!(
            "{what} pixel buffer does not match {}x{}",
            image.columns, image.rows
        )));
    }
    if let Some(ix) = &image.indexes
        && Some(ix.len()) != expected
    {
        return Err(PixelError::validation(format!(
            "{what} index buffer does not match {}x{}",
            image.columns, image.rows
        )));
    }
    Ok(())
}

fn build_thread_pool(threads: Option<usize>) -> PixelResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PixelError::validation(
            "composite threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PixelError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}

#[cfg(test)]
#[path = "../../tests/unit/composite/driver.rs"]
mod tests;
