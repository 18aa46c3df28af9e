use crate::codec::accumulator::BitAccumulator;
use crate::codec::layout::{Channel, QuantumLayout};
use crate::codec::profile::{AlphaAssociation, QuantumProfile};
use crate::codec::reader::{Sample, SampleReader, SampleStream};
use crate::foundation::core::{Colorspace, Image, PixelPacket};
use crate::foundation::error::{Diagnostic, PixelError, PixelResult};
use crate::foundation::math::{
    OPAQUE_OPACITY, QUANTUM_MAX, QUANTUM_SCALE, Quantum, clamp_to_quantum, safe_reciprocal,
    scale_short_to_quantum,
};

/// Result of one successful decode call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Bytes consumed from the input buffer.
    pub consumed: usize,
    /// Recoverable faults (out-of-range palette indexes).
    pub diagnostics: Vec<Diagnostic>,
}

/// Image properties a decode depends on.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecodeTarget<'a> {
    /// Target colorspace; CMYK gates the black-carrying layouts.
    pub colorspace: Colorspace,
    /// Palette for the index layouts.
    pub colormap: Option<&'a [PixelPacket]>,
}

/// Decode `pixels.len()` pixels of `layout` from `buffer` into caller slices.
///
/// `indexes` receives black (CMYK) or palette indexes and must be present for layouts that
/// carry either. Nothing is written unless the whole run decodes; a short buffer is reported
/// as [`PixelError::TruncatedInput`]. `acc` carries sub-byte state to the next call; pass a
/// fresh or reset accumulator at the start of each buffer.
pub fn decode_pixels(
    buffer: &[u8],
    profile: &QuantumProfile,
    layout: QuantumLayout,
    target: DecodeTarget<'_>,
    pixels: &mut [PixelPacket],
    mut indexes: Option<&mut [Quantum]>,
    acc: &mut BitAccumulator,
) -> PixelResult<DecodeOutcome> {
    profile.validate()?;
    if layout.requires_cmyk() && !target.colorspace.is_cmyk() {
        return Err(PixelError::domain_mismatch(format!(
            "layout '{layout}' requires a CMYK image"
        )));
    }
    let colormap = match (layout.is_indexed(), target.colormap) {
        (true, None) => {
            return Err(PixelError::domain_mismatch(format!(
                "layout '{layout}' requires a colormapped image"
            )));
        }
        (_, map) => map.unwrap_or(&[]),
    };
    if (layout.requires_cmyk() || layout.is_indexed())
        && indexes.as_ref().is_none_or(|ix| ix.len() < pixels.len())
    {
        return Err(PixelError::domain_mismatch(format!(
            "layout '{layout}' requires an index channel covering every pixel"
        )));
    }

    let reader = SampleReader::select(profile, layout);
    tracing::debug!(%layout, depth = profile.depth, ?reader, count = pixels.len(), "decode");

    let index_backed = indexes
        .as_ref()
        .is_some_and(|ix| ix.len() >= pixels.len());
    let mut out = pixels.to_vec();
    let mut out_ix: Vec<Quantum> = match indexes.as_deref() {
        Some(ix) if index_backed => ix[..pixels.len()].to_vec(),
        _ => vec![0; pixels.len()],
    };
    let mut state = acc.clone();
    let mut stream = SampleStream::new(buffer, &mut state, reader, profile);
    let mut writer = ChannelWriter {
        profile,
        reader,
        colormap,
        bad_indexes: 0,
    };

    match (layout, reader) {
        (QuantumLayout::CbYCrY, SampleReader::Unpacked10 { offsets }) => {
            decode_chroma_pairs(&mut stream, offsets, &mut out)?;
        }
        _ => {
            let pads = profile.pads_pixels(layout);
            for (px, ix) in out.iter_mut().zip(out_ix.iter_mut()) {
                if layout.fills_opaque() {
                    px.opacity = OPAQUE_OPACITY;
                }
                for &channel in layout.channels() {
                    let sample = stream.next()?;
                    writer.write(channel, sample, px, ix);
                }
                if pads {
                    stream.skip_pad()?;
                }
            }
        }
    }
    let consumed = stream.position();

    if layout.swaps_chroma() {
        for px in &mut out {
            std::mem::swap(&mut px.red, &mut px.green);
        }
    }
    if profile.alpha == AlphaAssociation::Associated && layout.has_alpha() {
        disassociate_alpha(&mut out, &mut out_ix, target.colorspace.is_cmyk());
    }

    pixels.copy_from_slice(&out);
    if let Some(ix) = indexes.as_deref_mut().filter(|_| index_backed) {
        ix[..out_ix.len()].copy_from_slice(&out_ix);
    }
    *acc = state;

    let mut diagnostics = Vec::new();
    if writer.bad_indexes > 0 {
        let d = Diagnostic::range(format!(
            "invalid colormap index: {} of {} pixels exceed {} colors",
            writer.bad_indexes,
            out.len(),
            colormap.len()
        ));
        tracing::warn!(message = %d.message, "decode range fault");
        diagnostics.push(d);
    }
    Ok(DecodeOutcome {
        consumed,
        diagnostics,
    })
}

/// Decode one row of `image` with caller-held accumulator state.
#[tracing::instrument(skip(image, buffer, profile, acc), fields(columns = image.columns))]
pub fn decode_into(
    image: &mut Image,
    row: usize,
    buffer: &[u8],
    profile: &QuantumProfile,
    layout: QuantumLayout,
    acc: &mut BitAccumulator,
) -> PixelResult<DecodeOutcome> {
    if row >= image.rows {
        return Err(PixelError::validation(format!(
            "row {row} out of bounds (rows={})",
            image.rows
        )));
    }
    let start = row * image.columns;
    let end = start + image.columns;
    let Image {
        colorspace,
        pixels,
        indexes,
        colormap,
        ..
    } = image;
    let target = DecodeTarget {
        colorspace: *colorspace,
        colormap: colormap.as_deref(),
    };
    let row_pixels = pixels
        .get_mut(start..end)
        .ok_or_else(|| PixelError::validation("pixel buffer shorter than columns * rows"))?;
    let row_indexes = indexes.as_deref_mut().and_then(|ix| ix.get_mut(start..end));
    let outcome = decode_pixels(buffer, profile, layout, target, row_pixels, row_indexes, acc)?;
    if layout.has_alpha() {
        image.matte = true;
    }
    Ok(outcome)
}

/// Decode one row of `image` from its own buffer.
#[tracing::instrument(skip(image, buffer, profile), fields(columns = image.columns))]
pub fn decode_row(
    image: &mut Image,
    row: usize,
    buffer: &[u8],
    profile: &QuantumProfile,
    layout: QuantumLayout,
) -> PixelResult<DecodeOutcome> {
    let mut acc = BitAccumulator::new();
    decode_into(image, row, buffer, profile, layout, &mut acc)
}

/// Decode every row of `image` from one contiguous buffer.
///
/// Each row starts with a fresh accumulator at the byte where the previous row stopped.
/// Rows before a failing row stay decoded.
#[tracing::instrument(
    skip(image, buffer, profile),
    fields(columns = image.columns, rows = image.rows)
)]
pub fn decode_image(
    image: &mut Image,
    buffer: &[u8],
    profile: &QuantumProfile,
    layout: QuantumLayout,
) -> PixelResult<DecodeOutcome> {
    let mut total = DecodeOutcome::default();
    for y in 0..image.rows {
        let rest = buffer.get(total.consumed..).unwrap_or(&[]);
        let outcome = decode_row(image, y, rest, profile, layout).map_err(|err| match err {
            PixelError::TruncatedInput { needed, available } => PixelError::truncated(
                total.consumed + needed,
                total.consumed + available,
            ),
            other => other,
        })?;
        total.consumed += outcome.consumed;
        total.diagnostics.extend(outcome.diagnostics);
    }
    Ok(total)
}

struct ChannelWriter<'a> {
    profile: &'a QuantumProfile,
    reader: SampleReader,
    colormap: &'a [PixelPacket],
    bad_indexes: usize,
}

impl ChannelWriter<'_> {
    fn write(&mut self, channel: Channel, sample: Sample, px: &mut PixelPacket, ix: &mut Quantum) {
        let q = clamp_to_quantum(sample.value);
        match channel {
            Channel::Red => px.red = q,
            Channel::Green => px.green = q,
            Channel::Blue => px.blue = q,
            Channel::Gray => {
                let v = if self.profile.min_is_white && self.reader.honors_min_is_white() {
                    QUANTUM_MAX - q
                } else {
                    q
                };
                px.set_gray(v);
            }
            Channel::Alpha => px.opacity = QUANTUM_MAX - q,
            Channel::Opacity => px.opacity = q,
            Channel::Black => *ix = q,
            Channel::Index => {
                let mut raw = sample.raw;
                if self.profile.min_is_white && self.reader == (SampleReader::Packed { depth: 1 }) {
                    raw ^= 1;
                }
                let slot = match usize::try_from(raw) {
                    Ok(i) if i < self.colormap.len() => i,
                    _ => {
                        self.bad_indexes += 1;
                        0
                    }
                };
                if let Some(entry) = self.colormap.get(slot) {
                    *px = *entry;
                }
                *ix = slot as Quantum;
            }
        }
    }
}

/// 4:2:2 pairs from word-aligned 10-bit data: four samples (Cb, Y, Cr, Y) per two pixels.
fn decode_chroma_pairs(
    stream: &mut SampleStream<'_, '_>,
    offsets: [u32; 3],
    out: &mut [PixelPacket],
) -> PixelResult<()> {
    for pair in out.chunks_mut(2) {
        let mut cbcr = [0 as Quantum; 4];
        for slot in &mut cbcr {
            let v = stream.next_unpacked10(offsets)?;
            *slot = scale_short_to_quantum((v << 6) as u16);
        }
        stream.skip_pad()?;
        pair[0] = PixelPacket::opaque(cbcr[1], cbcr[0], cbcr[2]);
        if let Some(second) = pair.get_mut(1) {
            *second = PixelPacket::opaque(cbcr[3], cbcr[0], cbcr[2]);
        }
    }
    Ok(())
}

fn disassociate_alpha(pixels: &mut [PixelPacket], indexes: &mut [Quantum], cmyk: bool) {
    for (px, ix) in pixels.iter_mut().zip(indexes.iter_mut()) {
        let gamma = safe_reciprocal(QUANTUM_SCALE * f64::from(px.alpha()));
        px.red = clamp_to_quantum(gamma * f64::from(px.red));
        px.green = clamp_to_quantum(gamma * f64::from(px.green));
        px.blue = clamp_to_quantum(gamma * f64::from(px.blue));
        if cmyk {
            *ix = clamp_to_quantum(gamma * f64::from(*ix));
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/decode.rs"]
mod tests;
