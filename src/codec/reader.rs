use crate::codec::accumulator::BitAccumulator;
use crate::codec::layout::QuantumLayout;
use crate::codec::profile::{Endian, PackWord, QuantumFormat, QuantumProfile};
use crate::foundation::error::{PixelError, PixelResult};
use crate::foundation::math::{
    QUANTUM_RANGE, clamp_to_quantum, f24_to_f32, half_to_f32, quantum_range_for_depth,
    scale_any_to_quantum, scale_char_to_quantum, scale_long_to_quantum, scale_short_to_quantum,
};

/// Bounds-checked forward reader over one input buffer.
#[derive(Debug)]
pub(crate) struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    fn take<const N: usize>(&mut self) -> PixelResult<[u8; N]> {
        let end = self.pos + N;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or_else(|| PixelError::truncated(end, self.buf.len()))?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        self.pos = end;
        Ok(out)
    }

    pub(crate) fn skip(&mut self, n: usize) -> PixelResult<()> {
        if n == 0 {
            return Ok(());
        }
        let end = self.pos + n;
        if end > self.buf.len() {
            return Err(PixelError::truncated(end, self.buf.len()));
        }
        self.pos = end;
        Ok(())
    }

    pub(crate) fn u8(&mut self) -> PixelResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub(crate) fn u16(&mut self, endian: Endian) -> PixelResult<u16> {
        let b = self.take::<2>()?;
        Ok(if endian.is_lsb() {
            u16::from_le_bytes(b)
        } else {
            u16::from_be_bytes(b)
        })
    }

    pub(crate) fn u32(&mut self, endian: Endian) -> PixelResult<u32> {
        let b = self.take::<4>()?;
        Ok(if endian.is_lsb() {
            u32::from_le_bytes(b)
        } else {
            u32::from_be_bytes(b)
        })
    }

    pub(crate) fn u64(&mut self, endian: Endian) -> PixelResult<u64> {
        let b = self.take::<8>()?;
        Ok(if endian.is_lsb() {
            u64::from_le_bytes(b)
        } else {
            u64::from_be_bytes(b)
        })
    }

    /// Three bytes, returned least-significant first.
    pub(crate) fn u24(&mut self, endian: Endian) -> PixelResult<[u8; 3]> {
        let [a, b, c] = self.take::<3>()?;
        Ok(if endian.is_lsb() { [a, b, c] } else { [c, b, a] })
    }
}

/// One decoded sample: the integer as stored plus its value on the quantum scale.
///
/// Float samples report `raw` as the clamped quantum value, which is what index layouts use.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Sample {
    pub(crate) raw: u64,
    pub(crate) value: f64,
}

impl Sample {
    fn int(raw: u64, quantum: u16) -> Self {
        Self {
            raw,
            value: f64::from(quantum),
        }
    }

    fn real(value: f64) -> Self {
        Self {
            raw: u64::from(clamp_to_quantum(value)),
            value,
        }
    }
}

/// Depth primitive chosen once per decode call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SampleReader {
    Char,
    Short,
    SignedShort,
    Long,
    Half,
    Float24,
    Float32,
    Float64,
    /// Bit-accumulator with byte refill.
    Packed { depth: u32 },
    /// Bit-accumulator with 32-bit word refill.
    PackedWord { depth: u32 },
    /// Three 10-bit samples per 32-bit word at the given bit offsets.
    Unpacked10 { offsets: [u32; 3] },
    /// One 12-bit sample in the high bits of each 16-bit word.
    Unpacked12,
}

impl SampleReader {
    pub(crate) fn select(profile: &QuantumProfile, layout: QuantumLayout) -> Self {
        if profile.format == QuantumFormat::FloatingPoint {
            match profile.depth {
                16 => return Self::Half,
                24 => return Self::Float24,
                32 => return Self::Float32,
                64 => return Self::Float64,
                _ => {}
            }
        }
        match (profile.depth, profile.pack) {
            (8, _) => Self::Char,
            (16, _) if profile.format == QuantumFormat::Signed => Self::SignedShort,
            (16, _) => Self::Short,
            (32, _) => Self::Long,
            (10, false) => {
                let offsets = if layout == QuantumLayout::Gray && !profile.endian.is_lsb() {
                    [2, 12, 22]
                } else {
                    [22, 12, 2]
                };
                Self::Unpacked10 { offsets }
            }
            (12, false) => Self::Unpacked12,
            (depth, _) if profile.word == PackWord::Long => Self::PackedWord { depth },
            (depth, _) => Self::Packed { depth },
        }
    }

    /// Whether `min_is_white` applies to gray samples read this way.
    pub(crate) fn honors_min_is_white(self) -> bool {
        matches!(
            self,
            Self::Char | Self::Short | Self::SignedShort | Self::Packed { depth: 1 }
        )
    }
}

/// Sample source for one decode call: cursor, accumulator and the unpacked-word phase.
pub(crate) struct SampleStream<'a, 'b> {
    cursor: ByteCursor<'a>,
    acc: &'b mut BitAccumulator,
    reader: SampleReader,
    profile: &'b QuantumProfile,
    phase: usize,
    word: u32,
}

impl<'a, 'b> SampleStream<'a, 'b> {
    pub(crate) fn new(
        buf: &'a [u8],
        acc: &'b mut BitAccumulator,
        reader: SampleReader,
        profile: &'b QuantumProfile,
    ) -> Self {
        Self {
            cursor: ByteCursor::new(buf),
            acc,
            reader,
            profile,
            phase: 0,
            word: 0,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.cursor.position()
    }

    pub(crate) fn skip_pad(&mut self) -> PixelResult<()> {
        self.cursor.skip(self.profile.pad)
    }

    /// Next raw 10-bit sample from the word-aligned stream.
    pub(crate) fn next_unpacked10(&mut self, offsets: [u32; 3]) -> PixelResult<u64> {
        if self.phase == 0 {
            self.word = self.cursor.u32(self.profile.endian)?;
        }
        let v = (self.word >> offsets[self.phase]) & 0x3ff;
        self.phase = (self.phase + 1) % 3;
        Ok(u64::from(v))
    }

    pub(crate) fn next(&mut self) -> PixelResult<Sample> {
        let p = self.profile;
        let sample = match self.reader {
            SampleReader::Char => {
                let v = self.cursor.u8()?;
                Sample::int(u64::from(v), scale_char_to_quantum(v))
            }
            SampleReader::Short => {
                let v = self.cursor.u16(p.endian)?;
                Sample::int(u64::from(v), scale_short_to_quantum(v))
            }
            SampleReader::SignedShort => {
                let v = self.cursor.u16(p.endian)?;
                let biased = ((u32::from(v) + 32768) % 65536) as u16;
                Sample::int(u64::from(biased), scale_short_to_quantum(biased))
            }
            SampleReader::Long => {
                let v = self.cursor.u32(p.endian)?;
                Sample::int(u64::from(v), scale_long_to_quantum(v))
            }
            SampleReader::Half => {
                let bits = self.cursor.u16(p.endian)?;
                Sample::real(QUANTUM_RANGE * f64::from(half_to_f32(bits)))
            }
            SampleReader::Float24 => {
                let v = f64::from(f24_to_f32(self.cursor.u24(p.endian)?));
                Sample::real(clamp_f32_range((v - p.minimum) * p.scale))
            }
            SampleReader::Float32 => {
                let v = f64::from(f32::from_bits(self.cursor.u32(p.endian)?));
                Sample::real(clamp_f32_range((v - p.minimum) * p.scale))
            }
            SampleReader::Float64 => {
                let v = f64::from_bits(self.cursor.u64(p.endian)?);
                Sample::real((v - p.minimum) * p.scale)
            }
            SampleReader::Packed { depth } => {
                let v = self.acc.pull(&mut self.cursor, depth)?;
                Sample::int(v, scale_any_to_quantum(v, quantum_range_for_depth(depth)))
            }
            SampleReader::PackedWord { depth } => {
                let v = self.acc.pull_word(&mut self.cursor, depth, p.endian)?;
                Sample::int(v, scale_any_to_quantum(v, quantum_range_for_depth(depth)))
            }
            SampleReader::Unpacked10 { offsets } => {
                let v = self.next_unpacked10(offsets)?;
                Sample::int(v, scale_any_to_quantum(v, 1023))
            }
            SampleReader::Unpacked12 => {
                let v = u64::from(self.cursor.u16(p.endian)? >> 4);
                Sample::int(v, scale_any_to_quantum(v, 4095))
            }
        };
        Ok(sample)
    }
}

fn clamp_f32_range(v: f64) -> f64 {
    v.clamp(-f64::from(f32::MAX), f64::from(f32::MAX))
}

#[cfg(test)]
#[path = "../../tests/unit/codec/reader.rs"]
mod tests;
