use crate::codec::profile::Endian;
use crate::codec::reader::ByteCursor;
use crate::foundation::error::PixelResult;

#[inline]
fn low_mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

/// Partially consumed refill unit carried between sample pulls.
///
/// Reset it at the start of every buffer; state left over from a previous row shifts every
/// subsequent sample.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BitAccumulator {
    pixel: u64,
    bits: u32,
}

impl BitAccumulator {
    /// Empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop any buffered bits.
    pub fn reset(&mut self) {
        self.pixel = 0;
        self.bits = 0;
    }

    /// Bits still buffered from the last refill.
    pub fn pending_bits(&self) -> u32 {
        self.bits
    }

    /// Pull `depth` bits, refilling one byte at a time, most-significant bit first.
    pub(crate) fn pull(&mut self, cursor: &mut ByteCursor<'_>, depth: u32) -> PixelResult<u64> {
        let mut value = 0u64;
        let mut remaining = depth;
        while remaining > 0 {
            if self.bits == 0 {
                self.pixel = u64::from(cursor.u8()?);
                self.bits = 8;
            }
            let take = remaining.min(self.bits);
            remaining -= take;
            self.bits -= take;
            let chunk = (self.pixel >> self.bits) & low_mask(take);
            value = (value << take) | chunk;
        }
        Ok(value)
    }

    /// Pull `depth` bits, refilling one 32-bit word at a time in `endian` order.
    ///
    /// Within a word samples are taken from the least-significant end, and the first bits
    /// pulled land in the low end of the result.
    pub(crate) fn pull_word(
        &mut self,
        cursor: &mut ByteCursor<'_>,
        depth: u32,
        endian: Endian,
    ) -> PixelResult<u64> {
        let mut value = 0u64;
        let mut remaining = depth;
        while remaining > 0 {
            if self.bits == 0 {
                self.pixel = u64::from(cursor.u32(endian)?);
                self.bits = 32;
            }
            let take = remaining.min(self.bits);
            let chunk = (self.pixel >> (32 - self.bits)) & low_mask(take);
            value |= chunk << (depth - remaining);
            remaining -= take;
            self.bits -= take;
        }
        Ok(value)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/accumulator.rs"]
mod tests;
