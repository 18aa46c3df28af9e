//! Quantum scaling and the small set of numeric guards every pixel path shares.

/// Storage type of one channel sample (Q16 build).
pub type Quantum = u16;

/// Bits per stored sample.
pub const QUANTUM_DEPTH: u32 = 16;

/// Largest stored sample value.
pub const QUANTUM_MAX: Quantum = u16::MAX;

/// [`QUANTUM_MAX`] as a working real.
pub const QUANTUM_RANGE: f64 = 65535.0;

/// Reciprocal of [`QUANTUM_RANGE`].
pub const QUANTUM_SCALE: f64 = 1.0 / QUANTUM_RANGE;

/// Magnitude below which a divisor is treated as zero.
pub const MAGICK_EPSILON: f64 = 1.0e-12;

/// Opacity of a fully opaque pixel (legacy opacity sense).
pub const OPAQUE_OPACITY: Quantum = 0;

/// Opacity of a fully transparent pixel (legacy opacity sense).
pub const TRANSPARENT_OPACITY: Quantum = QUANTUM_MAX;

/// `1/x`, or `0` when `|x|` is below [`MAGICK_EPSILON`]. Never returns `±inf` or NaN for finite input.
#[inline]
pub fn safe_reciprocal(x: f64) -> f64 {
    if x.abs() < MAGICK_EPSILON || !x.is_finite() {
        return 0.0;
    }
    1.0 / x
}

/// Clamp to `[0, 1]`.
#[inline]
pub fn round_to_unity(v: f64) -> f64 {
    if v < 0.0 {
        0.0
    } else if v > 1.0 {
        1.0
    } else {
        v
    }
}

/// Round a working real to the nearest storable sample, saturating at both ends.
#[inline]
pub fn clamp_to_quantum(v: f64) -> Quantum {
    if v.is_nan() || v <= 0.0 {
        return 0;
    }
    if v >= QUANTUM_RANGE {
        return QUANTUM_MAX;
    }
    (v + 0.5) as Quantum
}

/// Saturate to `[0, QUANTUM_RANGE]` without snapping to the quantum grid.
#[inline]
pub fn clamp_pixel(v: f64) -> f64 {
    if v.is_nan() || v <= 0.0 {
        0.0
    } else if v >= QUANTUM_RANGE {
        QUANTUM_RANGE
    } else {
        v
    }
}

/// 8-bit sample to quantum (`v * 257`).
#[inline]
pub fn scale_char_to_quantum(v: u8) -> Quantum {
    Quantum::from(v) * 257
}

/// 16-bit sample to quantum (identity in Q16).
#[inline]
pub fn scale_short_to_quantum(v: u16) -> Quantum {
    v
}

/// 32-bit sample to quantum, rounding to nearest.
#[inline]
pub fn scale_long_to_quantum(v: u32) -> Quantum {
    ((u64::from(v) + 32768) / 65537) as Quantum
}

/// Quantum to 8-bit, rounding to nearest.
#[inline]
pub fn scale_quantum_to_char(q: Quantum) -> u8 {
    ((u32::from(q) + 128) / 257) as u8
}

/// Quantum to 16-bit (identity in Q16).
#[inline]
pub fn scale_quantum_to_short(q: Quantum) -> u16 {
    q
}

/// Scale an integer sample with maximum `range` onto the quantum range.
#[inline]
pub fn scale_any_to_quantum(q: u64, range: u64) -> Quantum {
    if range == 0 {
        return 0;
    }
    clamp_to_quantum(QUANTUM_RANGE * q as f64 / range as f64)
}

/// `2^depth - 1` for `1..=64` bits.
#[inline]
pub fn quantum_range_for_depth(depth: u32) -> u64 {
    match depth {
        0 => 0,
        64.. => u64::MAX,
        d => (1u64 << d) - 1,
    }
}

/// Rec.601-ish luma weights used by the intensity-based operators.
#[inline]
pub fn pixel_intensity(red: f64, green: f64, blue: f64) -> f64 {
    0.298839 * red + 0.586811 * green + 0.114350 * blue
}

/// IEEE 754 binary16 bits to `f32`.
#[inline]
pub fn half_to_f32(bits: u16) -> f32 {
    half::f16::from_bits(bits).to_f32()
}

/// 24-bit float (1 sign, 7 exponent with bias 63, 16 mantissa) to `f32`.
///
/// `bytes` is least-significant first.
pub fn f24_to_f32(bytes: [u8; 3]) -> f32 {
    let [q0, q1, q2] = bytes;
    if (q0 | q1 | q2) == 0 {
        return 0.0;
    }
    let sign = q2 & 0x80;
    let mut exponent = q2 & 0x7f;
    if exponent != 0 {
        exponent = exponent + 127 - 63;
    }
    let b3 = sign | (exponent >> 1);
    let b2 = ((exponent & 1) << 7) | ((q1 & 0xfe) >> 1);
    let b1 = ((q1 & 0x01) << 7) | ((q0 & 0xfe) >> 1);
    let b0 = (q0 & 0x01) << 7;
    f32::from_le_bytes([b0, b1, b2, b3])
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
