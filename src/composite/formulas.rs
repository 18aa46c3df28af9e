//! Scalar blend functions.
//!
//! Unless noted otherwise the arguments are the premultiplied source color `sca`, source coverage
//! `sa`, premultiplied canvas color `dca` and canvas coverage `da`, all normalized to `[0, 1]`, and
//! the result is the premultiplied composite color including the `sca*(1-da) + dca*(1-sa)`
//! spill terms.

use crate::foundation::math::{MAGICK_EPSILON, QUANTUM_RANGE, QUANTUM_SCALE, safe_reciprocal};

/// Straight-alpha source-over of one channel, with opacities on the quantum scale.
#[inline]
pub fn over(p: f64, alpha: f64, q: f64, beta: f64) -> f64 {
    let sa = 1.0 - QUANTUM_SCALE * alpha;
    let da = 1.0 - QUANTUM_SCALE * beta;
    sa * p + da * q * (1.0 - sa)
}

/// Atop on straight colors; canvas coverage cancels out.
#[inline]
pub fn atop(p: f64, sa: f64, q: f64) -> f64 {
    p * sa + q * (1.0 - sa)
}

/// In on straight colors.
#[inline]
pub fn in_(p: f64, sa: f64, da: f64) -> f64 {
    sa * p * da
}

/// Out on straight colors.
#[inline]
pub fn out(p: f64, sa: f64, da: f64) -> f64 {
    sa * p * (1.0 - da)
}

#[inline]
fn spill(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    sca * (1.0 - da) + dca * (1.0 - sa)
}

/// Xor.
#[inline]
pub fn xor(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    spill(sca, sa, dca, da)
}

/// Color burn, with explicit limits where the source vanishes.
pub fn color_burn(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    if sca.abs() < MAGICK_EPSILON && (dca - da).abs() < MAGICK_EPSILON {
        return sa * da + dca * (1.0 - sa);
    }
    if sca < MAGICK_EPSILON {
        return dca * (1.0 - sa);
    }
    let sa_sca = sa * safe_reciprocal(sca);
    sa * da - sa * da.min((da - dca) * sa_sca) + spill(sca, sa, dca, da)
}

/// Color dodge.
pub fn color_dodge(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    if sca * da + dca * sa >= sa * da {
        return sa * da + spill(sca, sa, dca, da);
    }
    dca * sa * sa * safe_reciprocal(sa - sca) + spill(sca, sa, dca, da)
}

/// Difference on straight colors scaled by coverage; the caller divides by the composite coverage.
#[inline]
pub fn difference(p: f64, sa: f64, q: f64, da: f64) -> f64 {
    sa * p + da * q - sa * da * 2.0 * p.min(q)
}

/// Source divided by canvas, with black/black staying black and color/black going white.
pub fn divide(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    if sca.abs() < MAGICK_EPSILON && dca.abs() < MAGICK_EPSILON {
        return spill(sca, sa, dca, da);
    }
    if dca.abs() < MAGICK_EPSILON {
        return sa * da + spill(sca, sa, dca, da);
    }
    sca * da * da * safe_reciprocal(dca) + spill(sca, sa, dca, da)
}

/// Exclusion.
#[inline]
pub fn exclusion(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    sca * da + dca * sa - 2.0 * sca * dca + spill(sca, sa, dca, da)
}

/// Hard light.
pub fn hard_light(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    if 2.0 * sca < sa {
        return 2.0 * sca * dca + spill(sca, sa, dca, da);
    }
    sa * da - 2.0 * (da - dca) * (sa - sca) + spill(sca, sa, dca, da)
}

/// Hard mix: `0` or `1` depending on whether the quantum-scale premultiplied sum reaches range.
#[inline]
pub fn hard_mix(sca: f64, dca: f64) -> f64 {
    if sca + dca < QUANTUM_RANGE { 0.0 } else { 1.0 }
}

/// Linear burn.
#[inline]
pub fn linear_burn(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    sca + dca - sa * da
}

/// Linear light.
#[inline]
pub fn linear_light(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    (sca - sa) * da + sca + dca
}

/// Mathematics with coefficients `[a, b, c, d]`.
#[inline]
pub fn mathematics(sca: f64, sa: f64, dca: f64, da: f64, k: [f64; 4]) -> f64 {
    let [a, b, c, d] = k;
    a * sca * dca + b * sca * da + c * dca * sa + d * sa * da + spill(sca, sa, dca, da)
}

/// Minus; canvas coverage does not participate.
#[inline]
pub fn minus(sca: f64, sa: f64, dca: f64) -> f64 {
    sca + dca - 2.0 * dca * sa
}

/// Modulus add on quantum-scale straight colors.
#[inline]
pub fn modulus_add(sc: f64, sa: f64, dc: f64, da: f64) -> f64 {
    let sum = sc * sa + dc * da;
    if sum <= QUANTUM_RANGE {
        sum
    } else {
        sum - QUANTUM_RANGE
    }
}

/// Modulus subtract on quantum-scale straight colors.
#[inline]
pub fn modulus_subtract(sc: f64, sa: f64, dc: f64, da: f64) -> f64 {
    let diff = sc * sa - dc * da;
    if diff <= 0.0 {
        diff
    } else {
        diff + QUANTUM_RANGE
    }
}

/// Multiply.
#[inline]
pub fn multiply(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    sca * dca + spill(sca, sa, dca, da)
}

/// Pegtop light.
pub fn pegtop_light(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    if da.abs() < MAGICK_EPSILON {
        return sca;
    }
    dca * dca * (sa - 2.0 * sca) * safe_reciprocal(da) + sca * (2.0 * dca + 1.0 - da)
        + dca * (1.0 - sa)
}

/// Pin light.
pub fn pin_light(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    if dca * sa < da * (2.0 * sca - sa) {
        return sca * (da + 1.0) - sa * da + dca * (1.0 - sa);
    }
    if dca * sa > 2.0 * sca * da {
        return sca * da + sca + dca * (1.0 - sa);
    }
    sca * (1.0 - da) + dca
}

/// Screen.
#[inline]
pub fn screen(sca: f64, dca: f64) -> f64 {
    sca + dca - sca * dca
}

/// Soft light.
pub fn soft_light(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    let alpha = dca * safe_reciprocal(da);
    if 2.0 * sca < sa {
        return dca * (sa + (2.0 * sca - sa) * (1.0 - alpha)) + spill(sca, sa, dca, da);
    }
    if 2.0 * sca > sa && 4.0 * dca <= da {
        return dca * sa
            + da * (2.0 * sca - sa) * (4.0 * alpha * (4.0 * alpha + 1.0) * (alpha - 1.0) + 7.0 * alpha)
            + spill(sca, sa, dca, da);
    }
    dca * sa + da * (2.0 * sca - sa) * (alpha.sqrt() - alpha) + spill(sca, sa, dca, da)
}

/// Move `q` toward `p` by `amount` when they differ by at least half of `threshold`.
#[inline]
pub fn threshold(p: f64, q: f64, threshold: f64, amount: f64) -> f64 {
    let delta = p - q;
    if (2.0 * delta).abs() < threshold {
        return q;
    }
    q + delta * amount
}

/// Vivid light.
pub fn vivid_light(sca: f64, sa: f64, dca: f64, da: f64) -> f64 {
    if sa.abs() < MAGICK_EPSILON || (sca - sa).abs() < MAGICK_EPSILON {
        return sa * da + spill(sca, sa, dca, da);
    }
    if 2.0 * sca <= sa {
        return sa * (da + sa * (dca - da) * safe_reciprocal(2.0 * sca)) + spill(sca, sa, dca, da);
    }
    dca * sa * sa * safe_reciprocal(2.0 * (sa - sca)) + spill(sca, sa, dca, da)
}

#[cfg(test)]
#[path = "../../tests/unit/composite/formulas.rs"]
mod tests;
