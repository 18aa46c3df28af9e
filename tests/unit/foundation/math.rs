use super::*;

#[test]
fn safe_reciprocal_never_blows_up() {
    for x in [0.0, 1.0e-13, -1.0e-13, -0.0, f64::NAN, f64::INFINITY] {
        let r = safe_reciprocal(x);
        assert_eq!(r, 0.0, "x={x}");
    }
    assert_eq!(safe_reciprocal(4.0), 0.25);
    assert_eq!(safe_reciprocal(-2.0), -0.5);
}

#[test]
fn clamp_to_quantum_rounds_and_saturates() {
    assert_eq!(clamp_to_quantum(-3.0), 0);
    assert_eq!(clamp_to_quantum(f64::NAN), 0);
    assert_eq!(clamp_to_quantum(0.49), 0);
    assert_eq!(clamp_to_quantum(0.5), 1);
    assert_eq!(clamp_to_quantum(70000.0), QUANTUM_MAX);
    assert_eq!(clamp_to_quantum(QUANTUM_RANGE), QUANTUM_MAX);
}

#[test]
fn byte_scaling_hits_both_ends() {
    assert_eq!(scale_char_to_quantum(0), 0);
    assert_eq!(scale_char_to_quantum(0x80), 32896);
    assert_eq!(scale_char_to_quantum(0xff), QUANTUM_MAX);
    assert_eq!(scale_long_to_quantum(u32::MAX), QUANTUM_MAX);
    assert_eq!(scale_long_to_quantum(0), 0);
    for v in [0u8, 1, 127, 128, 254, 255] {
        assert_eq!(scale_quantum_to_char(scale_char_to_quantum(v)), v);
    }
}

#[test]
fn scale_any_maps_depth_range_onto_quantum_range() {
    assert_eq!(scale_any_to_quantum(1023, 1023), QUANTUM_MAX);
    assert_eq!(scale_any_to_quantum(0, 1023), 0);
    assert_eq!(scale_any_to_quantum(1, 1), QUANTUM_MAX);
    assert_eq!(scale_any_to_quantum(7, 0), 0);
    assert_eq!(quantum_range_for_depth(1), 1);
    assert_eq!(quantum_range_for_depth(10), 1023);
    assert_eq!(quantum_range_for_depth(64), u64::MAX);
}

#[test]
fn round_to_unity_clamps() {
    assert_eq!(round_to_unity(-0.1), 0.0);
    assert_eq!(round_to_unity(0.25), 0.25);
    assert_eq!(round_to_unity(1.5), 1.0);
}

#[test]
fn half_and_f24_decode_known_values() {
    assert_eq!(half_to_f32(0x3c00), 1.0);
    assert_eq!(half_to_f32(0x3800), 0.5);
    assert_eq!(half_to_f32(0xc000), -2.0);

    assert_eq!(f24_to_f32([0, 0, 0]), 0.0);
    // 1.0: biased exponent 63, empty mantissa.
    assert_eq!(f24_to_f32([0x00, 0x00, 0x3f]), 1.0);
    // 1.5: top mantissa bit set.
    assert_eq!(f24_to_f32([0x00, 0x80, 0x3f]), 1.5);
    assert_eq!(f24_to_f32([0x00, 0x00, 0xbf]), -1.0);
    assert_eq!(f24_to_f32([0x00, 0x00, 0x40]), 2.0);
}

#[test]
fn intensity_weights_sum_to_unity() {
    let i = pixel_intensity(1.0, 1.0, 1.0);
    assert!((i - 1.0).abs() < 1.0e-9);
}
