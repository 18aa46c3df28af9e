use super::*;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn over_with_opaque_source_returns_source() {
    assert!(close(over(1000.0, 0.0, 5000.0, 0.0), 1000.0));
    assert!(close(over(1000.0, QUANTUM_RANGE, 5000.0, 0.0), 5000.0));
}

#[test]
fn multiply_and_screen_at_full_coverage() {
    assert!(close(multiply(0.5, 1.0, 0.5, 1.0), 0.25));
    assert!(close(screen(0.5, 0.5), 0.75));
    assert!(close(multiply(0.3, 1.0, 1.0, 1.0), 0.3));
}

#[test]
fn difference_is_symmetric() {
    let a = difference(0.2, 1.0, 0.7, 1.0);
    let b = difference(0.7, 1.0, 0.2, 1.0);
    assert!(close(a, b));
    assert!(close(a, 0.5));
}

#[test]
fn divide_handles_black_canvas() {
    assert!(close(divide(0.0, 1.0, 0.0, 1.0), 0.0));
    assert!(close(divide(0.4, 1.0, 0.0, 1.0), 1.0));
    assert!(close(divide(0.25, 1.0, 0.5, 1.0), 0.5));
}

#[test]
fn color_dodge_saturates_and_burn_floors() {
    assert!(close(color_dodge(1.0, 1.0, 0.5, 1.0), 1.0));
    assert!(close(color_burn(0.0, 1.0, 0.5, 1.0), 0.0));
    assert!(color_dodge(0.5, 1.0, 0.2, 1.0) > 0.2);
}

#[test]
fn hard_light_matches_multiply_and_screen_halves() {
    assert!(close(hard_light(0.25, 1.0, 0.5, 1.0), 2.0 * 0.25 * 0.5));
    assert!(close(hard_light(0.75, 1.0, 0.5, 1.0), 1.0 - 2.0 * 0.5 * 0.25));
}

#[test]
fn hard_mix_compares_against_range() {
    assert_eq!(hard_mix(QUANTUM_RANGE * 0.4, QUANTUM_RANGE * 0.5), 0.0);
    assert_eq!(hard_mix(QUANTUM_RANGE * 0.6, QUANTUM_RANGE * 0.5), 1.0);
}

#[test]
fn mathematics_reproduces_multiply_and_plus() {
    let k = [1.0, 0.0, 0.0, 0.0];
    assert!(close(mathematics(0.3, 1.0, 0.6, 1.0, k), multiply(0.3, 1.0, 0.6, 1.0)));
    let k = [0.0, 1.0, 1.0, 0.0];
    assert!(close(mathematics(0.3, 1.0, 0.4, 1.0, k), 0.7));
}

#[test]
fn modulus_wraps() {
    assert!(close(modulus_add(40000.0, 1.0, 30000.0, 1.0), 70000.0 - QUANTUM_RANGE));
    assert!(close(modulus_add(100.0, 1.0, 200.0, 1.0), 300.0));
    assert!(close(modulus_subtract(100.0, 1.0, 300.0, 1.0), -200.0));
    assert!(close(modulus_subtract(300.0, 1.0, 100.0, 1.0), 200.0 + QUANTUM_RANGE));
}

#[test]
fn threshold_gates_small_differences() {
    assert_eq!(threshold(110.0, 100.0, 50.0, 0.5), 100.0);
    assert!(close(threshold(200.0, 100.0, 50.0, 0.5), 150.0));
}

#[test]
fn soft_light_is_identity_at_mid_source() {
    assert!(close(soft_light(0.5, 1.0, 0.3, 1.0), 0.3));
}

#[test]
fn xor_at_full_coverage_is_empty() {
    assert!(close(xor(0.5, 1.0, 0.5, 1.0), 0.0));
    assert!(close(xor(0.5, 1.0, 0.0, 0.0), 0.5));
}

#[test]
fn pegtop_with_empty_canvas_returns_source() {
    assert!(close(pegtop_light(0.4, 1.0, 0.0, 0.0), 0.4));
}

#[test]
fn vivid_light_zero_source_coverage_is_finite() {
    let v = vivid_light(0.0, 0.0, 0.5, 1.0);
    assert!(v.is_finite());
    assert!(close(v, 0.5));
}
