use super::*;
use crate::foundation::core::Colorspace;

const R: f64 = QUANTUM_RANGE;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn run(p: &MagickPixel, q: &MagickPixel, op: CompositeOp) -> MagickPixel {
    blend(p, q, op, &CompositeParams::defaults_for(op), ChannelMask::ALL, true)
}

#[test]
fn channel_mask_parses_letters() {
    let m: ChannelMask = "rgb".parse().unwrap();
    assert_eq!(m, ChannelMask::RED | ChannelMask::GREEN | ChannelMask::BLUE);
    assert_eq!(m.to_string(), "rgb");
    let m: ChannelMask = "c,m,y,k".parse().unwrap();
    assert!(m.contains(ChannelMask::INDEX));
    assert!(!m.contains(ChannelMask::OPACITY));
    assert_eq!("ALL".parse::<ChannelMask>().unwrap(), ChannelMask::ALL);
    assert_eq!(ChannelMask::ALL.to_string(), "all");
    assert!("rgx".parse::<ChannelMask>().is_err());
    assert!("".parse::<ChannelMask>().is_err());
    assert!(!ChannelMask::ALL.contains(ChannelMask::NONE));
}

#[test]
fn channel_mask_serde_goes_through_strings() {
    let json = serde_json::to_string(&(ChannelMask::RED | ChannelMask::OPACITY)).unwrap();
    assert_eq!(json, "\"ra\"");
    let back: ChannelMask = serde_json::from_str("\"gb\"").unwrap();
    assert_eq!(back, ChannelMask::GREEN | ChannelMask::BLUE);
    assert!(serde_json::from_str::<ChannelMask>("\"q\"").is_err());
}

#[test]
fn over_with_opaque_source_is_source() {
    let p = MagickPixel::rgb(1000.0, 2000.0, 3000.0);
    let q = MagickPixel::rgb(50000.0, 40000.0, 30000.0);
    let out = run(&p, &q, CompositeOp::Over);
    assert!(close(out.red, 1000.0));
    assert!(close(out.green, 2000.0));
    assert!(close(out.blue, 3000.0));
    assert!(close(out.opacity, 0.0));
}

#[test]
fn over_with_transparent_source_keeps_canvas() {
    let p = MagickPixel::rgbo(1000.0, 2000.0, 3000.0, R);
    let q = MagickPixel::rgb(50000.0, 40000.0, 30000.0);
    let out = run(&p, &q, CompositeOp::Over);
    assert!(close(out.red, 50000.0));
    assert!(close(out.blue, 30000.0));
    assert!(close(out.opacity, 0.0));
}

#[test]
fn half_transparent_over_mixes_evenly() {
    let p = MagickPixel::rgbo(R, 0.0, 0.0, R / 2.0);
    let q = MagickPixel::rgb(0.0, 0.0, R);
    let out = run(&p, &q, CompositeOp::Over);
    assert!(close(out.red, R / 2.0));
    assert!(close(out.blue, R / 2.0));
    assert!(close(out.opacity, 0.0));
}

#[test]
fn clear_is_transparent_black() {
    let p = MagickPixel::rgb(1.0, 2.0, 3.0);
    let q = MagickPixel::rgb(4.0, 5.0, 6.0);
    let out = run(&p, &q, CompositeOp::Clear);
    assert_eq!((out.red, out.green, out.blue, out.opacity), (0.0, 0.0, 0.0, R));
}

#[test]
fn xor_of_opaque_pixels_is_empty() {
    let p = MagickPixel::rgb(R, 0.0, 0.0);
    let q = MagickPixel::rgb(0.0, R, 0.0);
    let a = run(&p, &q, CompositeOp::Xor);
    let b = run(&q, &p, CompositeOp::Xor);
    assert!(close(a.opacity, R));
    assert_eq!(a.opacity, b.opacity);
    assert_eq!((a.red, a.green), (0.0, 0.0));
}

#[test]
fn multiply_sync_matches_unsynced_for_opaque_pixels() {
    let p = MagickPixel::rgb(30000.0, 12000.0, 65535.0);
    let q = MagickPixel::rgb(20000.0, 50000.0, 100.0);
    let synced = blend(&p, &q, CompositeOp::Multiply, &CompositeParams::None, ChannelMask::ALL, true);
    let split = blend(&p, &q, CompositeOp::Multiply, &CompositeParams::None, ChannelMask::ALL, false);
    assert!(close(synced.red, split.red));
    assert!(close(synced.green, split.green));
    assert!(close(synced.blue, split.blue));
    assert!(close(synced.opacity, split.opacity));
    assert!(close(synced.red, 30000.0 * 20000.0 / R));
}

#[test]
fn synced_plus_uses_clamped_coverage_sum() {
    let p = MagickPixel::rgbo(40000.0, 0.0, 10000.0, R / 2.0);
    let q = MagickPixel::rgbo(20000.0, 30000.0, 0.0, R / 2.0);
    let out = run(&p, &q, CompositeOp::Plus);
    assert!(close(out.opacity, 0.0));
    assert!(close(out.red, 0.5 * 40000.0 + 0.5 * 20000.0));
    assert!(close(out.green, 0.5 * 30000.0));
    assert!(close(out.blue, 0.5 * 10000.0));

    let p = MagickPixel::rgbo(40000.0, 0.0, 10000.0, 0.75 * R);
    let q = MagickPixel::rgbo(20000.0, 30000.0, 0.0, 0.75 * R);
    let out = run(&p, &q, CompositeOp::Plus);
    assert!(close(out.opacity, 0.5 * R));
    assert!(close(out.red, (0.25 * 40000.0 + 0.25 * 20000.0) / 0.5));
    assert!(close(out.green, 15000.0));

    let over = run(&p, &q, CompositeOp::Over);
    assert!(out.opacity < over.opacity);

    let opaque = run(
        &MagickPixel::rgb(40000.0, 0.0, 0.0),
        &MagickPixel::rgb(30000.0, 0.0, 0.0),
        CompositeOp::Plus,
    );
    assert!(close(opaque.opacity, 0.0));
    assert!(close(opaque.red, 70000.0));
}

#[test]
fn unsynced_plus_touches_only_masked_channels() {
    let p = MagickPixel::rgb(100.0, 200.0, 300.0);
    let q = MagickPixel::rgb(1000.0, 2000.0, 3000.0);
    let out = blend(&p, &q, CompositeOp::Plus, &CompositeParams::None, ChannelMask::RED, false);
    assert_eq!(out.red, 1100.0);
    assert_eq!(out.green, 2000.0);
    assert_eq!(out.blue, 3000.0);
    assert_eq!(out.opacity, 0.0);
}

#[test]
fn unsynced_darken_and_lighten_pick_per_channel() {
    let p = MagickPixel::rgb(100.0, 5000.0, 300.0);
    let q = MagickPixel::rgb(1000.0, 2000.0, 30.0);
    let dark = blend(&p, &q, CompositeOp::Darken, &CompositeParams::None, ChannelMask::ALL, false);
    assert_eq!((dark.red, dark.green, dark.blue), (100.0, 2000.0, 30.0));
    let light = blend(&p, &q, CompositeOp::Lighten, &CompositeParams::None, ChannelMask::ALL, false);
    assert_eq!((light.red, light.green, light.blue), (1000.0, 5000.0, 300.0));
}

#[test]
fn copy_opacity_uses_intensity_without_matte() {
    let black = MagickPixel::rgb(0.0, 0.0, 0.0);
    let q = MagickPixel::rgbo(10.0, 20.0, 30.0, 0.0);
    let out = run(&black, &q, CompositeOp::CopyOpacity);
    assert_eq!(out.opacity, R);
    assert_eq!(out.red, 10.0);

    let with_alpha = MagickPixel::rgbo(0.0, 0.0, 0.0, 1234.0);
    assert_eq!(run(&with_alpha, &q, CompositeOp::CopyOpacity).opacity, 1234.0);
}

#[test]
fn copy_channels_move_one_channel() {
    let p = MagickPixel::rgb(1.0, 2.0, 3.0);
    let q = MagickPixel::rgb(10.0, 20.0, 30.0);
    let out = run(&p, &q, CompositeOp::CopyGreen);
    assert_eq!((out.red, out.green, out.blue), (10.0, 2.0, 30.0));
    let out = run(&p, &q, CompositeOp::CopyCyan);
    assert_eq!((out.red, out.green, out.blue), (1.0, 20.0, 30.0));
}

#[test]
fn copy_black_converts_rgb_source() {
    let p = MagickPixel::rgb(0.0, 0.0, 0.0);
    let q = MagickPixel {
        colorspace: Colorspace::Cmyk,
        ..MagickPixel::rgb(10.0, 20.0, 30.0)
    };
    let out = run(&p, &q, CompositeOp::CopyBlack);
    assert_eq!(out.index, R);
    assert_eq!(out.red, 10.0);
}

#[test]
fn stereo_takes_source_red_and_averages_opacity() {
    let p = MagickPixel::rgbo(9.0, 1.0, 1.0, 100.0);
    let q = MagickPixel::rgbo(1.0, 7.0, 8.0, 300.0);
    let out = run(&p, &q, CompositeOp::Stereo);
    assert_eq!((out.red, out.green, out.blue), (9.0, 7.0, 8.0));
    assert_eq!(out.opacity, 200.0);
}

#[test]
fn change_mask_clears_matching_pixels() {
    let q = MagickPixel::rgbo(1000.0, 1000.0, 1000.0, 0.0);
    let same = MagickPixel::rgbo(1010.0, 1000.0, 1000.0, 0.0);
    let other = MagickPixel::rgbo(9000.0, 1000.0, 1000.0, 0.0);
    let params = CompositeParams::ChangeMask { fuzz: 100.0 };
    let out = blend(&same, &q, CompositeOp::ChangeMask, &params, ChannelMask::ALL, true);
    assert_eq!(out.opacity, R);
    let out = blend(&other, &q, CompositeOp::ChangeMask, &params, ChannelMask::ALL, true);
    assert_eq!(out.opacity, 0.0);
}

#[test]
fn dissolve_with_zero_source_keeps_canvas() {
    let p = MagickPixel::rgb(R, R, R);
    let q = MagickPixel::rgb(100.0, 200.0, 300.0);
    let params = CompositeParams::Dissolve {
        source: 0.0,
        canvas: 1.0,
    };
    let out = blend(&p, &q, CompositeOp::Dissolve, &params, ChannelMask::ALL, true);
    assert!(close(out.red, 100.0));
    assert!(close(out.blue, 300.0));
    assert!(close(out.opacity, 0.0));
}

#[test]
fn hcl_operators_skip_transparent_source() {
    let p = MagickPixel::rgbo(R, 0.0, 0.0, R);
    let q = MagickPixel::rgb(0.0, 0.0, R);
    for op in [
        CompositeOp::Hue,
        CompositeOp::Saturate,
        CompositeOp::Luminize,
        CompositeOp::Colorize,
        CompositeOp::Modulate,
        CompositeOp::Bumpmap,
    ] {
        assert_eq!(run(&p, &q, op), q, "{op}");
    }
}

#[test]
fn luminize_with_gray_source_keeps_canvas_hue() {
    let p = MagickPixel::rgb(R / 2.0, R / 2.0, R / 2.0);
    let q = MagickPixel::rgb(R, 0.0, 0.0);
    let out = run(&p, &q, CompositeOp::Luminize);
    assert!(out.red > out.green);
    assert!(close(out.green, out.blue));
}

#[test]
fn threshold_moves_far_channels() {
    let p = MagickPixel::rgb(R, 0.0, 0.0);
    let q = MagickPixel::rgb(0.0, 0.0, 0.0);
    let params = CompositeParams::Threshold {
        amount: 0.5,
        threshold: 0.05 * R,
    };
    let out = blend(&p, &q, CompositeOp::Threshold, &params, ChannelMask::ALL, true);
    assert!(close(out.red, R / 2.0));
    assert_eq!(out.green, 0.0);
    assert_eq!(out.opacity, R);
}

#[test]
fn noops_return_destination() {
    let p = MagickPixel::rgb(1.0, 2.0, 3.0);
    let q = MagickPixel::rgbo(4.0, 5.0, 6.0, 7.0);
    for op in [CompositeOp::Dst, CompositeOp::No, CompositeOp::Undefined] {
        assert_eq!(run(&p, &q, op), q);
    }
}

#[test]
fn every_operator_stays_finite() {
    let p = MagickPixel::rgbo(0.0, R, 12345.0, R);
    let q = MagickPixel::rgbo(R, 0.0, 0.0, R);
    for op in CompositeOp::ALL {
        let out = run(&p, &q, op);
        for v in [out.red, out.green, out.blue, out.opacity, out.index] {
            assert!(v.is_finite(), "{op} produced {v}");
        }
    }
}
