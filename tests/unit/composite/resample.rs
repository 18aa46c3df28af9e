use super::*;
use crate::foundation::math::QUANTUM_MAX;

fn row(values: &[u16]) -> Image {
    let pixels = values.iter().map(|&v| PixelPacket::gray(v)).collect();
    Image::from_pixels(values.len(), 1, pixels).unwrap()
}

fn map(columns: usize, rows: usize, red: u16, green: u16, blue: u16) -> Image {
    Image::filled(columns, rows, PixelPacket::opaque(red, green, blue)).unwrap()
}

fn displacement(horizontal: Option<f64>) -> CompositeParams {
    CompositeParams::Displacement {
        horizontal,
        vertical: None,
        percent: false,
        relative_to_canvas: false,
        center_x: None,
        center_y: None,
    }
}

fn reds(image: &Image) -> Vec<u16> {
    image.pixels.iter().map(|p| p.red).collect()
}

fn run(canvas: &Image, m: &Image, op: CompositeOp, params: &CompositeParams) -> Image {
    resample_canvas(canvas, m, op, params, 0, 0, &RowRunner::Sequential)
}

#[test]
fn displace_shifts_by_scaled_map_offset() {
    let canvas = row(&[0, 10000, 20000, 30000]);
    // (49152 - 32768) / 32768 * 2 = one pixel to the right
    let out = run(&canvas, &map(4, 1, 49152, 32768, 0), CompositeOp::Displace, &displacement(Some(2.0)));
    assert_eq!(reds(&out), vec![10000, 20000, 30000, 30000]);
    assert_eq!(out.columns, 4);
    assert!(!out.matte);
}

#[test]
fn displace_percent_scale_samples_between_pixels() {
    let canvas = row(&[0, 1000, 2000, 3000, 4000]);
    let params = CompositeParams::Displacement {
        horizontal: Some(50.0),
        vertical: None,
        percent: true,
        relative_to_canvas: false,
        center_x: None,
        center_y: None,
    };
    // 50% of (5 - 1) / 2 is one pixel; half of that lands mid-way
    let out = run(&canvas, &map(5, 1, 49152, 32768, 0), CompositeOp::Displace, &params);
    assert_eq!(reds(&out), vec![500, 1500, 2500, 3500, 4000]);
}

#[test]
fn distort_places_neutral_map_at_center() {
    let canvas = row(&[0, 1000, 2000, 3000, 4000]);
    let neutral = map(5, 1, 32768, 32768, 0);
    let out = run(&canvas, &neutral, CompositeOp::Distort, &displacement(None));
    assert!(reds(&out).iter().all(|&v| v == 2000));

    let params = CompositeParams::Displacement {
        horizontal: None,
        vertical: None,
        percent: false,
        relative_to_canvas: true,
        center_x: Some(4.0),
        center_y: Some(0.0),
    };
    let out = run(&canvas, &neutral, CompositeOp::Distort, &params);
    assert!(reds(&out).iter().all(|&v| v == 4000));
}

#[test]
fn map_off_canvas_stays_transparent() {
    let canvas = row(&[100, 200]);
    let out = resample_canvas(
        &canvas,
        &map(3, 1, 32768, 32768, 0),
        CompositeOp::Displace,
        &displacement(None),
        1,
        0,
        &RowRunner::Sequential,
    );
    // map column 0 sits over canvas column 1
    assert_eq!(out.pixels[0].red, 200);
    assert_eq!(out.pixels[1], PixelPacket::transparent());
    assert_eq!(out.pixels[2], PixelPacket::transparent());
}

#[test]
fn map_opacity_masks_displaced_pixels() {
    let canvas = row(&[5000, 5000]);
    let mut m = map(2, 1, 32768, 32768, 0).with_matte(true);
    m.pixels[1].opacity = QUANTUM_MAX;
    let out = run(&canvas, &m, CompositeOp::Displace, &displacement(None));
    assert!(out.matte);
    assert_eq!(out.pixels[0].opacity, 0);
    assert_eq!(out.pixels[1].opacity, QUANTUM_MAX);
}

fn blur(sigma: f64) -> CompositeParams {
    CompositeParams::Blur {
        sigma_x: sigma,
        sigma_y: sigma,
        angle: None,
        angle_end: None,
    }
}

fn impulse() -> Image {
    let mut canvas = Image::filled(5, 5, PixelPacket::gray(0)).unwrap();
    canvas.set_pixel(2, 2, PixelPacket::gray(QUANTUM_MAX));
    canvas
}

#[test]
fn blur_keeps_uniform_canvas() {
    let canvas = Image::filled(6, 4, PixelPacket::gray(20000)).unwrap();
    let out = run(&canvas, &map(6, 4, QUANTUM_MAX, QUANTUM_MAX, 0), CompositeOp::Blur, &blur(3.0));
    assert!(out.pixels.iter().all(|p| p.red.abs_diff(20000) <= 1));
    assert!(out.pixels.iter().all(|p| p.opacity == 0));
}

#[test]
fn zero_map_gives_the_minimum_blur() {
    let canvas = impulse();
    let zero = map(5, 5, 0, 0, 0);
    let wide = run(&canvas, &zero, CompositeOp::Blur, &blur(4.0));
    let none = run(&canvas, &zero, CompositeOp::Blur, &blur(0.0));
    assert_eq!(wide, none);
    let center = wide.pixel(2, 2).unwrap().red;
    assert!(center > 30000 && center < QUANTUM_MAX);
    assert!(wide.pixel(3, 2).unwrap().red > 0);
    assert_eq!(wide.pixel(4, 2).unwrap().red, 0);
}

#[test]
fn map_red_stretches_blur_horizontally() {
    let canvas = impulse();
    let out = run(&canvas, &map(5, 5, QUANTUM_MAX, 0, 0), CompositeOp::Blur, &blur(2.0));
    let across = out.pixel(3, 2).unwrap().red;
    let down = out.pixel(2, 3).unwrap().red;
    assert!(across > down, "{across} <= {down}");
    assert!(out.pixel(4, 2).unwrap().red > 0);
}

#[test]
fn blur_does_not_bleed_transparent_color() {
    let mut canvas = Image::from_pixels(
        3,
        1,
        vec![
            PixelPacket::opaque(QUANTUM_MAX, 0, 0),
            PixelPacket {
                red: 0,
                green: 0,
                blue: QUANTUM_MAX,
                opacity: QUANTUM_MAX,
            },
            PixelPacket::opaque(QUANTUM_MAX, 0, 0),
        ],
    )
    .unwrap();
    canvas.matte = true;
    let out = run(&canvas, &map(3, 1, 0, 0, 0), CompositeOp::Blur, &blur(1.0));
    let mid = out.pixel(1, 0).unwrap();
    assert_eq!(mid.red, QUANTUM_MAX);
    assert_eq!(mid.blue, 0);
    assert!(mid.opacity > 0 && mid.opacity < QUANTUM_MAX);
}

#[test]
fn swept_angle_follows_map_blue() {
    let canvas = impulse();
    let params = CompositeParams::Blur {
        sigma_x: 2.0,
        sigma_y: 0.0,
        angle: Some(0.0),
        angle_end: Some(90.0),
    };
    // full blue turns the horizontal axis vertical
    let out = run(&canvas, &map(5, 5, QUANTUM_MAX, 0, QUANTUM_MAX), CompositeOp::Blur, &params);
    assert!(out.pixel(2, 3).unwrap().red > out.pixel(3, 2).unwrap().red);
}
