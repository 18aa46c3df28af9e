use super::*;

#[test]
fn alpha_is_inverse_of_opacity() {
    let mut p = PixelPacket::opaque(1, 2, 3);
    assert_eq!(p.alpha(), QUANTUM_MAX);
    p.set_alpha(0);
    assert_eq!(p.opacity, QUANTUM_MAX);
    assert_eq!(PixelPacket::transparent().alpha(), 0);
}

#[test]
fn magick_pixel_ignores_opacity_without_matte() {
    let p = PixelPacket {
        red: 10,
        green: 20,
        blue: 30,
        opacity: 500,
    };
    let m = MagickPixel::from_packet(&p, 77, Colorspace::Rgb, false);
    assert_eq!(m.opacity, 0.0);
    assert_eq!(m.index, 0.0);
    let m = MagickPixel::from_packet(&p, 77, Colorspace::Cmyk, true);
    assert_eq!(m.opacity, 500.0);
    assert_eq!(m.index, 77.0);
    assert_eq!(m.to_packet(), p);
}

#[test]
fn image_rejects_empty_dimensions() {
    assert!(Image::new(0, 4).is_err());
    assert!(Image::new(4, 0).is_err());
}

#[test]
fn rows_and_indexes_line_up() {
    let mut img = Image::new(3, 2).unwrap().with_colorspace(Colorspace::Cmyk);
    {
        let (row, ix) = img.row_parts_mut(1).unwrap();
        row[2] = PixelPacket::gray(9);
        ix.unwrap()[2] = 5;
    }
    assert_eq!(img.pixel(2, 1), Some(PixelPacket::gray(9)));
    assert_eq!(img.index(2, 1), 5);
    assert_eq!(img.index_row(1).unwrap(), &[0, 0, 5]);
    assert!(img.row(2).is_err());
    assert_eq!(img.pixel(3, 0), None);
}

#[test]
fn from_pixels_checks_length_and_detects_matte() {
    assert!(Image::from_pixels(2, 2, vec![PixelPacket::default(); 3]).is_err());
    let mut px = vec![PixelPacket::opaque(0, 0, 0); 4];
    px[3].opacity = 1;
    let img = Image::from_pixels(2, 2, px).unwrap();
    assert!(img.matte);
}
