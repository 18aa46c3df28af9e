use super::*;

#[test]
fn validate_rejects_bad_depths() {
    assert!(QuantumProfile::with_depth(0).validate().is_err());
    assert!(QuantumProfile::with_depth(65).validate().is_err());
    assert!(QuantumProfile::with_depth(64).validate().is_ok());
    assert!(
        QuantumProfile::with_depth(12)
            .format(QuantumFormat::FloatingPoint)
            .validate()
            .is_err()
    );
    let p = QuantumProfile {
        scale: f64::NAN,
        ..QuantumProfile::default()
    };
    assert!(p.validate().is_err());
}

#[test]
fn extent_counts_packed_bits_and_pad() {
    let p = QuantumProfile::with_depth(8);
    assert_eq!(p.extent(QuantumLayout::Rgb, 4), 12);
    let p = QuantumProfile {
        pad: 1,
        ..QuantumProfile::with_depth(8)
    };
    assert_eq!(p.extent(QuantumLayout::Rgba, 2), 10);
    let p = QuantumProfile::with_depth(1);
    assert_eq!(p.extent(QuantumLayout::Gray, 9), 2);
    let p = QuantumProfile::with_depth(10);
    assert_eq!(p.extent(QuantumLayout::Rgb, 3), 12);
    let p = QuantumProfile {
        pad: 2,
        ..QuantumProfile::with_depth(1)
    };
    assert!(!p.pads_pixels(QuantumLayout::Gray));
    assert_eq!(p.extent(QuantumLayout::Gray, 9), 2);
    assert_eq!(p.extent(QuantumLayout::Red, 8), 17);
}

#[test]
fn profile_json_uses_camel_case_and_defaults() {
    let p: QuantumProfile =
        serde_json::from_str(r#"{"depth":16,"endian":"msb","minIsWhite":true}"#).unwrap();
    assert_eq!(p.depth, 16);
    assert_eq!(p.endian, Endian::Msb);
    assert!(p.min_is_white);
    assert!(p.pack);
    assert_eq!(p.scale, QUANTUM_RANGE);

    let p: QuantumProfile = serde_json::from_str(r#"{"format":"float","depth":32}"#).unwrap();
    assert_eq!(p.format, QuantumFormat::FloatingPoint);
}

#[test]
fn byte_order_and_format_parse_as_cli_values() {
    use clap::ValueEnum;

    assert_eq!(Endian::from_str("lsb", true).unwrap(), Endian::Lsb);
    assert_eq!(Endian::from_str("BIG", true).unwrap(), Endian::Msb);
    assert!(Endian::from_str("middle", true).is_err());
    assert_eq!(
        QuantumFormat::from_str("floating-point", true).unwrap(),
        QuantumFormat::FloatingPoint
    );
    assert_eq!(
        QuantumFormat::from_str("float", true).unwrap(),
        QuantumFormat::FloatingPoint
    );
}
