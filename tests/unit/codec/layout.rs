use super::*;

#[test]
fn names_round_trip_through_from_str() {
    for layout in QuantumLayout::ALL {
        assert_eq!(layout.to_string().parse::<QuantumLayout>().unwrap(), layout);
    }
    assert_eq!("Gray-Alpha".parse::<QuantumLayout>().unwrap(), QuantumLayout::GrayAlpha);
    assert_eq!("CMYK_A".parse::<QuantumLayout>().unwrap(), QuantumLayout::Cmyka);
    assert!("rgbx".parse::<QuantumLayout>().is_err());
}

#[test]
fn channel_table_orders_samples() {
    assert_eq!(
        QuantumLayout::Bgra.channels(),
        &[Channel::Blue, Channel::Green, Channel::Red, Channel::Alpha]
    );
    assert_eq!(QuantumLayout::Cyan.channels(), QuantumLayout::Red.channels());
    assert_eq!(QuantumLayout::Cmyko.samples_per_pixel(), 5);
    assert_eq!(QuantumLayout::CbYCrY.samples_per_pixel(), 2);
}

#[test]
fn layout_predicates() {
    assert!(QuantumLayout::Black.requires_cmyk());
    assert!(QuantumLayout::Cmyka.requires_cmyk());
    assert!(!QuantumLayout::Yellow.requires_cmyk());
    assert!(QuantumLayout::IndexAlpha.is_indexed());
    assert!(QuantumLayout::Rgbo.has_alpha());
    assert!(!QuantumLayout::Rgb.has_alpha());
    assert!(QuantumLayout::CbYCrA.swaps_chroma());
    assert!(!QuantumLayout::CbYCrY.swaps_chroma());
}

#[test]
fn serde_uses_lowercase_names() {
    let s = serde_json::to_string(&QuantumLayout::GrayAlpha).unwrap();
    assert_eq!(s, "\"grayalpha\"");
    let l: QuantumLayout = serde_json::from_str("\"cbycr\"").unwrap();
    assert_eq!(l, QuantumLayout::CbYCr);
}
