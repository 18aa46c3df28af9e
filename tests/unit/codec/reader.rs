use super::*;

fn stream_values(buf: &[u8], profile: &QuantumProfile, layout: QuantumLayout, n: usize) -> Vec<Sample> {
    let mut acc = BitAccumulator::new();
    let reader = SampleReader::select(profile, layout);
    let mut s = SampleStream::new(buf, &mut acc, reader, profile);
    (0..n).map(|_| s.next().unwrap()).collect()
}

#[test]
fn selects_primitive_once_per_profile() {
    let p = QuantumProfile::with_depth(8);
    assert_eq!(SampleReader::select(&p, QuantumLayout::Rgb), SampleReader::Char);
    let p = QuantumProfile::with_depth(16).format(QuantumFormat::FloatingPoint);
    assert_eq!(SampleReader::select(&p, QuantumLayout::Rgb), SampleReader::Half);
    let p = QuantumProfile::with_depth(24);
    assert_eq!(
        SampleReader::select(&p, QuantumLayout::Rgb),
        SampleReader::Packed { depth: 24 }
    );
    let p = QuantumProfile {
        pack: false,
        ..QuantumProfile::with_depth(10)
    };
    assert_eq!(
        SampleReader::select(&p, QuantumLayout::Gray),
        SampleReader::Unpacked10 {
            offsets: [2, 12, 22]
        }
    );
    let p = p.endian(Endian::Lsb);
    assert_eq!(
        SampleReader::select(&p, QuantumLayout::Gray),
        SampleReader::Unpacked10 {
            offsets: [22, 12, 2]
        }
    );
    let p = QuantumProfile {
        word: PackWord::Long,
        ..QuantumProfile::with_depth(10)
    };
    assert_eq!(
        SampleReader::select(&p, QuantumLayout::Rgb),
        SampleReader::PackedWord { depth: 10 }
    );
}

#[test]
fn sixteen_bit_respects_endian_and_sign() {
    let p = QuantumProfile::with_depth(16).endian(Endian::Msb);
    let v = stream_values(&[0x12, 0x34], &p, QuantumLayout::Gray, 1);
    assert_eq!(v[0].value, f64::from(0x1234u16));

    let p = QuantumProfile::with_depth(16).endian(Endian::Lsb);
    let v = stream_values(&[0x12, 0x34], &p, QuantumLayout::Gray, 1);
    assert_eq!(v[0].value, f64::from(0x3412u16));

    let p = QuantumProfile::with_depth(16)
        .endian(Endian::Lsb)
        .format(QuantumFormat::Signed);
    // -32768 maps to 0, 0 maps to mid-scale.
    let v = stream_values(&[0x00, 0x80, 0x00, 0x00], &p, QuantumLayout::Gray, 2);
    assert_eq!(v[0].value, 0.0);
    assert_eq!(v[1].value, 32768.0);
}

#[test]
fn float_samples_apply_minimum_and_scale() {
    let p = QuantumProfile {
        minimum: 0.5,
        scale: 2.0 * QUANTUM_RANGE,
        ..QuantumProfile::with_depth(32)
            .endian(Endian::Lsb)
            .format(QuantumFormat::FloatingPoint)
    };
    let buf = 0.75f32.to_le_bytes();
    let v = stream_values(&buf, &p, QuantumLayout::Gray, 1);
    assert_eq!(v[0].value, QUANTUM_RANGE * 0.5);

    let p = QuantumProfile::with_depth(64)
        .endian(Endian::Msb)
        .format(QuantumFormat::FloatingPoint);
    let buf = 0.25f64.to_be_bytes();
    let v = stream_values(&buf, &p, QuantumLayout::Gray, 1);
    assert_eq!(v[0].value, QUANTUM_RANGE * 0.25);
}

#[test]
fn half_float_ignores_scale() {
    let p = QuantumProfile {
        scale: 3.0,
        ..QuantumProfile::with_depth(16)
            .endian(Endian::Lsb)
            .format(QuantumFormat::FloatingPoint)
    };
    let one = half::f16::from_f32(1.0).to_bits().to_le_bytes();
    let v = stream_values(&one, &p, QuantumLayout::Gray, 1);
    assert_eq!(v[0].value, QUANTUM_RANGE);
    assert_eq!(v[0].raw, 65535);
}

#[test]
fn unpacked_ten_bit_walks_three_per_word() {
    let word: u32 = (1023 << 22) | (512 << 12) | (1 << 2);
    let mut buf = word.to_le_bytes().to_vec();
    buf.extend_from_slice(&(1023u32 << 22).to_le_bytes());
    let p = QuantumProfile {
        pack: false,
        ..QuantumProfile::with_depth(10).endian(Endian::Lsb)
    };
    let v = stream_values(&buf, &p, QuantumLayout::Rgba, 4);
    assert_eq!(v[0].raw, 1023);
    assert_eq!(v[1].raw, 512);
    assert_eq!(v[2].raw, 1);
    assert_eq!(v[3].raw, 1023);
    assert_eq!(v[0].value, QUANTUM_RANGE);
}

#[test]
fn unpacked_twelve_bit_uses_high_bits() {
    let p = QuantumProfile {
        pack: false,
        ..QuantumProfile::with_depth(12).endian(Endian::Msb)
    };
    let v = stream_values(&[0xff, 0xf0], &p, QuantumLayout::Gray, 1);
    assert_eq!(v[0].raw, 4095);
    assert_eq!(v[0].value, QUANTUM_RANGE);
}

#[test]
fn cursor_reports_truncation() {
    let mut c = ByteCursor::new(&[1, 2, 3]);
    assert!(c.u16(Endian::Lsb).is_ok());
    let err = c.u16(Endian::Lsb).unwrap_err();
    assert!(matches!(
        err,
        PixelError::TruncatedInput {
            needed: 4,
            available: 3
        }
    ));
    assert_eq!(c.position(), 2);
    assert!(c.skip(2).is_err());
    assert!(c.skip(1).is_ok());
}
