use rstest::rstest;

use crate::der::{der_to_raw, raw_to_der};

#[test]
fn round_trips_raw_signature_through_der() {
    let mut raw = [0u8; 64];
    for (i, byte) in raw.iter_mut().enumerate() {
        *byte = i as u8;
    }

    let der = raw_to_der(&raw).unwrap();
    let back = der_to_raw(&der).unwrap();
    assert_eq!(raw, back);
}

fn repeated(byte: u8) -> [u8; 32] {
    [byte; 32]
}

#[rstest]
// high bit set in the first byte of r -> sign-guard zero must appear
#[case(repeated(0x80), repeated(0x01))]
// no high bit set -> no leading zero at all
#[case(repeated(0x7f), repeated(0x01))]
// leading zero bytes in the input that aren't needed for sign must be stripped
#[case({ let mut r = [0u8; 32]; r[2] = 0x01; r }, repeated(0x02))]
fn der_has_no_spurious_leading_zero_bytes(#[case] r: [u8; 32], #[case] s: [u8; 32]) {
    let mut raw = [0u8; 64];
    raw[0..32].copy_from_slice(&r);
    raw[32..64].copy_from_slice(&s);

    let der = raw_to_der(&raw).unwrap();

    // Locate each INTEGER's value bytes and check the "no leading zero
    // unless sign-guard" invariant.
    let mut pos = 2; // skip SEQUENCE tag + short-form length
    for _ in 0..2 {
        assert_eq!(der[pos], 0x02);
        pos += 1;
        let len = der[pos] as usize;
        pos += 1;
        let value = &der[pos..pos + len];
        if value.len() > 1 {
            assert!(
                !(value[0] == 0x00 && value[1] & 0x80 == 0),
                "spurious leading zero byte in DER integer: {:?}",
                value
            );
        }
        pos += len;
    }
}

#[test]
fn rejects_wrong_length_input() {
    assert!(raw_to_der(&[0u8; 63]).is_err());
    assert!(raw_to_der(&[0u8; 65]).is_err());
}

#[test]
fn rejects_malformed_der() {
    assert!(der_to_raw(&[0x02, 0x01, 0x00]).is_err());
    assert!(der_to_raw(&[]).is_err());
}
