use pretty_assertions::assert_eq;

use super::*;

#[test]
fn pre_auth_encoding_matches_the_dsse_protocol_grammar() {
    let pae = pre_auth_encoding("application/vnd.in-toto+json", b"hello");
    assert_eq!(pae, b"DSSEv1 29 application/vnd.in-toto+json 5 hello".to_vec());
}

#[test]
fn pre_auth_encoding_uses_decimal_ascii_lengths_not_byte_values() {
    let payload = vec![0u8; 128];
    let pae = pre_auth_encoding("x", &payload);
    let prefix = b"DSSEv1 1 x 128 ";
    assert_eq!(&pae[..prefix.len()], prefix);
    assert_eq!(pae.len(), prefix.len() + 128);
}

#[test]
fn envelope_without_public_key_omits_the_field_entirely() {
    let value = build_envelope_value(INTOTO_PAYLOAD_TYPE, b"{}", b"sig-bytes", None);
    assert!(value["signatures"][0].get("publicKey").is_none());
    assert_eq!(value["payloadType"], INTOTO_PAYLOAD_TYPE);
}

#[test]
fn envelope_with_public_key_carries_it_single_base64_encoded() {
    let value = build_envelope_value(INTOTO_PAYLOAD_TYPE, b"{}", b"sig-bytes", Some("cert-pem-b64"));
    assert_eq!(value["signatures"][0]["publicKey"], "cert-pem-b64");
}

#[test]
fn payload_and_signature_are_base64_not_raw_bytes() {
    let value = build_envelope_value(INTOTO_PAYLOAD_TYPE, b"hello", b"sig", None);
    assert_eq!(value["payload"], keyless_utils::b64::encode(b"hello"));
    assert_eq!(value["signatures"][0]["sig"], keyless_utils::b64::encode(b"sig"));
}

#[test]
fn keyid_is_always_the_empty_string() {
    let value = build_envelope_value(INTOTO_PAYLOAD_TYPE, b"{}", b"sig", None);
    assert_eq!(value["signatures"][0]["keyid"], "");
}

#[test]
fn canonical_json_round_trips_through_serde() {
    let json = canonical_json(INTOTO_PAYLOAD_TYPE, b"{}", b"sig", Some("pk")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["signatures"][0]["publicKey"], "pk");
}
