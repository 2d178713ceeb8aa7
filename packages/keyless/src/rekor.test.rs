use pretty_assertions::assert_eq;

use crate::rekor::build_intoto_entry;

#[test]
fn payload_and_signature_are_double_base64_encoded() {
    let envelope = r#"{"payload":"cGF5bG9hZA==","payloadType":"application/vnd.in-toto+json","signatures":[]}"#;
    let raw_payload = b"the raw SLSA statement bytes";
    let raw_signature = b"a fake DER signature";
    let cert_pem = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";

    let entry = build_intoto_entry(envelope, cert_pem, raw_payload, raw_signature);
    let content = &entry["spec"]["content"];

    let expected_payload = base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, raw_payload),
    );
    assert_eq!(content["payload"], expected_payload);

    let expected_sig = base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, raw_signature),
    );
    assert_eq!(content["signatures"][0]["sig"], expected_sig);
}

#[test]
fn public_key_is_single_base64_of_the_pem_text() {
    let cert_pem = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";
    let entry = build_intoto_entry("{}", cert_pem, b"payload", b"sig");

    let expected = base64::Engine::encode(&base64::engine::general_purpose::STANDARD, cert_pem.as_bytes());
    assert_eq!(entry["spec"]["content"]["signatures"][0]["publicKey"], expected);
}

#[test]
fn hash_is_sha256_of_the_envelope_and_payload_hash_is_sha256_of_the_payload() {
    let envelope = r#"{"payload":"x"}"#;
    let raw_payload = b"statement bytes";
    let entry = build_intoto_entry(envelope, "cert", raw_payload, b"sig");

    let expected_hash = keyless_utils::hash::Sha256Digest::new(envelope.as_bytes()).to_hex();
    let expected_payload_hash = keyless_utils::hash::Sha256Digest::new(raw_payload).to_hex();

    assert_eq!(entry["spec"]["content"]["hash"]["value"], expected_hash);
    assert_eq!(entry["spec"]["content"]["hash"]["algorithm"], "sha256");
    assert_eq!(entry["spec"]["content"]["payloadHash"]["value"], expected_payload_hash);
}

#[test]
fn entry_kind_and_api_version_are_fixed() {
    let entry = build_intoto_entry("{}", "cert", b"p", b"s");
    assert_eq!(entry["kind"], "intoto");
    assert_eq!(entry["apiVersion"], "0.0.2");
}
