use p256::ecdsa::signature::Verifier;

use crate::fulcio::{extract_jwt_subject, first_certificate, EphemeralKeypair};

/// Pull the SEC1 point back out of the hand-assembled SPKI DER
/// `EphemeralKeypair` produces. The SPKI's BIT STRING always holds exactly
/// the 65-byte uncompressed point (`04 || x || y`) for a P-256 key, so its
/// last 65 bytes are the point regardless of the ASN.1 framing in front of
/// it.
fn verifying_key_from_pem(pem: &str) -> p256::ecdsa::VerifyingKey {
    let der = keyless_utils::pem::extract_der(pem, "PUBLIC KEY").unwrap();
    let point = &der[der.len() - 65..];
    p256::ecdsa::VerifyingKey::from_sec1_bytes(point).unwrap()
}

fn token_with_subject(sub: &str) -> String {
    let header = base64::Engine::encode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        serde_json::to_vec(&serde_json::json!({"alg": "ES256"})).unwrap(),
    );
    let payload = base64::Engine::encode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        serde_json::to_vec(&serde_json::json!({"sub": sub, "iss": "issuer"})).unwrap(),
    );
    format!("{header}.{payload}.signature")
}

#[test]
fn extracts_subject_from_payload_segment() {
    let token = token_with_subject("repo:owner/name:ref:refs/heads/main");
    assert_eq!(extract_jwt_subject(&token).unwrap(), "repo:owner/name:ref:refs/heads/main");
}

#[test]
fn missing_sub_claim_is_an_error() {
    let header = base64::Engine::encode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        serde_json::to_vec(&serde_json::json!({"alg": "ES256"})).unwrap(),
    );
    let payload = base64::Engine::encode(
        &base64::engine::general_purpose::URL_SAFE_NO_PAD,
        serde_json::to_vec(&serde_json::json!({"iss": "issuer"})).unwrap(),
    );
    let token = format!("{header}.{payload}.sig");
    assert!(extract_jwt_subject(&token).is_err());
}

#[test]
fn generated_keypair_public_key_is_pem_encoded() {
    let keypair = EphemeralKeypair::generate().unwrap();
    assert!(keypair.public_key_pem.starts_with("-----BEGIN PUBLIC KEY-----"));
}

#[test]
fn signature_verifies_against_the_keypairs_own_public_key() {
    let keypair = EphemeralKeypair::generate().unwrap();
    let message = b"repo:owner/name:ref:refs/heads/main";
    let der_signature = keypair.sign(message).unwrap();

    let verifying_key = verifying_key_from_pem(&keypair.public_key_pem);
    let signature = p256::ecdsa::Signature::from_der(&der_signature).unwrap();
    assert!(verifying_key.verify(message, &signature).is_ok());
}

#[test]
fn tampered_message_fails_verification() {
    let keypair = EphemeralKeypair::generate().unwrap();
    let der_signature = keypair.sign(b"original").unwrap();

    let verifying_key = verifying_key_from_pem(&keypair.public_key_pem);
    let signature = p256::ecdsa::Signature::from_der(&der_signature).unwrap();
    assert!(verifying_key.verify(b"different", &signature).is_err());
}

#[test]
fn first_certificate_extracts_only_the_leaf_block() {
    let chain = "-----BEGIN CERTIFICATE-----\nLEAF\n-----END CERTIFICATE-----\n-----BEGIN CERTIFICATE-----\nINTERMEDIATE\n-----END CERTIFICATE-----\n";
    let leaf = first_certificate(chain).unwrap();
    assert_eq!(leaf, "-----BEGIN CERTIFICATE-----\nLEAF\n-----END CERTIFICATE-----");
}
