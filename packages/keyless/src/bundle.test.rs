use pretty_assertions::assert_eq;

use super::*;
use crate::rekor::{Checkpoint, InclusionProof, RekorLogEntry};

const FAKE_CERT_PEM: &str = "-----BEGIN CERTIFICATE-----\nAAAA\n-----END CERTIFICATE-----\n";

fn entry_without_proof() -> RekorLogEntry {
    RekorLogEntry {
        uuid: "uuid-1".to_string(),
        log_index: 42,
        integrated_time: 1700000000,
        log_id: "deadbeef".to_string(),
        signed_entry_timestamp: "set-value".to_string(),
        inclusion_proof: None,
        body: "opaque-body".to_string(),
    }
}

fn entry_with_proof() -> RekorLogEntry {
    RekorLogEntry {
        inclusion_proof: Some(InclusionProof {
            log_index: 42,
            root_hash: "cafe".to_string(),
            tree_size: 10,
            hashes: vec!["face".to_string(), "babe".to_string()],
            checkpoint: Checkpoint { envelope: "line one\nline two\n".to_string() },
        }),
        ..entry_without_proof()
    }
}

#[test]
fn hex_fields_are_re_encoded_to_base64_not_left_as_hex() {
    let envelope = serde_json::json!({"payload": "p", "payloadType": "t", "signatures": []});
    let json = assemble(FAKE_CERT_PEM, envelope, &entry_with_proof()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let key_id = value["verificationMaterial"]["tlogEntries"][0]["logId"]["keyId"].as_str().unwrap();
    assert_eq!(key_id, keyless_utils::b64::encode(hex::decode("deadbeef").unwrap()));
    assert_ne!(key_id, "deadbeef");
}

#[test]
fn numeric_fields_are_emitted_as_json_strings() {
    let envelope = serde_json::json!({});
    let json = assemble(FAKE_CERT_PEM, envelope, &entry_without_proof()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(value["verificationMaterial"]["tlogEntries"][0]["logIndex"].is_string());
    assert_eq!(value["verificationMaterial"]["tlogEntries"][0]["logIndex"], "42");
}

#[test]
fn missing_inclusion_proof_is_omitted_rather_than_null() {
    let envelope = serde_json::json!({});
    let json = assemble(FAKE_CERT_PEM, envelope, &entry_without_proof()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value["verificationMaterial"]["tlogEntries"][0].get("inclusionProof").is_none());
}

#[test]
fn checkpoint_envelope_newlines_survive_round_trip() {
    let envelope = serde_json::json!({});
    let json = assemble(FAKE_CERT_PEM, envelope, &entry_with_proof()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let checkpoint =
        value["verificationMaterial"]["tlogEntries"][0]["inclusionProof"]["checkpoint"]["envelope"].as_str().unwrap();
    assert_eq!(checkpoint, "line one\nline two\n");
}

#[test]
fn media_type_is_the_fixed_bundle_v0_2_string() {
    let envelope = serde_json::json!({});
    let json = assemble(FAKE_CERT_PEM, envelope, &entry_without_proof()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["mediaType"], "application/vnd.dev.sigstore.bundle+json;version=0.2");
}

#[test]
fn invalid_hex_from_rekor_is_a_malformed_response_error() {
    let mut entry = entry_without_proof();
    entry.log_id = "not-hex!!".to_string();
    let envelope = serde_json::json!({});
    assert!(assemble(FAKE_CERT_PEM, envelope, &entry).is_err());
}
