//! DSSE (Dead Simple Signing Envelope) assembly: pre-authentication
//! encoding and envelope construction.
//!
//! The envelope is built twice per publish with two different shapes:
//! once with `publicKey` set (the copy that goes into the Rekor `intoto`
//! entry, where Rekor requires the field even though it isn't part of
//! the DSSE spec proper) and once without it (the copy embedded in the
//! final Sigstore bundle, where the certificate already travels in
//! `verificationMaterial`). Both are built here so there's exactly one
//! place that knows the envelope's JSON shape.

use crate::error::Result;

pub const INTOTO_PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";
const PAE_PREFIX: &str = "DSSEv1";

/// DSSE pre-authentication encoding: the exact bytes that get signed.
/// <https://github.com/secure-systems-lab/dsse/blob/master/protocol.md#signature-definition>
pub fn pre_auth_encoding(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(PAE_PREFIX.len() + payload_type.len() + payload.len() + 32);
    out.extend_from_slice(PAE_PREFIX.as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload_type.len().to_string().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload_type.as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload.len().to_string().as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload);
    out
}

/// Build the envelope as a JSON value. `public_key_b64` is the
/// single-base64-encoded certificate PEM text, present only when this
/// envelope is destined for Rekor.
pub fn build_envelope_value(
    payload_type: &str,
    raw_payload: &[u8],
    signature_der: &[u8],
    public_key_b64: Option<&str>,
) -> serde_json::Value {
    let mut signature = serde_json::json!({
        "keyid": "",
        "sig": keyless_utils::b64::encode(signature_der),
    });

    if let Some(public_key) = public_key_b64 {
        signature["publicKey"] = serde_json::Value::String(public_key.to_string());
    }

    serde_json::json!({
        "payload": keyless_utils::b64::encode(raw_payload),
        "payloadType": payload_type,
        "signatures": [signature],
    })
}

/// Same as [`build_envelope_value`], serialized to a compact JSON string
/// — the exact bytes whose SHA-256 becomes Rekor's `hash.value`.
pub fn canonical_json(
    payload_type: &str,
    raw_payload: &[u8],
    signature_der: &[u8],
    public_key_b64: Option<&str>,
) -> Result<String> {
    let value = build_envelope_value(payload_type, raw_payload, signature_der, public_key_b64);
    Ok(serde_json::to_string(&value)?)
}

#[cfg(test)]
#[path = "./dsse.test.rs"]
mod tests;
