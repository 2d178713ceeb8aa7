//! Rekor transparency-log client: build a canonical `intoto` v0.0.2
//! entry, submit it, and pick up its inclusion proof.
//!
//! This is the hardest wire-compatibility surface in the pipeline: the
//! `payload` and `signatures[0].sig` fields are double-base64, while
//! `signatures[0].publicKey` is single-base64 of the certificate PEM
//! text itself. Getting any of these wrong produces an entry Rekor
//! accepts but no verifier can check.

use serde::Deserialize;

use crate::error::{Error, Result};

/// Build the `intoto` v0.0.2 entry body to submit to Rekor.
///
/// `canonical_envelope_json` is the exact DSSE envelope bytes as signed
/// (used only to compute `hash.value`); `raw_payload` is the SLSA
/// statement exactly as signed; `raw_signature_der` is the DER-encoded
/// ECDSA signature over the PAE of that payload.
pub fn build_intoto_entry(
    canonical_envelope_json: &str,
    cert_pem: &str,
    raw_payload: &[u8],
    raw_signature_der: &[u8],
) -> serde_json::Value {
    let payload_b64 = keyless_utils::b64::encode_double(raw_payload);
    let sig_b64 = keyless_utils::b64::encode_double(raw_signature_der);
    let public_key_b64 = keyless_utils::b64::encode(cert_pem.as_bytes());

    let hash_value = keyless_utils::hash::Sha256Digest::new(canonical_envelope_json.as_bytes()).to_hex();
    let payload_hash_value = keyless_utils::hash::Sha256Digest::new(raw_payload).to_hex();

    serde_json::json!({
        "apiVersion": "0.0.2",
        "kind": "intoto",
        "spec": {
            "content": {
                "hash": {"algorithm": "sha256", "value": hash_value},
                "payloadHash": {"algorithm": "sha256", "value": payload_hash_value},
                "payload": payload_b64,
                "payloadType": "application/vnd.in-toto+json",
                "signatures": [{"sig": sig_b64, "publicKey": public_key_b64}],
            }
        }
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct InclusionProof {
    #[serde(rename = "logIndex")]
    pub log_index: u64,
    #[serde(rename = "rootHash")]
    pub root_hash: String,
    #[serde(rename = "treeSize")]
    pub tree_size: u64,
    pub hashes: Vec<String>,
    pub checkpoint: Checkpoint,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Checkpoint {
    pub envelope: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Verification {
    #[serde(rename = "signedEntryTimestamp")]
    signed_entry_timestamp: String,
    #[serde(rename = "inclusionProof")]
    inclusion_proof: Option<InclusionProof>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    #[serde(rename = "logIndex")]
    log_index: u64,
    #[serde(rename = "integratedTime")]
    integrated_time: i64,
    #[serde(rename = "logID")]
    log_id: String,
    verification: Verification,
    body: String,
}

/// A fully- (or partially-) populated Rekor log entry.
#[derive(Debug, Clone)]
pub struct RekorLogEntry {
    pub uuid: String,
    pub log_index: u64,
    pub integrated_time: i64,
    pub log_id: String,
    pub signed_entry_timestamp: String,
    pub inclusion_proof: Option<InclusionProof>,
    pub body: String,
}

impl RekorLogEntry {
    fn from_raw(uuid: String, raw: RawEntry) -> Self {
        RekorLogEntry {
            uuid,
            log_index: raw.log_index,
            integrated_time: raw.integrated_time,
            log_id: raw.log_id,
            signed_entry_timestamp: raw.verification.signed_entry_timestamp,
            inclusion_proof: raw.verification.inclusion_proof,
            body: raw.body,
        }
    }
}

fn parse_single_entry(body: &serde_json::Value) -> Result<RekorLogEntry> {
    let obj = body.as_object().ok_or_else(|| Error::MalformedResponse("expected a JSON object".to_string()))?;
    let (uuid, entry_value) =
        obj.iter().next().ok_or_else(|| Error::MalformedResponse("empty Rekor response".to_string()))?;

    let raw: RawEntry = serde_json::from_value(entry_value.clone())?;
    Ok(RekorLogEntry::from_raw(uuid.clone(), raw))
}

pub async fn submit(client: &reqwest::Client, base_url: &str, entry_body: &serde_json::Value) -> Result<RekorLogEntry> {
    let url = format!("{base_url}/api/v1/log/entries");
    let response = client.post(&url).header("Content-Type", "application/json").json(entry_body).send().await?;

    if !response.status().is_success() {
        return Err(Error::RekorSubmissionFailed(response.status().as_u16()));
    }

    let value: serde_json::Value = response.json().await?;
    parse_single_entry(&value)
}

pub async fn fetch_entry(client: &reqwest::Client, base_url: &str, uuid: &str) -> Result<RekorLogEntry> {
    let url = format!("{base_url}/api/v1/log/entries/{uuid}");
    let response = client.get(&url).send().await?;

    if !response.status().is_success() {
        return Err(Error::RekorFetchFailed(response.status().as_u16()));
    }

    let value: serde_json::Value = response.json().await?;
    parse_single_entry(&value)
}

/// Submit the entry; if the response has no inclusion proof yet (common
/// on a fresh POST) follow up with one GET. If that GET also comes back
/// without a proof, log a warning and return what we have — fabricating
/// one would silently produce an unverifiable bundle.
pub async fn submit_and_await_inclusion(
    client: &reqwest::Client,
    base_url: &str,
    entry_body: &serde_json::Value,
) -> Result<RekorLogEntry> {
    let entry = submit(client, base_url, entry_body).await?;
    if entry.inclusion_proof.is_some() {
        return Ok(entry);
    }

    match fetch_entry(client, base_url, &entry.uuid).await {
        Ok(refetched) if refetched.inclusion_proof.is_some() => Ok(refetched),
        Ok(refetched) => {
            log::warn!("Rekor entry {} has no inclusion proof even after a follow-up GET", entry.uuid);
            Ok(refetched)
        }
        Err(err) => {
            log::warn!("Rekor inclusion-proof follow-up GET for {} failed: {err}", entry.uuid);
            Ok(entry)
        }
    }
}

#[cfg(test)]
#[path = "./rekor.test.rs"]
mod tests;
