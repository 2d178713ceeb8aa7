//! Sigstore bundle v0.2 assembly — the final wire artifact a registry's
//! own Sigstore verification library checks.
//!
//! Every hex string Rekor hands back (`logId`, the inclusion proof's
//! root hash and node hashes) has to be re-encoded to base64 here; the
//! bundle schema never carries hex.

use crate::error::{Error, Result};
use crate::rekor::RekorLogEntry;

const BUNDLE_MEDIA_TYPE: &str = "application/vnd.dev.sigstore.bundle+json;version=0.2";

fn hex_to_base64(value: &str) -> Result<String> {
    let bytes = hex::decode(value).map_err(|err| Error::MalformedResponse(format!("not valid hex: {err}")))?;
    Ok(keyless_utils::b64::encode(&bytes))
}

/// Assemble the bundle JSON. `dsse_envelope` should already have its
/// `publicKey` field omitted — the certificate travels separately under
/// `verificationMaterial`.
pub fn assemble(cert_pem: &str, dsse_envelope: serde_json::Value, entry: &RekorLogEntry) -> Result<String> {
    let cert_der = keyless_utils::pem::extract_der(cert_pem, "CERTIFICATE")?;
    let cert_b64 = keyless_utils::b64::encode(&cert_der);
    let log_id_b64 = hex_to_base64(&entry.log_id)?;

    let mut tlog_entry = serde_json::json!({
        "logIndex": entry.log_index.to_string(),
        "logId": {"keyId": log_id_b64},
        "kindVersion": {"kind": "intoto", "version": "0.0.2"},
        "integratedTime": entry.integrated_time.to_string(),
        "inclusionPromise": {"signedEntryTimestamp": entry.signed_entry_timestamp},
        "canonicalizedBody": entry.body,
    });

    if let Some(proof) = &entry.inclusion_proof {
        let root_hash_b64 = hex_to_base64(&proof.root_hash)?;
        let hashes_b64 = proof.hashes.iter().map(|h| hex_to_base64(h)).collect::<Result<Vec<_>>>()?;

        tlog_entry["inclusionProof"] = serde_json::json!({
            "logIndex": proof.log_index.to_string(),
            "rootHash": root_hash_b64,
            "treeSize": proof.tree_size.to_string(),
            "hashes": hashes_b64,
            "checkpoint": {"envelope": proof.checkpoint.envelope},
        });
    }

    let bundle = serde_json::json!({
        "mediaType": BUNDLE_MEDIA_TYPE,
        "verificationMaterial": {
            "x509CertificateChain": {"certificates": [{"rawBytes": cert_b64}]},
            "tlogEntries": [tlog_entry],
            "timestampVerificationData": {"rfc3161Timestamps": []},
        },
        "dsseEnvelope": dsse_envelope,
    });

    Ok(serde_json::to_string(&bundle)?)
}

#[cfg(test)]
#[path = "./bundle.test.rs"]
mod tests;
