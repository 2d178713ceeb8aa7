//! Fulcio client: ephemeral ECDSA-P256 keypair, proof-of-possession, and
//! the signing-certificate request.

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use p256::pkcs8::AssociatedOid;
use ring::rand::SecureRandom;
use serde::Serialize;
use spki::der::asn1::BitStringRef;
use spki::der::pem::LineEnding;
use spki::der::EncodePem;
use spki::{AlgorithmIdentifier, SubjectPublicKeyInfoRef};

use crate::error::{Error, Result};

/// An ephemeral signing keypair, good for one publish only.
pub struct EphemeralKeypair {
    signing_key: SigningKey,
    pub public_key_pem: String,
}

impl EphemeralKeypair {
    pub fn generate() -> Result<Self> {
        let rng = ring::rand::SystemRandom::new();
        let mut seed = [0u8; 32];
        rng.fill(&mut seed).map_err(|_| Error::InvalidSignature)?;

        let signing_key = SigningKey::from_slice(&seed).map_err(|_| Error::InvalidSignature)?;
        let public_key_pem = encode_public_key_pem(&signing_key)?;

        Ok(EphemeralKeypair { signing_key, public_key_pem })
    }

    /// DER-encoded ECDSA signature over `message`: sign to raw `r||s`
    /// first, then re-encode through the same canonicalization path used
    /// for the SLSA/DSSE signature, so there's exactly one DER encoder in
    /// this codebase.
    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signature: Signature = self.signing_key.sign(message);
        let raw: [u8; 64] = signature.to_bytes().into();
        Ok(keyless_utils::der::raw_to_der(&raw)?)
    }
}

/// Build the SPKI PEM for an ephemeral public key the same way Fulcio's
/// callers build it for an ECDSA key: a raw, hand-assembled
/// `SubjectPublicKeyInfo` rather than a pulled-in PKCS#8 encoder, since
/// the shape (OID + SEC1 point) is fixed and tiny.
fn encode_public_key_pem(signing_key: &SigningKey) -> Result<String> {
    let point = signing_key.verifying_key().to_encoded_point(false);

    let algorithm = AlgorithmIdentifier {
        oid: p256::elliptic_curve::ALGORITHM_OID,
        parameters: Some((&p256::NistP256::OID).into()),
    };
    let spki = SubjectPublicKeyInfoRef {
        algorithm,
        subject_public_key: BitStringRef::from_bytes(point.as_bytes()).map_err(|_| Error::InvalidSignature)?,
    };

    spki.to_pem(LineEnding::LF).map_err(|_| Error::InvalidSignature)
}

/// Pull the `sub` claim out of a JWT by decoding the payload segment
/// directly, without running full validation — Fulcio's proof of
/// possession only needs the subject, and by the time we get here the
/// token has already been validated for the purpose it was fetched for.
pub fn extract_jwt_subject(token: &str) -> Result<String> {
    let payload_b64 =
        token.split('.').nth(1).ok_or_else(|| Error::InvalidToken("expected three segments".to_string()))?;
    let payload_bytes = keyless_utils::b64::decode_url_no_pad(payload_b64.as_bytes())
        .map_err(|_| Error::InvalidToken("bad base64url payload".to_string()))?;
    let value: serde_json::Value = serde_json::from_slice(&payload_bytes)?;

    value.get("sub").and_then(|v| v.as_str()).map(str::to_string).ok_or_else(|| Error::MissingClaims("sub".to_string()))
}

#[derive(Serialize)]
struct Credentials<'a> {
    #[serde(rename = "oidcIdentityToken")]
    oidc_identity_token: &'a str,
}

#[derive(Serialize)]
struct PublicKeyField<'a> {
    algorithm: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct PublicKeyRequest<'a> {
    #[serde(rename = "publicKey")]
    public_key: PublicKeyField<'a>,
    #[serde(rename = "proofOfPossession")]
    proof_of_possession: &'a str,
}

#[derive(Serialize)]
struct SigningCertRequest<'a> {
    credentials: Credentials<'a>,
    #[serde(rename = "publicKeyRequest")]
    public_key_request: PublicKeyRequest<'a>,
}

/// Request a short-lived signing certificate binding `keypair`'s public
/// key to the identity carried by `oidc_token` (a sigstore-audience
/// token). Returns the full PEM certificate chain as Fulcio sent it.
pub async fn create_signing_certificate(
    client: &reqwest::Client,
    base_url: &str,
    oidc_token: &str,
    keypair: &EphemeralKeypair,
) -> Result<String> {
    let subject = extract_jwt_subject(oidc_token)?;
    let proof = keypair.sign(subject.as_bytes())?;
    let proof_b64 = keyless_utils::b64::encode(&proof);

    // `serde_json` already JSON-escapes the newlines in this string when it
    // serializes the request body below; escaping them here first would
    // double-escape them and send Fulcio a PEM full of literal `\n` text.
    let body = SigningCertRequest {
        credentials: Credentials { oidc_identity_token: oidc_token },
        public_key_request: PublicKeyRequest {
            public_key: PublicKeyField { algorithm: "ECDSA", content: &keypair.public_key_pem },
            proof_of_possession: &proof_b64,
        },
    };

    let url = format!("{base_url}/api/v2/signingCert");
    let response = client
        .post(&url)
        .header("Content-Type", "application/json")
        .header("Accept", "application/pem-certificate-chain")
        .json(&body)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(Error::FulcioCertificateRequestFailed(response.status().as_u16()));
    }

    let raw_body = response.text().await?;
    Ok(keyless_utils::pem::unescape_literal_newlines(&raw_body))
}

/// Extract the first certificate block (markers included) from a PEM
/// chain, e.g. the one `create_signing_certificate` returns.
pub fn first_certificate(chain_pem: &str) -> Result<String> {
    Ok(keyless_utils::pem::extract_block(chain_pem, "CERTIFICATE")?)
}

#[cfg(test)]
#[path = "./fulcio.test.rs"]
mod tests;
