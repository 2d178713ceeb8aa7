//! Ed25519 keypair generation and package-tarball signing.
//!
//! This is the "bring your own key" side channel: a maintainer can sign a
//! tarball with a long-lived Ed25519 key instead of (or in addition to)
//! going through the keyless OIDC/Fulcio/Rekor pipeline. A registry that
//! trusts the key accepts the signature directly.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use ring::rand::SecureRandom;
use ring::signature::KeyPair;
use spki::der::asn1::BitStringRef;
use spki::der::pem::LineEnding;
use spki::der::EncodePem;
use spki::{AlgorithmIdentifierRef, ObjectIdentifier, SubjectPublicKeyInfoRef};
use thiserror::Error;

use keyless_utils::hash::Sha256Digest;

const ED25519_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.101.112");
const SEED_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum KeyringError {
    #[error("failed to generate random seed")]
    RandomGeneration,

    #[error("failed to encode public key as SPKI PEM")]
    Encoding,

    #[error("malformed signing seed, expected {SEED_LEN} bytes, got {0}")]
    MalformedSeed(usize),

    #[error("no key found in keyring for key_id {0}")]
    UnknownKey(String),

    #[error("failed to parse public key PEM ({0})")]
    Pem(#[from] keyless_utils::pem::PemError),

    #[error("signature verification failed")]
    VerificationFailed,
}

/// A freshly minted Ed25519 keypair, ready to be persisted by the caller.
pub struct GeneratedKey {
    pub public_pem: String,
    pub private_seed: [u8; SEED_LEN],
    pub key_id: String,
}

/// Generate a new Ed25519 signing keypair.
///
/// The `key_id` is the upper 64 bits of the SHA-256 digest of the raw
/// public key bytes, rendered as 16 lowercase hex characters — short
/// enough to put in a header, unique enough in practice to index a
/// keyring by.
pub fn generate() -> Result<GeneratedKey, KeyringError> {
    let rng = ring::rand::SystemRandom::new();
    let mut seed = [0u8; SEED_LEN];
    rng.fill(&mut seed).map_err(|_| KeyringError::RandomGeneration)?;

    let keypair = ring::signature::Ed25519KeyPair::from_seed_unchecked(&seed)
        .map_err(|_| KeyringError::RandomGeneration)?;
    let public = keypair.public_key().as_ref();

    Ok(GeneratedKey {
        public_pem: encode_public_key_pem(public)?,
        private_seed: seed,
        key_id: key_id_for(public),
    })
}

fn encode_public_key_pem(public: &[u8]) -> Result<String, KeyringError> {
    let algorithm = AlgorithmIdentifierRef { oid: ED25519_OID, parameters: None };
    let subject_public_key = BitStringRef::from_bytes(public).map_err(|_| KeyringError::Encoding)?;
    let spki = SubjectPublicKeyInfoRef { algorithm, subject_public_key };

    spki.to_pem(LineEnding::LF).map_err(|_| KeyringError::Encoding)
}

fn key_id_for(public: &[u8]) -> String {
    let digest = Sha256Digest::new(public);
    hex::encode(&digest.raw()[..8])
}

/// A signature over a package tarball, ready to be attached to a publish
/// request.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PackageSignature {
    pub algorithm: String,
    pub signature: String,
    pub key_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_url: Option<String>,
}

impl PackageSignature {
    pub fn with_key_url(mut self, key_url: impl Into<String>) -> Self {
        self.key_url = Some(key_url.into());
        self
    }
}

/// Sign `data` (typically a tarball's raw bytes, or its digest) with the
/// given raw 32-byte seed.
pub fn sign(data: &[u8], seed: &[u8]) -> Result<PackageSignature, KeyringError> {
    if seed.len() != SEED_LEN {
        return Err(KeyringError::MalformedSeed(seed.len()));
    }

    let keypair = ring::signature::Ed25519KeyPair::from_seed_unchecked(seed)
        .map_err(|_| KeyringError::MalformedSeed(seed.len()))?;
    let public = keypair.public_key().as_ref();
    let signature = keypair.sign(data);

    Ok(PackageSignature {
        algorithm: "ed25519".to_string(),
        signature: base64::Engine::encode(&base64::engine::general_purpose::STANDARD, signature.as_ref()),
        key_id: key_id_for(public),
        timestamp: Utc::now(),
        key_url: None,
    })
}

/// Verify `signature` over `data` against the public key registered in
/// `keyring` under the signature's `key_id`.
pub fn verify(data: &[u8], signature: &PackageSignature, keyring: &Keyring) -> Result<(), KeyringError> {
    let pem = keyring.get(&signature.key_id).ok_or_else(|| KeyringError::UnknownKey(signature.key_id.clone()))?;
    let decoded = keyless_utils::pem::extract_der(pem, "PUBLIC KEY")?;

    // Some keyrings store a raw 32-byte Ed25519 key rather than a full
    // SPKI-wrapped one; either way the last 32 bytes are the key.
    if decoded.len() < SEED_LEN {
        return Err(KeyringError::VerificationFailed);
    }
    let raw_public = &decoded[decoded.len() - SEED_LEN..];

    let signature_bytes = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, &signature.signature)
        .map_err(|_| KeyringError::VerificationFailed)?;

    let public_key = ring::signature::UnparsedPublicKey::new(&ring::signature::ED25519, raw_public);
    public_key.verify(data, &signature_bytes).map_err(|_| KeyringError::VerificationFailed)
}

/// A mapping of `key_id` to the PEM-encoded public key it identifies.
#[derive(Debug, Clone, Default)]
pub struct Keyring {
    keys: HashMap<String, String>,
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key_id: impl Into<String>, public_pem: impl Into<String>) {
        self.keys.insert(key_id.into(), public_pem.into());
    }

    pub fn get(&self, key_id: &str) -> Option<&str> {
        self.keys.get(key_id).map(String::as_str)
    }

    pub fn remove(&mut self, key_id: &str) -> Option<String> {
        self.keys.remove(key_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
#[path = "./lib.test.rs"]
mod tests;
