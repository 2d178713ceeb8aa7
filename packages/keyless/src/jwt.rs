//! JWT parsing and verification (RS256, ES256) plus JWKS fetch/caching.

use std::cell::RefCell;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use num::BigUint;
use serde::{Deserialize, Serialize};
use sha2::Digest;

use crate::error::{Error, Result};

const DIGEST_INFO_SHA256: [u8; 19] =
    [0x30, 0x31, 0x30, 0x0d, 0x06, 0x09, 0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01, 0x05, 0x00, 0x04, 0x20];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub typ: Option<String>,
}

/// The claims this pipeline cares about: the common registered claims
/// plus every provider-specific claim used to build a SLSA statement or
/// evaluate a trusted-publisher rule. Unknown/absent fields default to
/// `None` rather than failing decode — a GitLab token simply never
/// populates the GitHub-shaped fields and vice versa.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    #[serde(default)]
    pub nbf: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,
    #[serde(default)]
    pub repository_owner: Option<String>,
    #[serde(default)]
    pub repository_id: Option<String>,
    #[serde(default)]
    pub repository_owner_id: Option<String>,
    #[serde(default)]
    pub workflow_ref: Option<String>,
    #[serde(default)]
    pub job_workflow_ref: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(rename = "ref", default)]
    pub ref_: Option<String>,
    #[serde(default)]
    pub ref_type: Option<String>,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub run_attempt: Option<String>,
    #[serde(default)]
    pub runner_environment: Option<String>,

    #[serde(default)]
    pub namespace_path: Option<String>,
    #[serde(default)]
    pub namespace_id: Option<String>,
    #[serde(default)]
    pub project_path: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub pipeline_id: Option<String>,
    #[serde(default)]
    pub pipeline_source: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default, rename = "use")]
    pub use_: Option<String>,
    #[serde(default)]
    pub n: Option<String>,
    #[serde(default)]
    pub e: Option<String>,
    #[serde(default)]
    pub crv: Option<String>,
    #[serde(default)]
    pub x: Option<String>,
    #[serde(default)]
    pub y: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// A JWT that has passed full validation: issuer, signature and
/// expiration all checked.
#[derive(Debug, Clone)]
pub struct Token {
    raw: String,
    pub claims: Claims,
}

impl Token {
    pub fn raw(&self) -> &str {
        &self.raw
    }

    #[cfg(test)]
    pub(crate) fn for_test(raw: impl Into<String>, claims: Claims) -> Self {
        Token { raw: raw.into(), claims }
    }
}

fn b64url_decode(segment: &str) -> Result<Vec<u8>> {
    keyless_utils::b64::decode_url_no_pad(segment.as_bytes())
        .map_err(|_| Error::InvalidToken("bad base64url segment".to_string()))
}

fn split_token(token: &str) -> Result<(&str, &str, &str)> {
    let mut parts = token.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(Error::InvalidToken("expected exactly three segments".to_string()));
    };
    Ok((header, payload, signature))
}

pub fn parse_header(token: &str) -> Result<Header> {
    let (header_b64, _, _) = split_token(token)?;
    let header_bytes = b64url_decode(header_b64)?;
    Ok(serde_json::from_slice(&header_bytes)?)
}

/// Structural decode only — no signature, issuer or expiry checks.
pub fn decode_unsafe(token: &str) -> Result<Claims> {
    let (_, payload_b64, _) = split_token(token)?;
    let payload_bytes = b64url_decode(payload_b64)?;
    Ok(serde_json::from_slice(&payload_bytes)?)
}

fn select_key<'a>(header: &Header, jwks: &'a Jwks) -> Result<&'a Jwk> {
    if let Some(kid) = &header.kid {
        if let Some(key) = jwks.keys.iter().find(|k| k.kid.as_deref() == Some(kid.as_str())) {
            return Ok(key);
        }
    }

    if let Some(key) = jwks.keys.iter().find(|k| k.alg.as_deref() == Some(header.alg.as_str())) {
        return Ok(key);
    }

    if header.alg == "RS256" {
        if let Some(key) = jwks.keys.iter().find(|k| k.kty == "RSA") {
            return Ok(key);
        }
    }

    Err(Error::InvalidJWKS("no matching key".to_string()))
}

fn verify_rs256(signed_input: &[u8], signature: &[u8], jwk: &Jwk) -> Result<bool> {
    let n_bytes = jwk.n.as_deref().map(b64url_decode).transpose()?.ok_or_else(|| {
        Error::InvalidJWKS("RSA key missing n".to_string())
    })?;
    let e_bytes = jwk.e.as_deref().map(b64url_decode).transpose()?.ok_or_else(|| {
        Error::InvalidJWKS("RSA key missing e".to_string())
    })?;

    let n = BigUint::from_bytes_be(&n_bytes);
    let e = BigUint::from_bytes_be(&e_bytes);
    let s = BigUint::from_bytes_be(signature);

    if s >= n {
        return Ok(false);
    }

    let m = s.modpow(&e, &n);
    let k = n_bytes.len();
    let mut m_bytes = m.to_bytes_be();
    if m_bytes.len() > k {
        return Ok(false);
    }
    while m_bytes.len() < k {
        m_bytes.insert(0, 0);
    }

    if m_bytes.len() < 2 + 8 + 1 + DIGEST_INFO_SHA256.len() + 32 {
        return Ok(false);
    }
    if m_bytes[0] != 0x00 || m_bytes[1] != 0x01 {
        return Ok(false);
    }

    let mut idx = 2;
    let mut padding_len = 0;
    while idx < m_bytes.len() && m_bytes[idx] == 0xff {
        idx += 1;
        padding_len += 1;
    }
    if padding_len < 8 || idx >= m_bytes.len() || m_bytes[idx] != 0x00 {
        return Ok(false);
    }
    idx += 1;

    if m_bytes.len() - idx != DIGEST_INFO_SHA256.len() + 32 {
        return Ok(false);
    }
    if &m_bytes[idx..idx + DIGEST_INFO_SHA256.len()] != DIGEST_INFO_SHA256 {
        return Ok(false);
    }
    idx += DIGEST_INFO_SHA256.len();

    let expected_hash = sha2::Sha256::digest(signed_input);
    Ok(&m_bytes[idx..] == expected_hash.as_slice())
}

fn verify_es256(signed_input: &[u8], signature: &[u8], jwk: &Jwk) -> Result<bool> {
    if jwk.crv.as_deref() != Some("P-256") {
        return Ok(false);
    }
    if signature.len() != 64 {
        return Ok(false);
    }

    let x = jwk.x.as_deref().map(b64url_decode).transpose()?.ok_or_else(|| {
        Error::InvalidJWKS("EC key missing x".to_string())
    })?;
    let y = jwk.y.as_deref().map(b64url_decode).transpose()?.ok_or_else(|| {
        Error::InvalidJWKS("EC key missing y".to_string())
    })?;
    if x.len() != 32 || y.len() != 32 {
        return Ok(false);
    }

    let mut point = Vec::with_capacity(65);
    point.push(0x04);
    point.extend_from_slice(&x);
    point.extend_from_slice(&y);

    let public_key = ring::signature::UnparsedPublicKey::new(&ring::signature::ECDSA_P256_SHA256_FIXED, &point);
    Ok(public_key.verify(signed_input, signature).is_ok())
}

/// Verify the JWT's signature against a candidate key drawn from `jwks`.
pub fn verify_signature(token: &str, jwks: &Jwks) -> Result<()> {
    let header = parse_header(token)?;
    let (header_b64, payload_b64, signature_b64) = split_token(token)?;
    let signature = b64url_decode(signature_b64)?;
    let jwk = select_key(&header, jwks)?;

    let signed_input = format!("{}.{}", header_b64, payload_b64);
    let verified = match header.alg.as_str() {
        "RS256" => verify_rs256(signed_input.as_bytes(), &signature, jwk)?,
        "ES256" => verify_es256(signed_input.as_bytes(), &signature, jwk)?,
        other => return Err(Error::UnsupportedAlgorithm(other.to_string())),
    };

    if verified {
        Ok(())
    } else {
        Err(Error::InvalidSignature)
    }
}

fn now_unix() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0)
}

pub fn validate_expiration(claims: &Claims, skew_seconds: i64) -> Result<()> {
    let now = now_unix();

    if now >= claims.exp + skew_seconds {
        return Err(Error::ExpiredToken);
    }
    if let Some(nbf) = claims.nbf {
        if now < nbf - skew_seconds {
            return Err(Error::NotYetValid);
        }
    }
    Ok(())
}

/// Full validation pipeline: header -> signature -> claims -> issuer ->
/// audience (if requested) -> expiration, in that order.
pub fn validate_complete(
    token: &str,
    issuer: &str,
    jwks: &Jwks,
    expected_audience: Option<&str>,
    skew_seconds: i64,
) -> Result<Token> {
    let header = parse_header(token)?;
    if header.alg != "RS256" && header.alg != "ES256" {
        return Err(Error::UnsupportedAlgorithm(header.alg));
    }

    verify_signature(token, jwks)?;
    let claims = decode_unsafe(token)?;

    if claims.iss != issuer {
        return Err(Error::InvalidIssuer);
    }
    if let Some(expected) = expected_audience {
        if claims.aud != expected {
            return Err(Error::InvalidAudience);
        }
    }

    validate_expiration(&claims, skew_seconds)?;

    Ok(Token { raw: token.to_string(), claims })
}

struct CachedJwks {
    uri: String,
    jwks: Jwks,
    fetched_at: SystemTime,
    ttl: Duration,
}

thread_local! {
    static JWKS_CACHE: RefCell<Option<CachedJwks>> = RefCell::new(None);
}

/// Fetch a JWKS document with retry/backoff: default 3 attempts, 100ms
/// initial delay, doubling up to a 5s cap. Parse failures are not
/// retried — a provider that serves malformed JSON isn't going to fix
/// itself between attempts.
pub async fn fetch_jwks(client: &reqwest::Client, uri: &str, max_attempts: u32) -> Result<Jwks> {
    let mut delay = Duration::from_millis(100);
    let cap = Duration::from_secs(5);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let outcome = client.get(uri).send().await;

        match outcome {
            Ok(response) if response.status().is_success() => {
                let body = response.text().await?;
                return serde_json::from_str(&body)
                    .map_err(|err| Error::InvalidJWKS(format!("could not parse JWKS body: {err}")));
            }
            Ok(_) | Err(_) if attempt < max_attempts => {
                log::warn!("JWKS fetch from {uri} failed (attempt {attempt}/{max_attempts}), retrying in {delay:?}");
                tokio::time::sleep(delay).await;
                delay = std::cmp::min(delay * 2, cap);
            }
            Ok(response) => {
                return Err(Error::InvalidJWKS(format!("non-success status {}", response.status())));
            }
            Err(err) => return Err(err.into()),
        }
    }
}

/// Single-slot, thread-local JWKS cache keyed by URI. A request for a
/// different URI evicts whatever was cached.
pub async fn fetch_jwks_cached(
    client: &reqwest::Client,
    uri: &str,
    ttl_seconds: u64,
    max_attempts: u32,
) -> Result<Jwks> {
    let cached = JWKS_CACHE.with(|cell| {
        let cell = cell.borrow();
        cell.as_ref().filter(|entry| entry.uri == uri).and_then(|entry| {
            let age = SystemTime::now().duration_since(entry.fetched_at).unwrap_or(Duration::MAX);
            if age < entry.ttl {
                Some(entry.jwks.clone())
            } else {
                None
            }
        })
    });

    if let Some(jwks) = cached {
        log::debug!("JWKS cache hit for {uri}");
        return Ok(jwks);
    }

    log::debug!("JWKS cache miss for {uri}");
    let jwks = fetch_jwks(client, uri, max_attempts).await?;

    JWKS_CACHE.with(|cell| {
        *cell.borrow_mut() = Some(CachedJwks {
            uri: uri.to_string(),
            jwks: jwks.clone(),
            fetched_at: SystemTime::now(),
            ttl: Duration::from_secs(ttl_seconds),
        });
    });

    Ok(jwks)
}

#[cfg(test)]
#[path = "./jwt.test.rs"]
mod tests;
