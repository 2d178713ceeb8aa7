//! Error taxonomy for the keyless publishing pipeline.
//!
//! One `thiserror`-derived enum, `Clone` like `zpm::error::Error`, which
//! means every upstream error type this crate doesn't own is wrapped in
//! an `Arc` before it's stored.

use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub code: Option<String>,
    pub summary: Option<String>,
}

#[derive(Debug, Error, Clone)]
pub enum Error {
    #[error("invalid token ({0})")]
    InvalidToken(String),

    #[error("token expired")]
    ExpiredToken,

    #[error("token not yet valid")]
    NotYetValid,

    #[error("unexpected issuer")]
    InvalidIssuer,

    #[error("unexpected audience")]
    InvalidAudience,

    #[error("missing required claim: {0}")]
    MissingClaims(String),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid JWKS ({0})")]
    InvalidJWKS(String),

    #[error("network error: {0}")]
    NetworkError(#[from] NetworkErrorSource),

    #[error("Fulcio certificate request failed with status {0}")]
    FulcioCertificateRequestFailed(u16),

    #[error("Rekor submission failed with status {0}")]
    RekorSubmissionFailed(u16),

    #[error("Rekor inclusion-proof fetch failed with status {0}")]
    RekorFetchFailed(u16),

    #[error("claims did not match the trusted publisher rule")]
    ClaimsMismatch,

    #[error("registry returned status {status}")]
    RegistryError { status: u16, details: Option<ErrorDetails> },

    #[error("unexpected response shape from an upstream service: {0}")]
    MalformedResponse(String),

    #[error("malformed DER signature ({0})")]
    Signature(#[from] keyless_utils::der::DerError),

    #[error("malformed PEM ({0})")]
    Pem(#[from] keyless_utils::pem::PemError),

    #[error("JSON error: {0}")]
    Json(Arc<serde_json::Error>),
}

/// `reqwest::Error` isn't `Clone`, so it's wrapped before it enters the
/// enum, the same way `zpm::error::Error` wraps its non-`Clone` sources.
#[derive(Debug, Clone)]
pub struct NetworkErrorSource(pub Arc<reqwest::Error>);

impl std::fmt::Display for NetworkErrorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NetworkErrorSource {}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(NetworkErrorSource(Arc::new(err)))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
