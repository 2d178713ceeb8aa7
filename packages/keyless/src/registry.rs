//! Registry publisher: NPM publish metadata construction and the HTTP
//! calls that carry a keyless publish's Authorization header, OTP, and
//! `npm-auth-type: oidc` marker to the registry.

use crate::error::{Error, ErrorDetails, Result};

const USER_AGENT: &str = concat!("keyless/", env!("CARGO_PKG_VERSION"));

/// `Authorization` header value, built once and reused across publish,
/// whoami and the trusted-publisher admin calls. OIDC publishes use
/// `Bearer`; a classic npm token or username/password login uses
/// whichever of `Bearer`/`Basic` the credential implies.
pub enum Authorization {
    Bearer(String),
    Basic(String),
}

impl Authorization {
    pub fn bearer(token: impl Into<String>) -> Self {
        Authorization::Bearer(token.into())
    }

    pub fn basic(username: &str, password: &str) -> Self {
        let raw = format!("{username}:{password}");
        Authorization::Basic(keyless_utils::b64::encode(raw.as_bytes()))
    }

    pub fn header_value(&self) -> String {
        match self {
            Authorization::Bearer(token) => format!("Bearer {token}"),
            Authorization::Basic(encoded) => format!("Basic {encoded}"),
        }
    }
}

/// `/` is the only character the registry needs escaped in a scoped
/// package name (`@scope/name` -> `@scope%2fname`); unscoped names pass
/// through unchanged.
pub fn encode_package_name(name: &str) -> String {
    name.replace('/', "%2f")
}

fn basename(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

pub struct PublishMetadata<'a> {
    pub registry: &'a str,
    pub name: &'a str,
    pub version: &'a str,
    pub tarball: &'a [u8],
    pub access: Option<&'a str>,
    /// The assembled Sigstore bundle, as JSON text, when this publish
    /// carries provenance.
    pub bundle_json: Option<&'a str>,
}

/// Build the NPM registry publish metadata body: `_id`, `name`,
/// `dist-tags`, a single `versions` entry carrying `dist` (and
/// `_attestations` when a bundle is present), `access`, and
/// `_attachments` holding the base64 tarball.
pub fn build_publish_body(meta: &PublishMetadata<'_>) -> Result<String> {
    let tarball_filename = format!("{}-{}.tgz", basename(meta.name), meta.version);
    let shasum = keyless_utils::Sha1Digest::new(meta.tarball).to_hex();
    let integrity = format!("sha512-{}", keyless_utils::Sha512Digest::new(meta.tarball).to_base64());
    let encoded_name = encode_package_name(meta.name);
    let tarball_url = format!("{}/{encoded_name}/-/{tarball_filename}", meta.registry);

    let version_entry = serde_json::json!({
        "_id": format!("{}@{}", meta.name, meta.version),
        "name": meta.name,
        "version": meta.version,
        "dist": {
            "integrity": integrity,
            "shasum": shasum,
            "tarball": tarball_url,
        },
    });

    let mut versions = serde_json::Map::new();
    versions.insert(meta.version.to_string(), version_entry);

    let mut body = serde_json::json!({
        "_id": meta.name,
        "name": meta.name,
        "dist-tags": {"latest": meta.version},
        "versions": versions,
        "access": meta.access.unwrap_or("public"),
        "_attachments": {
            tarball_filename: {
                "content_type": "application/octet-stream",
                "data": keyless_utils::b64::encode(meta.tarball),
                "length": meta.tarball.len(),
            },
        },
    });

    if let Some(bundle_json) = meta.bundle_json {
        let bundle_value: serde_json::Value = serde_json::from_str(bundle_json)?;
        body["_attestations"] = serde_json::json!({
            "url": format!("/.well-known/npm/attestation/{}@{}", meta.name, meta.version),
            "provenance": {
                "predicateType": "https://slsa.dev/provenance/v1",
                "bundle": bundle_value,
            },
        });
    }

    Ok(serde_json::to_string(&body)?)
}

fn parse_error_details(body: &str) -> Option<ErrorDetails> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let code = value.get("error").and_then(|v| v.as_str()).map(str::to_string);
    let summary =
        value.get("message").or_else(|| value.get("reason")).and_then(|v| v.as_str()).map(str::to_string);

    if code.is_none() && summary.is_none() {
        return None;
    }
    Some(ErrorDetails { code, summary })
}

/// Human-readable gloss for a response's HTTP status, used in log lines
/// and surfaced error messages.
pub fn describe_status(status: u16) -> &'static str {
    match status {
        400 => "bad request",
        401 => "authentication required",
        403 => "forbidden",
        404 => "not found",
        408 => "request timeout",
        409 => "conflict (version may already exist)",
        429 => "rate limited",
        500 => "internal server error",
        502 => "bad gateway",
        503 => "service unavailable",
        504 => "gateway timeout",
        _ => "unexpected response",
    }
}

#[derive(Debug, Clone)]
pub struct PublishResponse {
    pub success: bool,
    pub status_code: u16,
    pub message: Option<String>,
    pub error_details: Option<ErrorDetails>,
}

impl PublishResponse {
    /// Whether the caller should back off and retry this publish.
    pub fn is_retryable(&self) -> bool {
        matches!(self.status_code, 408 | 429 | 500 | 502 | 503 | 504)
    }
}

/// PUT the publish metadata to the registry. Network-level failures
/// propagate as `Err`; a non-2xx registry response is returned as a
/// `PublishResponse` with `success: false` so the caller can inspect
/// `is_retryable` without matching on the error type.
pub async fn publish(
    client: &reqwest::Client,
    meta: &PublishMetadata<'_>,
    authorization: &Authorization,
    otp: Option<&str>,
    use_oidc: bool,
) -> Result<PublishResponse> {
    let encoded_name = encode_package_name(meta.name);
    let url = format!("{}/{encoded_name}", meta.registry);
    let body = build_publish_body(meta)?;

    let mut request = client
        .put(&url)
        .header("Authorization", authorization.header_value())
        .header("Content-Type", "application/json")
        .header("User-Agent", USER_AGENT)
        .header("npm-command", "publish");

    if use_oidc {
        request = request.header("npm-auth-type", "oidc");
    }
    if let Some(otp) = otp {
        log::debug!("injecting npm-otp header for {}", meta.name);
        request = request.header("npm-otp", otp);
    }

    let response = request.body(body).send().await?;
    let status = response.status();
    let status_code = status.as_u16();

    if status.is_success() {
        return Ok(PublishResponse { success: true, status_code, message: None, error_details: None });
    }

    let body_text = response.text().await.unwrap_or_default();
    let mut error_details = parse_error_details(&body_text);

    let message = if status_code == 401 {
        log::warn!("registry returned 401 publishing {}", meta.name);
        Some(handle_invalid_authentication_error(client, meta.registry, authorization, &mut error_details).await)
    } else {
        if matches!(status_code, 408 | 429 | 500 | 502 | 503 | 504) {
            log::warn!("registry returned retryable status {status_code} publishing {}", meta.name);
        }
        error_details.as_ref().and_then(|d| d.summary.clone())
    };

    Ok(PublishResponse { success: false, status_code, message, error_details })
}

/// Enrich a 401's message with the identity the registry actually saw, the
/// way the teacher's `handle_invalid_authentication_error` resolves
/// "invalid authentication" down to "invalid authentication (as <user>)"
/// by calling `whoami` with the same credentials that just got rejected.
async fn handle_invalid_authentication_error(
    client: &reqwest::Client,
    registry: &str,
    authorization: &Authorization,
    error_details: &mut Option<ErrorDetails>,
) -> String {
    let base_summary = error_details.as_ref().and_then(|d| d.summary.clone()).unwrap_or_else(|| "invalid authentication".to_string());

    let message = match whoami(client, registry, authorization).await {
        Ok(username) => format!("{base_summary} (as {username})"),
        Err(_) => base_summary,
    };

    match error_details {
        Some(details) => details.summary = Some(message.clone()),
        None => *error_details = Some(ErrorDetails { code: None, summary: Some(message.clone()) }),
    }

    message
}

/// Tolerate-republish pre-flight: does `name@version` already exist?
/// Used to turn a registry's 409 on an identical re-publish into a
/// no-op instead of a hard failure, when the caller opted in.
pub async fn check_existing_version(
    client: &reqwest::Client,
    registry: &str,
    name: &str,
    version: &str,
    authorization: Option<&Authorization>,
) -> Result<bool> {
    let encoded_name = encode_package_name(name);
    let url = format!("{registry}/{encoded_name}/{version}");
    let mut request = client.get(&url);
    if let Some(auth) = authorization {
        request = request.header("Authorization", auth.header_value());
    }

    let response = request.send().await?;
    Ok(response.status().is_success())
}

#[derive(serde::Deserialize)]
struct WhoamiResponse {
    username: String,
}

/// `GET /-/whoami`, used both to surface a friendlier message on a 401
/// and as a standalone identity check.
pub async fn whoami(client: &reqwest::Client, registry: &str, authorization: &Authorization) -> Result<String> {
    let url = format!("{registry}/-/whoami");
    let response = client.get(&url).header("Authorization", authorization.header_value()).send().await?;

    if !response.status().is_success() {
        return Err(Error::RegistryError { status: response.status().as_u16(), details: None });
    }

    let body: WhoamiResponse = response.json().await?;
    Ok(body.username)
}

/// List the trusted-publisher rules configured on the registry for
/// `package_name`.
pub async fn list_trusted_publishers(
    client: &reqwest::Client,
    registry: &str,
    package_name: &str,
    authorization: &Authorization,
) -> Result<serde_json::Value> {
    let url = format!("{registry}/{}/-/oidc/publishers", encode_package_name(package_name));
    let response = client.get(&url).header("Authorization", authorization.header_value()).send().await?;

    if !response.status().is_success() {
        return Err(Error::RegistryError { status: response.status().as_u16(), details: None });
    }
    Ok(response.json().await?)
}

/// Register a new trusted-publisher rule for `package_name`.
pub async fn create_trusted_publisher(
    client: &reqwest::Client,
    registry: &str,
    package_name: &str,
    authorization: &Authorization,
    publisher: &serde_json::Value,
) -> Result<serde_json::Value> {
    let url = format!("{registry}/{}/-/oidc/publishers", encode_package_name(package_name));
    let response = client
        .post(&url)
        .header("Authorization", authorization.header_value())
        .header("Content-Type", "application/json")
        .json(publisher)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(Error::RegistryError { status: response.status().as_u16(), details: None });
    }
    Ok(response.json().await?)
}

/// Remove a trusted-publisher rule by id.
pub async fn delete_trusted_publisher(
    client: &reqwest::Client,
    registry: &str,
    package_name: &str,
    publisher_id: &str,
    authorization: &Authorization,
) -> Result<()> {
    let url = format!("{registry}/{}/-/oidc/publishers/{publisher_id}", encode_package_name(package_name));
    let response =
        client.delete(&url).header("Authorization", authorization.header_value()).send().await?;

    if !response.status().is_success() {
        return Err(Error::RegistryError { status: response.status().as_u16(), details: None });
    }
    Ok(())
}

#[cfg(test)]
#[path = "./registry.test.rs"]
mod tests;
