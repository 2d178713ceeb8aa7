//! End-to-end orchestration of one keyless publish: OIDC token
//! acquisition through the registry PUT. Mirrors the shape of a CLI
//! publish command's `execute`, minus everything that's the CLI's job —
//! packing a workspace into a tarball, reading a README, prompting a
//! human for an OTP.

use keyless_ci::Provider;

use crate::config::Configuration;
use crate::error::Result;
use crate::registry::{Authorization, PublishMetadata, PublishResponse};

pub struct PublishRequest<'a> {
    pub package_name: &'a str,
    pub version: &'a str,
    pub tarball: &'a [u8],
    pub access: Option<&'a str>,
    pub otp: Option<&'a str>,
    pub tolerate_republish: bool,
}

pub struct PublishOutcome {
    pub response: PublishResponse,
    pub rekor_log_index: Option<u64>,
    pub bundle_json: String,
}

/// Whether this provider's claims produce a GitHub-shaped or a
/// GitLab-shaped SLSA statement. Any other detected provider falls back
/// to the GitHub shape, since it's the one the registry's own verifier
/// understands best.
fn is_gitlab(provider: &Provider) -> bool {
    provider.name == "GitLab CI"
}

/// Run the full pipeline: acquire and validate the two OIDC tokens this
/// flow needs (one scoped to the registry, one scoped to Sigstore),
/// exchange the Sigstore one for a signing certificate, build and sign
/// the SLSA statement, log it to Rekor, assemble the bundle, and PUT the
/// publish to the registry.
pub async fn publish_keyless(
    client: &reqwest::Client,
    config: &Configuration,
    provider: &Provider,
    request: &PublishRequest<'_>,
) -> Result<PublishOutcome> {
    let jwks = crate::jwt::fetch_jwks_cached(
        client,
        provider.jwks_uri,
        config.jwks_ttl_seconds.value,
        config.jwks_fetch_retries.value,
    )
    .await?;

    let npm_raw = crate::oidc::acquire_token(client, provider, &config.default_audience.value).await?;
    let npm_token = crate::jwt::validate_complete(
        &npm_raw,
        provider.issuer,
        &jwks,
        Some(&config.default_audience.value),
        config.clock_skew_seconds.value,
    )?;

    let sigstore_raw = crate::oidc::acquire_token(client, provider, "sigstore").await?;
    let sigstore_token = crate::jwt::validate_complete(
        &sigstore_raw,
        provider.issuer,
        &jwks,
        Some("sigstore"),
        config.clock_skew_seconds.value,
    )?;

    let keypair = crate::fulcio::EphemeralKeypair::generate()?;
    let cert_chain =
        crate::fulcio::create_signing_certificate(client, &config.fulcio_url.value, sigstore_token.raw(), &keypair)
            .await?;
    let cert_pem = crate::fulcio::first_certificate(&cert_chain)?;

    let tarball_digest = keyless_utils::Sha512Digest::new(request.tarball);
    let statement = if is_gitlab(provider) {
        crate::slsa::build_gitlab_statement(
            &npm_token.claims,
            &tarball_digest.to_hex(),
            request.package_name,
            request.version,
        )?
    } else {
        crate::slsa::build_github_statement(
            &npm_token.claims,
            &tarball_digest.to_hex(),
            request.package_name,
            request.version,
        )?
    };

    let pae = crate::dsse::pre_auth_encoding(crate::dsse::INTOTO_PAYLOAD_TYPE, statement.as_bytes());
    let signature_der = keypair.sign(&pae)?;

    let public_key_b64 = keyless_utils::b64::encode(cert_pem.as_bytes());
    let rekor_envelope_json = crate::dsse::canonical_json(
        crate::dsse::INTOTO_PAYLOAD_TYPE,
        statement.as_bytes(),
        &signature_der,
        Some(&public_key_b64),
    )?;
    let bundle_envelope_value =
        crate::dsse::build_envelope_value(crate::dsse::INTOTO_PAYLOAD_TYPE, statement.as_bytes(), &signature_der, None);

    let entry_body = crate::rekor::build_intoto_entry(&rekor_envelope_json, &cert_pem, statement.as_bytes(), &signature_der);
    let entry = crate::rekor::submit_and_await_inclusion(client, &config.rekor_url.value, &entry_body).await?;
    let rekor_log_index = Some(entry.log_index);

    let bundle_json = crate::bundle::assemble(&cert_pem, bundle_envelope_value, &entry)?;

    if request.tolerate_republish {
        let already_published = crate::registry::check_existing_version(
            client,
            &config.registry_url.value,
            request.package_name,
            request.version,
            None,
        )
        .await
        .unwrap_or(false);

        if already_published {
            return Ok(PublishOutcome {
                response: PublishResponse { success: true, status_code: 200, message: None, error_details: None },
                rekor_log_index,
                bundle_json,
            });
        }
    }

    let meta = PublishMetadata {
        registry: &config.registry_url.value,
        name: request.package_name,
        version: request.version,
        tarball: request.tarball,
        access: request.access,
        bundle_json: Some(&bundle_json),
    };

    let authorization = Authorization::bearer(npm_token.raw());
    let response = crate::registry::publish(client, &meta, &authorization, request.otp, true).await?;

    Ok(PublishOutcome { response, rekor_log_index, bundle_json })
}
