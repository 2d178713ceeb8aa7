use pretty_assertions::assert_eq;
use rstest::rstest;

use super::*;

#[test]
fn scoped_package_names_encode_only_the_slash() {
    assert_eq!(encode_package_name("@acme/widget"), "@acme%2fwidget");
}

#[test]
fn unscoped_package_names_are_unchanged() {
    assert_eq!(encode_package_name("widget"), "widget");
}

#[test]
fn basename_strips_the_scope() {
    assert_eq!(basename("@acme/widget"), "widget");
    assert_eq!(basename("widget"), "widget");
}

#[test]
fn publish_body_carries_dist_metadata_derived_from_the_tarball() {
    let meta = PublishMetadata {
        registry: "https://registry.npmjs.org",
        name: "@acme/widget",
        version: "1.0.0",
        tarball: b"tarball-bytes",
        access: None,
        bundle_json: None,
    };

    let body = build_publish_body(&meta).unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(value["name"], "@acme/widget");
    assert_eq!(value["dist-tags"]["latest"], "1.0.0");
    assert_eq!(value["access"], "public");

    let version_entry = &value["versions"]["1.0.0"];
    assert_eq!(version_entry["dist"]["shasum"], keyless_utils::Sha1Digest::new(b"tarball-bytes").to_hex());
    assert!(value.get("_attestations").is_none());

    assert!(value["_attachments"].get("widget-1.0.0.tgz").is_some());
}

#[test]
fn publish_body_appends_a_top_level_attestations_object_when_bundle_present() {
    let bundle = serde_json::json!({"mediaType": "x"}).to_string();
    let meta = PublishMetadata {
        registry: "https://registry.npmjs.org",
        name: "widget",
        version: "1.0.0",
        tarball: b"bytes",
        access: Some("restricted"),
        bundle_json: Some(&bundle),
    };

    let body = build_publish_body(&meta).unwrap();
    let value: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(value["access"], "restricted");
    assert!(value["versions"]["1.0.0"].get("_attestations").is_none());

    let attestations = &value["_attestations"];
    assert_eq!(attestations["url"], "/.well-known/npm/attestation/widget@1.0.0");
    assert_eq!(attestations["provenance"]["predicateType"], "https://slsa.dev/provenance/v1");
    assert_eq!(attestations["provenance"]["bundle"]["mediaType"], "x");
}

#[test]
fn authorization_header_value_picks_bearer_or_basic() {
    assert_eq!(Authorization::bearer("tok").header_value(), "Bearer tok");
    assert!(Authorization::basic("user", "pass").header_value().starts_with("Basic "));
}

#[test]
fn registry_error_details_parse_error_message_and_reason_fields() {
    let body = serde_json::json!({"error": "E409", "reason": "version exists"}).to_string();
    let details = parse_error_details(&body).unwrap();
    assert_eq!(details.code.as_deref(), Some("E409"));
    assert_eq!(details.summary.as_deref(), Some("version exists"));
}

#[test]
fn registry_error_details_prefers_message_over_reason() {
    let body = serde_json::json!({"message": "bad digest", "reason": "ignored"}).to_string();
    let details = parse_error_details(&body).unwrap();
    assert_eq!(details.summary.as_deref(), Some("bad digest"));
}

#[test]
fn non_json_bodies_parse_to_no_details() {
    assert!(parse_error_details("not json").is_none());
}

#[rstest]
#[case(408, true)]
#[case(429, true)]
#[case(500, true)]
#[case(502, true)]
#[case(503, true)]
#[case(504, true)]
#[case(400, false)]
#[case(401, false)]
#[case(404, false)]
#[case(409, false)]
fn retryable_status_codes_match_the_documented_set(#[case] status_code: u16, #[case] expected: bool) {
    let response = PublishResponse { success: false, status_code, message: None, error_details: None };
    assert_eq!(response.is_retryable(), expected);
}

/// A one-shot local HTTP server that answers a single request with a fixed
/// body, so `whoami`'s 401-enrichment path can be exercised without a real
/// registry.
fn spawn_whoami_server(body: &'static str) -> std::net::SocketAddr {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    addr
}

#[tokio::test]
async fn on_401_the_message_is_enriched_with_the_whoami_username() {
    let addr = spawn_whoami_server(r#"{"username":"alice"}"#);
    let client = reqwest::Client::new();
    let registry = format!("http://{addr}");
    let authorization = Authorization::bearer("expired-token");
    let mut error_details =
        Some(ErrorDetails { code: Some("E401".to_string()), summary: Some("invalid authentication".to_string()) });

    let message = handle_invalid_authentication_error(&client, &registry, &authorization, &mut error_details).await;

    assert_eq!(message, "invalid authentication (as alice)");
    assert_eq!(error_details.unwrap().summary.as_deref(), Some("invalid authentication (as alice)"));
}

#[tokio::test]
async fn when_whoami_also_fails_the_original_message_passes_through() {
    let client = reqwest::Client::new();
    // Nothing is listening here, so the `whoami` call itself errors; the
    // original message must survive rather than panic or go missing.
    let registry = "http://127.0.0.1:1";
    let authorization = Authorization::bearer("expired-token");
    let mut error_details: Option<ErrorDetails> = None;

    let message = handle_invalid_authentication_error(&client, registry, &authorization, &mut error_details).await;

    assert_eq!(message, "invalid authentication");
}
