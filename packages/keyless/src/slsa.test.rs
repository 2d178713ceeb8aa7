use pretty_assertions::assert_eq;

use super::*;

fn github_claims() -> Claims {
    Claims {
        iss: "https://token.actions.githubusercontent.com".to_string(),
        sub: "repo:acme/widget:ref:refs/heads/main".to_string(),
        aud: "sigstore".to_string(),
        exp: 0,
        iat: 0,
        repository: Some("acme/widget".to_string()),
        repository_id: Some("123".to_string()),
        repository_owner_id: Some("456".to_string()),
        job_workflow_ref: Some("acme/widget/.github/workflows/release.yml@refs/heads/main".to_string()),
        event_name: Some("push".to_string()),
        ref_: Some("refs/heads/main".to_string()),
        sha: Some("deadbeef".to_string()),
        run_id: Some("999".to_string()),
        run_attempt: Some("1".to_string()),
        ..Default::default()
    }
}

#[test]
fn purl_percent_encodes_the_at_sign_in_scoped_names() {
    assert_eq!(purl("@acme/widget", "1.2.3"), "pkg:npm/%40acme/widget@1.2.3");
}

#[test]
fn purl_leaves_unscoped_names_alone() {
    assert_eq!(purl("widget", "1.2.3"), "pkg:npm/widget@1.2.3");
}

#[test]
fn workflow_path_is_extracted_between_the_marker_and_the_at_sign() {
    let (path, ref_) = extract_workflow_path_and_ref(
        Some("acme/widget/.github/workflows/release.yml@refs/heads/main"),
        None,
    );
    assert_eq!(path, ".github/workflows/release.yml");
    assert_eq!(ref_, "refs/heads/main");
}

#[test]
fn workflow_path_falls_back_when_marker_is_absent() {
    let (path, ref_) = extract_workflow_path_and_ref(Some("not-a-workflow-ref"), Some("refs/heads/main"));
    assert_eq!(path, FALLBACK_WORKFLOW_PATH);
    assert_eq!(ref_, "refs/heads/main");
}

#[test]
fn github_statement_carries_the_workflow_external_parameters() {
    let json = build_github_statement(&github_claims(), "abc123", "widget", "1.0.0").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["predicateType"], "https://slsa.dev/provenance/v1");
    assert_eq!(value["subject"][0]["name"], "pkg:npm/widget@1.0.0");
    assert_eq!(value["subject"][0]["digest"]["sha512"], "abc123");

    let workflow = &value["predicate"]["buildDefinition"]["externalParameters"]["workflow"];
    assert_eq!(workflow["path"], ".github/workflows/release.yml");
    assert_eq!(workflow["ref"], "refs/heads/main");
    assert_eq!(workflow["repository"], "https://github.com/acme/widget");
}

#[test]
fn github_statement_records_the_commit_and_run_in_internal_parameters() {
    let json = build_github_statement(&github_claims(), "abc123", "widget", "1.0.0").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let deps = &value["predicate"]["buildDefinition"]["resolvedDependencies"][0];
    assert_eq!(deps["digest"]["gitCommit"], "deadbeef");

    let invocation_id = value["predicate"]["runDetails"]["metadata"]["invocationId"].as_str().unwrap();
    assert!(invocation_id.ends_with("/actions/runs/999/attempts/1"));
}

#[test]
fn github_statement_defaults_missing_claims_to_empty_strings() {
    let mut claims = github_claims();
    claims.repository_id = None;
    claims.run_id = None;

    let json = build_github_statement(&claims, "abc123", "widget", "1.0.0").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["predicate"]["buildDefinition"]["internalParameters"]["github"]["repositoryId"], "");
}

#[test]
fn gitlab_statement_uses_the_older_slsa_v02_predicate() {
    let claims = Claims {
        pipeline_id: Some("77".to_string()),
        project_path: Some("acme/widget".to_string()),
        ..Default::default()
    };

    let json = build_gitlab_statement(&claims, "abc123", "widget", "1.0.0").unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["predicateType"], "https://slsa.dev/provenance/v0.2");
    assert_eq!(value["predicate"]["buildType"], GITLAB_BUILD_TYPE);
    assert_eq!(value["predicate"]["environment"]["project"], "acme/widget");
    assert_eq!(value["predicate"]["metadata"]["buildInvocationId"], "77");
}
