use rstest::rstest;

use crate::publisher::{validate_claims, PublisherClaims, PublisherType, TrustedPublisher};

fn github_publisher(workflow: Option<&str>, allowed_refs: Option<&[&str]>) -> TrustedPublisher {
    TrustedPublisher {
        kind: PublisherType::GithubAction,
        owner: "owner".to_string(),
        repository: "repo".to_string(),
        workflow: workflow.map(|s| s.to_string()),
        environment: None,
        allowed_refs: allowed_refs.map(|refs| refs.iter().map(|s| s.to_string()).collect()),
    }
}

#[test]
fn trusted_github_publisher_on_main_branch() {
    let publisher = github_publisher(Some(".github/workflows/release.yml"), None);
    let claims = PublisherClaims {
        repository_owner: Some("owner"),
        repository: Some("owner/repo"),
        job_workflow_ref: Some("owner/repo/.github/workflows/release.yml@refs/heads/main"),
        ref_: Some("refs/heads/main"),
        ..Default::default()
    };

    assert!(validate_claims(&publisher, &claims));
}

#[test]
fn wrong_owner_is_rejected() {
    let publisher = github_publisher(Some(".github/workflows/release.yml"), None);
    let claims = PublisherClaims {
        repository_owner: Some("different"),
        repository: Some("different/repo"),
        job_workflow_ref: Some("different/repo/.github/workflows/release.yml@refs/heads/main"),
        ref_: Some("refs/heads/main"),
        ..Default::default()
    };

    assert!(!validate_claims(&publisher, &claims));
}

#[rstest]
#[case("refs/heads/main", true)]
#[case("refs/heads/develop", false)]
fn allowed_refs_enforcement_is_exact_match(#[case] ref_: &str, #[case] expected: bool) {
    let publisher = github_publisher(None, Some(&["refs/heads/main", "refs/tags/v*"]));
    let claims = PublisherClaims {
        repository_owner: Some("owner"),
        repository: Some("owner/repo"),
        ref_: Some(ref_),
        ..Default::default()
    };

    assert_eq!(validate_claims(&publisher, &claims), expected);
}

#[test]
fn allowed_refs_is_exact_not_glob() {
    // "refs/tags/v*" is a literal string in the allow-list, not a glob: a
    // concrete tag ref like "refs/tags/v1.0.0" must NOT match it.
    let publisher = github_publisher(None, Some(&["refs/tags/v*"]));
    let claims = PublisherClaims {
        repository_owner: Some("owner"),
        repository: Some("owner/repo"),
        ref_: Some("refs/tags/v1.0.0"),
        ..Default::default()
    };

    assert!(!validate_claims(&publisher, &claims));
}

#[test]
fn missing_workflow_ref_when_workflow_required_fails_closed() {
    let publisher = github_publisher(Some(".github/workflows/release.yml"), None);
    let claims = PublisherClaims {
        repository_owner: Some("owner"),
        repository: Some("owner/repo"),
        job_workflow_ref: None,
        ..Default::default()
    };

    assert!(!validate_claims(&publisher, &claims));
}

#[test]
fn gitlab_ci_matches_namespace_and_project_path() {
    let publisher = TrustedPublisher {
        kind: PublisherType::GitlabCi,
        owner: "group".to_string(),
        repository: "project".to_string(),
        workflow: None,
        environment: None,
        allowed_refs: None,
    };

    let claims = PublisherClaims {
        namespace_path: Some("group"),
        project_path: Some("group/project"),
        ..Default::default()
    };

    assert!(validate_claims(&publisher, &claims));

    let mismatched = PublisherClaims {
        namespace_path: Some("other-group"),
        project_path: Some("group/project"),
        ..Default::default()
    };

    assert!(!validate_claims(&publisher, &mismatched));
}
