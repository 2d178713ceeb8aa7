use std::collections::HashMap;

use rstest::rstest;

use crate::{detect_active_in, TokenSource};

fn env_with(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[rstest]
#[case(&[("GITHUB_ACTIONS", "true")], "GitHub Actions")]
#[case(&[("GITLAB_CI", "true")], "GitLab CI")]
#[case(&[("AZURE_PIPELINES", "true")], "Azure Pipelines")]
#[case(&[("BITBUCKET_BUILD_NUMBER", "12")], "Bitbucket Pipelines")]
#[case(&[("CIRCLECI", "true")], "CircleCI")]
#[case(&[("JENKINS_HOME", "/var/jenkins")], "Jenkins")]
#[case(&[("TRAVIS", "true")], "Travis CI")]
fn detects_single_provider(#[case] env: &[(&str, &str)], #[case] expected_name: &str) {
    let provider = detect_active_in(&env_with(env)).expect("expected a provider to be detected");
    assert_eq!(provider.name, expected_name);
}

#[test]
fn returns_none_when_no_ci_markers_present() {
    assert!(detect_active_in(&HashMap::new()).is_none());
}

#[test]
fn fixed_order_prefers_github_over_gitlab() {
    let env = env_with(&[("GITHUB_ACTIONS", "true"), ("GITLAB_CI", "true")]);
    let provider = detect_active_in(&env).unwrap();
    assert_eq!(provider.name, "GitHub Actions");
}

#[test]
fn github_actions_uses_token_exchange() {
    let provider = crate::github_actions();
    match provider.token_source {
        TokenSource::Exchange { request_url_env, request_token_env } => {
            assert_eq!(request_url_env, "ACTIONS_ID_TOKEN_REQUEST_URL");
            assert_eq!(request_token_env, "ACTIONS_ID_TOKEN_REQUEST_TOKEN");
        }
        TokenSource::Direct { .. } => panic!("expected an exchange-based token source"),
    }
}

#[test]
fn gitlab_ci_uses_direct_token() {
    let provider = crate::gitlab_ci();
    match provider.token_source {
        TokenSource::Direct { env } => assert_eq!(env, "CI_JOB_JWT_V2"),
        TokenSource::Exchange { .. } => panic!("expected a direct token source"),
    }
}
