//! CI provider detection.
//!
//! Scoped out of the main `keyless` crate the same way `zpm-ci` is scoped
//! out of `zpm`: detecting *which* CI we're running under is a standalone
//! concern from acquiring or validating a token once we know.

use serde::Serialize;

/// How a provider hands us a raw OIDC token.
#[derive(Debug, Clone, Serialize)]
pub enum TokenSource {
    /// The token is already sitting in an environment variable.
    Direct { env: &'static str },

    /// We must GET a URL (itself named by an env var) with a bearer token
    /// (also named by an env var) to mint a token for a chosen audience.
    Exchange {
        request_url_env: &'static str,
        request_token_env: &'static str,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Provider {
    pub name: &'static str,
    pub issuer: &'static str,
    pub jwks_uri: &'static str,
    pub token_source: TokenSource,

    /// The environment variable whose mere presence signals "we're running
    /// under this provider".
    detect_env: &'static str,
}

macro_rules! provider {
    ($name:expr, $issuer:expr, $jwks_uri:expr, $detect_env:expr, direct($token_env:expr)) => {
        Provider {
            name: $name,
            issuer: $issuer,
            jwks_uri: $jwks_uri,
            detect_env: $detect_env,
            token_source: TokenSource::Direct { env: $token_env },
        }
    };

    ($name:expr, $issuer:expr, $jwks_uri:expr, $detect_env:expr, exchange($url_env:expr, $token_env:expr)) => {
        Provider {
            name: $name,
            issuer: $issuer,
            jwks_uri: $jwks_uri,
            detect_env: $detect_env,
            token_source: TokenSource::Exchange {
                request_url_env: $url_env,
                request_token_env: $token_env,
            },
        }
    };
}

pub fn github_actions() -> Provider {
    provider!(
        "GitHub Actions",
        "https://token.actions.githubusercontent.com",
        "https://token.actions.githubusercontent.com/.well-known/jwks",
        "GITHUB_ACTIONS",
        exchange("ACTIONS_ID_TOKEN_REQUEST_URL", "ACTIONS_ID_TOKEN_REQUEST_TOKEN")
    )
}

pub fn gitlab_ci() -> Provider {
    provider!(
        "GitLab CI",
        "https://gitlab.com",
        "https://gitlab.com/oauth/discovery/keys",
        "GITLAB_CI",
        direct("CI_JOB_JWT_V2")
    )
}

pub fn azure_pipelines() -> Provider {
    provider!(
        "Azure Pipelines",
        "https://vstoken.dev.azure.com",
        "https://vstoken.dev.azure.com/.well-known/openid-configuration/jwks",
        "AZURE_PIPELINES",
        exchange("SYSTEM_OIDCREQUESTURI", "SYSTEM_ACCESSTOKEN")
    )
}

pub fn bitbucket_pipelines() -> Provider {
    provider!(
        "Bitbucket Pipelines",
        "https://api.bitbucket.org/2.0/workspaces",
        "https://api.bitbucket.org/2.0/workspaces/.well-known/jwks",
        "BITBUCKET_BUILD_NUMBER",
        direct("BITBUCKET_STEP_OIDC_TOKEN")
    )
}

pub fn circleci() -> Provider {
    provider!(
        "CircleCI",
        "https://oidc.circleci.com",
        "https://oidc.circleci.com/.well-known/jwks.json",
        "CIRCLECI",
        direct("CIRCLE_OIDC_TOKEN")
    )
}

pub fn jenkins() -> Provider {
    provider!(
        "Jenkins",
        "https://oidc.jenkins.io",
        "https://oidc.jenkins.io/jwks",
        "JENKINS_HOME",
        direct("JENKINS_ID_TOKEN")
    )
}

pub fn travis_ci() -> Provider {
    provider!(
        "Travis CI",
        "https://oidc.travis-ci.com",
        "https://oidc.travis-ci.com/.well-known/jwks",
        "TRAVIS",
        direct("TRAVIS_ID_TOKEN")
    )
}

/// All built-in providers, in the fixed detection order from the spec.
pub fn builtins() -> Vec<Provider> {
    vec![
        github_actions(),
        gitlab_ci(),
        azure_pipelines(),
        bitbucket_pipelines(),
        circleci(),
        jenkins(),
        travis_ci(),
    ]
}

/// Probe environment variables in fixed order, returning the first provider
/// whose detection variable is set.
pub fn detect_active() -> Option<Provider> {
    detect_active_in(&std::env::vars().collect())
}

/// Same as [`detect_active`] but against a supplied environment map, for
/// tests that can't rely on process-global environment state.
pub fn detect_active_in(env: &std::collections::HashMap<String, String>) -> Option<Provider> {
    builtins()
        .into_iter()
        .find(|provider| env.contains_key(provider.detect_env))
}

#[cfg(test)]
#[path = "./lib.test.rs"]
mod tests;
