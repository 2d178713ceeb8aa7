//! Trusted Publisher policy: an owner-declared rule permitting a CI
//! identity to publish a package without a long-lived token.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PublisherType {
    GithubAction,
    GitlabCi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedPublisher {
    #[serde(rename = "type")]
    pub kind: PublisherType,
    pub owner: String,
    pub repository: String,
    pub workflow: Option<String>,
    pub environment: Option<String>,
    pub allowed_refs: Option<HashSet<String>>,
}

/// The subset of OIDC claims trusted-publisher matching needs. The full
/// claim set lives on `keyless::jwt::Claims`; this crate only needs to see
/// these fields, so it stays free of a dependency on the crate that owns
/// JWT parsing.
#[derive(Debug, Clone, Default)]
pub struct PublisherClaims<'a> {
    pub repository_owner: Option<&'a str>,
    pub repository: Option<&'a str>,
    pub job_workflow_ref: Option<&'a str>,
    pub ref_: Option<&'a str>,
    pub namespace_path: Option<&'a str>,
    pub project_path: Option<&'a str>,
}

/// The concatenation `owner/repository` is bounded to this length before
/// being compared against `claims.repository`; longer inputs fail closed
/// rather than compared in an unbounded allocation.
const MAX_REPO_SPEC_LEN: usize = 512;

fn owner_repo_matches(owner: &str, repository: &str, claim_repository: &str) -> bool {
    if owner.len() + 1 + repository.len() > MAX_REPO_SPEC_LEN {
        return false;
    }

    let mut expected = String::with_capacity(owner.len() + 1 + repository.len());
    expected.push_str(owner);
    expected.push('/');
    expected.push_str(repository);

    expected == claim_repository
}

pub fn validate_claims(publisher: &TrustedPublisher, claims: &PublisherClaims<'_>) -> bool {
    match publisher.kind {
        PublisherType::GithubAction => validate_github_action(publisher, claims),
        PublisherType::GitlabCi => validate_gitlab_ci(publisher, claims),
    }
}

fn validate_github_action(publisher: &TrustedPublisher, claims: &PublisherClaims<'_>) -> bool {
    let Some(repository_owner) = claims.repository_owner else { return false };
    if repository_owner != publisher.owner {
        return false;
    }

    let Some(repository) = claims.repository else { return false };
    if !owner_repo_matches(&publisher.owner, &publisher.repository, repository) {
        return false;
    }

    if let Some(workflow) = &publisher.workflow {
        let Some(job_workflow_ref) = claims.job_workflow_ref else { return false };
        if !job_workflow_ref.contains(workflow.as_str()) {
            return false;
        }
    }

    if let Some(allowed_refs) = &publisher.allowed_refs {
        let Some(ref_) = claims.ref_ else { return false };
        if !allowed_refs.contains(ref_) {
            return false;
        }
    }

    true
}

fn validate_gitlab_ci(publisher: &TrustedPublisher, claims: &PublisherClaims<'_>) -> bool {
    let Some(namespace_path) = claims.namespace_path else { return false };
    if namespace_path != publisher.owner {
        return false;
    }

    let Some(project_path) = claims.project_path else { return false };
    if !owner_repo_matches(&publisher.owner, &publisher.repository, project_path) {
        return false;
    }

    if let Some(allowed_refs) = &publisher.allowed_refs {
        let Some(ref_) = claims.ref_ else { return false };
        if !allowed_refs.contains(ref_) {
            return false;
        }
    }

    true
}

#[cfg(test)]
#[path = "./publisher.test.rs"]
mod tests;
