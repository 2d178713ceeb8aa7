//! SLSA v1 provenance statement construction.
//!
//! Two shapes come out of here depending on which OIDC provider minted
//! the token: a GitHub Actions predicate built entirely from validated
//! claims, and a GitLab CI predicate that (like the GitLab CI itself)
//! leans on the job's own environment for fields the OIDC token doesn't
//! carry.

use crate::error::Result;
use crate::jwt::Claims;

const GITHUB_BUILD_TYPE: &str = "https://github.com/npm/cli/gha/v2";
const GITLAB_BUILD_TYPE: &str = "https://github.com/npm/cli/gitlab/v0alpha1";
const FALLBACK_WORKFLOW_PATH: &str = ".github/workflows/publish.yml";

/// `pkg:npm/<name>@<version>`, with `@` in a scoped package name
/// percent-encoded to `%40` (the `/` separating scope and name is left
/// alone; PURL treats it as a namespace separator).
pub fn purl(package_name: &str, version: &str) -> String {
    format!("pkg:npm/{}@{version}", package_name.replace('@', "%40"))
}

/// Split a `job_workflow_ref` claim like
/// `owner/repo/.github/workflows/release.yml@refs/heads/main` into its
/// workflow path and ref. Falls back to a fixed path when the claim is
/// absent or doesn't contain the expected marker.
fn extract_workflow_path_and_ref(job_workflow_ref: Option<&str>, fallback_ref: Option<&str>) -> (String, String) {
    const MARKER: &str = ".github/workflows/";

    if let Some(value) = job_workflow_ref {
        if let Some(marker_idx) = value.find(MARKER) {
            let rest = &value[marker_idx..];
            if let Some(at_idx) = rest.find('@') {
                return (rest[..at_idx].to_string(), rest[at_idx + 1..].to_string());
            }
        }
    }

    (FALLBACK_WORKFLOW_PATH.to_string(), fallback_ref.unwrap_or_default().to_string())
}

/// Build the GitHub Actions-shaped SLSA v1 statement for a publish of
/// `package_name@version`, with `tarball_sha512_hex` as the subject
/// digest.
pub fn build_github_statement(
    claims: &Claims,
    tarball_sha512_hex: &str,
    package_name: &str,
    version: &str,
) -> Result<String> {
    let repository = claims.repository.as_deref().unwrap_or_default();
    let (workflow_path, workflow_ref) =
        extract_workflow_path_and_ref(claims.job_workflow_ref.as_deref(), claims.ref_.as_deref());
    let workflow_repository = format!("https://github.com/{repository}");

    let event_name = claims.event_name.as_deref().unwrap_or_default();
    let repository_id = claims.repository_id.as_deref().unwrap_or_default();
    let repository_owner_id = claims.repository_owner_id.as_deref().unwrap_or_default();
    let sha = claims.sha.as_deref().unwrap_or_default();
    let run_id = claims.run_id.as_deref().unwrap_or_default();
    let run_attempt = claims.run_attempt.as_deref().unwrap_or_default();
    let commit_ref = claims.ref_.as_deref().unwrap_or(&workflow_ref);

    let statement = serde_json::json!({
        "_type": "https://in-toto.io/Statement/v1",
        "subject": [{
            "name": purl(package_name, version),
            "digest": {"sha512": tarball_sha512_hex},
        }],
        "predicateType": "https://slsa.dev/provenance/v1",
        "predicate": {
            "buildDefinition": {
                "buildType": GITHUB_BUILD_TYPE,
                "externalParameters": {
                    "workflow": {
                        "ref": workflow_ref,
                        "repository": workflow_repository,
                        "path": workflow_path,
                    },
                },
                "internalParameters": {
                    "github": {
                        "eventName": event_name,
                        "repositoryId": repository_id,
                        "repositoryOwnerId": repository_owner_id,
                    },
                },
                "resolvedDependencies": [{
                    "uri": format!("git+https://github.com/{repository}@{commit_ref}"),
                    "digest": {"gitCommit": sha},
                }],
            },
            "runDetails": {
                "builder": {"id": "https://github.com/actions/runner"},
                "metadata": {
                    "invocationId": format!("https://github.com/{repository}/actions/runs/{run_id}/attempts/{run_attempt}"),
                },
            },
        },
    });

    Ok(serde_json::to_string(&statement)?)
}

fn env_or_empty(key: &str) -> String {
    std::env::var(key).unwrap_or_default()
}

/// Build the GitLab CI-shaped SLSA v0.2 statement. GitLab's OIDC token
/// only carries a handful of job-identifying claims, so the remaining
/// build-environment fields are read straight out of the job's own
/// predefined `CI_*` variables, the way the job itself would.
pub fn build_gitlab_statement(
    claims: &Claims,
    tarball_sha512_hex: &str,
    package_name: &str,
    version: &str,
) -> Result<String> {
    let ci_project_url = env_or_empty("CI_PROJECT_URL");
    let ci_commit_sha = env_or_empty("CI_COMMIT_SHA");
    let ci_runner_id = env_or_empty("CI_RUNNER_ID");
    let pipeline_id = claims.pipeline_id.clone().unwrap_or_else(|| env_or_empty("CI_PIPELINE_ID"));
    let project_path = claims.project_path.as_deref().unwrap_or_default();

    let statement = serde_json::json!({
        "_type": "https://in-toto.io/Statement/v0.1",
        "subject": [{
            "name": purl(package_name, version),
            "digest": {"sha512": tarball_sha512_hex},
        }],
        "predicateType": "https://slsa.dev/provenance/v0.2",
        "predicate": {
            "buildType": GITLAB_BUILD_TYPE,
            "builder": {"id": format!("{ci_project_url}/-/runners/{ci_runner_id}")},
            "invocation": {
                "configSource": {
                    "uri": format!("git+{ci_project_url}"),
                    "digest": {"sha1": &ci_commit_sha},
                    "entryPoint": env_or_empty("CI_JOB_NAME"),
                },
            },
            "environment": {
                "name": env_or_empty("CI_RUNNER_DESCRIPTION"),
                "architecture": env_or_empty("CI_RUNNER_EXECUTABLE_ARCH"),
                "server": env_or_empty("CI_SERVER_URL"),
                "project": project_path,
                "job": {"id": env_or_empty("CI_JOB_ID")},
                "pipeline": {"id": &pipeline_id, "ref": env_or_empty("CI_CONFIG_PATH")},
            },
            "metadata": {
                "buildInvocationId": &pipeline_id,
                "completeness": {"parameters": true, "environment": true, "materials": false},
                "reproducible": false,
            },
            "materials": [{"uri": format!("git+{ci_project_url}"), "digest": {"sha1": &ci_commit_sha}}],
        },
    });

    Ok(serde_json::to_string(&statement)?)
}

#[cfg(test)]
#[path = "./slsa.test.rs"]
mod tests;
