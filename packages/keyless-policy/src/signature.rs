//! Signature policy: whether a given package is required to carry a
//! trusted-key signature before it's accepted, independent of the
//! trusted-publisher OIDC path.

use serde::{Deserialize, Serialize};

use crate::glob::matches_any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyLevel {
    None,
    Warn,
    Strict,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignaturePolicy {
    pub level: Option<PolicyLevel>,
    #[serde(default)]
    pub required_for: Vec<String>,
    #[serde(default)]
    pub exempt: Vec<String>,
    #[serde(default)]
    pub trusted_keys: Vec<String>,
    #[serde(default)]
    pub allow_self_signed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    UntrustedKey { key_id: String },
    SignatureRequired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub violations: Vec<Violation>,
}

/// Evaluate a package + optional signing key against the policy.
///
/// `key_id` is `None` when the package carries no signature at all.
pub fn evaluate(policy: &SignaturePolicy, package_name: &str, key_id: Option<&str>) -> PolicyDecision {
    let level = policy.level.unwrap_or(PolicyLevel::None);

    if matches_any(package_name, policy.exempt.iter().map(String::as_str)) {
        return PolicyDecision { allowed: true, violations: Vec::new() };
    }

    if level == PolicyLevel::None {
        return PolicyDecision { allowed: true, violations: Vec::new() };
    }

    let requires_signature = policy.required_for.is_empty()
        || matches_any(package_name, policy.required_for.iter().map(String::as_str));

    let mut violations = Vec::new();

    if requires_signature {
        match key_id {
            None => violations.push(Violation::SignatureRequired),
            Some(key_id) => {
                if !policy.trusted_keys.is_empty()
                    && !matches_any(key_id, policy.trusted_keys.iter().map(String::as_str))
                {
                    violations.push(Violation::UntrustedKey { key_id: key_id.to_string() });
                }
            }
        }
    }

    let allowed = match level {
        PolicyLevel::None => true,
        PolicyLevel::Warn => true,
        PolicyLevel::Strict => violations.is_empty(),
    };

    PolicyDecision { allowed, violations }
}

#[cfg(test)]
#[path = "./signature.test.rs"]
mod tests;
