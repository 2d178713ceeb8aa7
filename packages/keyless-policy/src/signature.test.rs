use crate::signature::{evaluate, PolicyLevel, SignaturePolicy, Violation};

fn strict_policy() -> SignaturePolicy {
    SignaturePolicy {
        level: Some(PolicyLevel::Strict),
        required_for: vec!["@scope/*".to_string()],
        exempt: vec![],
        trusted_keys: vec!["deadbeefdeadbeef".to_string()],
        allow_self_signed: false,
    }
}

#[test]
fn none_level_permits_everything() {
    let policy = SignaturePolicy { level: Some(PolicyLevel::None), ..Default::default() };
    let decision = evaluate(&policy, "@scope/pkg", None);
    assert!(decision.allowed);
    assert!(decision.violations.is_empty());
}

#[test]
fn warn_level_records_but_allows() {
    let mut policy = strict_policy();
    policy.level = Some(PolicyLevel::Warn);

    let decision = evaluate(&policy, "@scope/pkg", None);
    assert!(decision.allowed);
    assert_eq!(decision.violations, vec![Violation::SignatureRequired]);
}

#[test]
fn strict_level_rejects_missing_signature() {
    let policy = strict_policy();
    let decision = evaluate(&policy, "@scope/pkg", None);
    assert!(!decision.allowed);
    assert_eq!(decision.violations, vec![Violation::SignatureRequired]);
}

#[test]
fn strict_level_rejects_untrusted_key() {
    let policy = strict_policy();
    let decision = evaluate(&policy, "@scope/pkg", Some("0000000000000000"));
    assert!(!decision.allowed);
    assert_eq!(
        decision.violations,
        vec![Violation::UntrustedKey { key_id: "0000000000000000".to_string() }]
    );
}

#[test]
fn strict_level_accepts_trusted_key() {
    let policy = strict_policy();
    let decision = evaluate(&policy, "@scope/pkg", Some("deadbeefdeadbeef"));
    assert!(decision.allowed);
    assert!(decision.violations.is_empty());
}

#[test]
fn exempt_packages_short_circuit_to_allowed() {
    let mut policy = strict_policy();
    policy.exempt = vec!["@scope/legacy-*".to_string()];

    let decision = evaluate(&policy, "@scope/legacy-tool", None);
    assert!(decision.allowed);
    assert!(decision.violations.is_empty());
}

#[test]
fn packages_outside_required_for_are_unaffected() {
    let policy = strict_policy();
    let decision = evaluate(&policy, "unscoped-package", None);
    assert!(decision.allowed);
    assert!(decision.violations.is_empty());
}
