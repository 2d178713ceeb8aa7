pub mod glob;
pub mod publisher;
pub mod signature;

pub use publisher::{validate_claims, PublisherClaims, PublisherType, TrustedPublisher};
pub use signature::{evaluate as evaluate_signature_policy, PolicyDecision, PolicyLevel, SignaturePolicy, Violation};
