//! Keyless package-publishing trust pipeline.
//!
//! Turns a CI/CD OIDC identity into a signed, transparency-logged SLSA
//! provenance attestation that a registry accepts under
//! `npm-auth-type: oidc`. Each submodule is one stage of the pipeline:
//! [`jwt`]/[`oidc`] acquire and validate the identity, [`fulcio`]
//! exchanges it for a short-lived signing certificate, [`slsa`]/[`dsse`]
//! build and sign the provenance statement, [`rekor`] logs it,
//! [`bundle`] assembles the Sigstore bundle the registry expects, and
//! [`registry`] publishes it. [`pipeline`] wires all of that into one
//! end-to-end call.

pub mod bundle;
pub mod config;
pub mod dsse;
pub mod error;
pub mod fulcio;
pub mod jwt;
pub mod oidc;
pub mod pipeline;
pub mod registry;
pub mod rekor;
pub mod slsa;

pub use error::{Error, ErrorDetails, Result};
