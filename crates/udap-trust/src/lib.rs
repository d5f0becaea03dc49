//! # udap-trust
//!
//! X.509 chain building and trust decisions against caller-supplied
//! anchors.
//!
//! UDAP communities distribute their own trust roots; the operating
//! system's store is irrelevant and must never be consulted. This crate
//! builds a chain from a presented server certificate to one of the
//! configured anchors — completing partial chains from supplied
//! intermediates — and returns a [`TrustDecision`] with per-element
//! diagnostics.
//!
//! The validator is pure and synchronous: it performs no I/O, holds no
//! mutable state, and every [`TrustAnchorValidator::validate`] call works
//! on a fresh chain-building context, so one instance can serve any number
//! of concurrent connection callbacks.
//!
//! Handshake-reported policy errors that are unrelated to chain trust
//! (hostname mismatch, expiry, revocation) are never overridden by a
//! custom anchor set — see [`PolicyError::overridable`].

mod anchors;
mod decision;
mod error;
mod hostname;
mod policy;
mod validator;

pub use anchors::AnchorCertificateSet;
pub use decision::{ChainElementInfo, ChainStatus, TrustDecision};
pub use error::TrustError;
pub use hostname::leaf_matches_hostname;
pub use policy::PolicyError;
pub use validator::{TrustAnchorValidator, MAX_CHAIN_DEPTH};

/// Type alias for a trust result.
pub type TrustResult<T> = Result<T, TrustError>;
