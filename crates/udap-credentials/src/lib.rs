//! # udap-credentials
//!
//! Session-scoped persistence of the active client certificate bundle and
//! trust anchor set.
//!
//! [`CredentialSession`] is a typed layer over
//! [`ChunkedStore`](udap_store::ChunkedStore): the certificate container,
//! the serialized anchor list and the session settings each live under a
//! fixed logical key, chunked transparently for backends with small
//! per-entry limits. Absent entries read back as `None`/empty — callers
//! fall back to anonymous behavior; malformed entries are decode errors
//! and are never silently treated as "no credential".
//!
//! Certificate containers are re-encrypted under a per-session generated
//! secret before they are stored, so no fixed passphrase ever protects
//! exported key material.

mod bundle;
mod error;
mod session;

pub use bundle::{ClientCertificateBundle, KeyAlgorithm};
pub use error::CredentialError;
pub use session::CredentialSession;

/// Type alias for a credential result.
pub type CredentialResult<T> = Result<T, CredentialError>;
