//! # udap-http
//!
//! Outbound HTTP transport bound to a session's credentials.
//!
//! [`CertificateBoundHttpPipeline`] composes a [`reqwest::Client`] from
//! the state a [`CredentialSession`](udap_credentials::CredentialSession)
//! holds:
//!
//! - the active client certificate bundle, attached to the TLS handshake
//!   when present;
//! - the active anchor set, installed as the server-certificate
//!   acceptance callback via [`AnchorCertVerifier`] — custom trust is
//!   strictly opt-in, so with no anchors configured the client falls back
//!   to default (webpki) validation;
//! - the session's decompression toggle, controlling whether requests
//!   advertise compressed transfer and whether response bodies are
//!   decoded with byte accounting.
//!
//! Trust failures surface as TLS/connection errors from the transport;
//! decompression failures surface as [`PipelineError::Decompress`] and
//! are never retried here.

mod counting;
mod error;
mod pipeline;
mod verifier;

pub use counting::{ContentEncoding, CountingReader, TransferDiagnostics};
pub use error::PipelineError;
pub use pipeline::{CertificateBoundHttpPipeline, PipelineResponse};
pub use verifier::AnchorCertVerifier;

/// Type alias for a pipeline result.
pub type PipelineResult<T> = Result<T, PipelineError>;
