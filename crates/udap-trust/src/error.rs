use thiserror::Error;

/// Errors raised when constructing trust machinery.
///
/// Note that an *untrusted* validation outcome is not an error — it is a
/// [`TrustDecision`](crate::TrustDecision). Errors here mean the caller
/// handed us something unusable.
#[derive(Debug, Error)]
pub enum TrustError {
    /// A validator was constructed with no anchor certificates.
    ///
    /// Validation against an empty anchor set would have to either trust
    /// nothing or fall back to a platform store; both are surprising, so
    /// construction fails fast instead.
    #[error("anchor certificate set is empty")]
    EmptyAnchorSet,

    /// Certificate bytes did not parse as DER X.509.
    #[error("invalid certificate: {message}")]
    InvalidCertificate {
        /// Parser error description.
        message: String,
    },

    /// PEM input could not be decoded.
    #[error("invalid PEM input: {message}")]
    InvalidPem {
        /// Decoder error description.
        message: String,
    },
}

impl TrustError {
    /// Creates a new `InvalidCertificate` error.
    #[must_use]
    pub fn invalid_certificate(message: impl Into<String>) -> Self {
        Self::InvalidCertificate {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidPem` error.
    #[must_use]
    pub fn invalid_pem(message: impl Into<String>) -> Self {
        Self::InvalidPem {
            message: message.into(),
        }
    }
}
