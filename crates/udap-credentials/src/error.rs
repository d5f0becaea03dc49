use thiserror::Error;
use udap_store::StoreError;

/// Errors raised by credential persistence and decoding.
///
/// A missing credential is not represented here — lookups return
/// `Ok(None)` so callers can fall back to anonymous behavior. These
/// variants mean something was stored and could not be used.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// The PKCS#12 container could not be parsed or decrypted.
    #[error("invalid credential container: {message}")]
    Container {
        /// Parser/decryption error description.
        message: String,
    },

    /// Certificate bytes inside a stored credential did not parse.
    #[error("invalid certificate in stored credential: {message}")]
    InvalidCertificate {
        /// Parser error description.
        message: String,
    },

    /// A stored payload (anchor list, settings, secret) is malformed.
    #[error("stored credential payload is malformed: {message}")]
    Decode {
        /// Decoder error description.
        message: String,
    },

    /// The underlying session store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CredentialError {
    /// Creates a new `Container` error.
    #[must_use]
    pub fn container(message: impl Into<String>) -> Self {
        Self::Container {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidCertificate` error.
    #[must_use]
    pub fn invalid_certificate(message: impl Into<String>) -> Self {
        Self::InvalidCertificate {
            message: message.into(),
        }
    }

    /// Creates a new `Decode` error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
