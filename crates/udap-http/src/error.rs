use thiserror::Error;
use udap_credentials::CredentialError;
use udap_trust::TrustError;

/// Errors raised while building or driving the HTTP pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading session credentials failed.
    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The trust validator could not be constructed.
    #[error(transparent)]
    Trust(#[from] TrustError),

    /// TLS client configuration was rejected.
    #[error("TLS configuration error: {message}")]
    Tls {
        /// Description of the configuration failure.
        message: String,
    },

    /// The HTTP request itself failed (connection, TLS handshake,
    /// protocol). An untrusted server certificate surfaces here as a
    /// connection error raised by the transport.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body did not decode as its declared encoding.
    #[error("failed to decompress '{encoding}' response body: {message}")]
    Decompress {
        /// The declared `Content-Encoding`.
        encoding: String,
        /// Decoder error description.
        message: String,
    },
}

impl PipelineError {
    /// Creates a new `Tls` error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls {
            message: message.into(),
        }
    }

    /// Creates a new `Decompress` error.
    #[must_use]
    pub fn decompress(encoding: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decompress {
            encoding: encoding.into(),
            message: message.into(),
        }
    }
}
