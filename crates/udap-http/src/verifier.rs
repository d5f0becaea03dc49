//! rustls server-certificate verifier backed by the anchor validator.

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::{DigitallySignedStruct, SignatureScheme};
use rustls_pki_types::{CertificateDer, ServerName, UnixTime};
use std::sync::Arc;
use tracing::debug;
use udap_trust::{PolicyError, TrustAnchorValidator, leaf_matches_hostname};

/// Installs a [`TrustAnchorValidator`] as the TLS server-certificate
/// acceptance callback.
///
/// Per connection, the adapter computes the hostname-match condition for
/// the SNI name and hands it to the validator as a reported policy error,
/// so a mismatched name fails the handshake no matter which anchors are
/// configured. Handshake signature checks stay with the crypto
/// provider's verification algorithms — only chain trust is redirected
/// to the custom anchors.
#[derive(Debug)]
pub struct AnchorCertVerifier {
    validator: TrustAnchorValidator,
    provider: Arc<CryptoProvider>,
}

impl AnchorCertVerifier {
    /// Wraps a validator with the ring crypto provider.
    pub fn new(validator: TrustAnchorValidator) -> Self {
        Self {
            validator,
            provider: Arc::new(rustls::crypto::ring::default_provider()),
        }
    }

    /// The wrapped validator.
    pub fn validator(&self) -> &TrustAnchorValidator {
        &self.validator
    }
}

impl ServerCertVerifier for AnchorCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let host = match server_name {
            ServerName::DnsName(dns) => dns.as_ref().to_string(),
            ServerName::IpAddress(ip) => std::net::IpAddr::from(*ip).to_string(),
            _ => {
                return Err(rustls::Error::General(
                    "unsupported server name type".into(),
                ));
            }
        };

        let mut reported = Vec::new();
        match leaf_matches_hostname(end_entity.as_ref(), &host) {
            Ok(true) => {}
            Ok(false) => reported.push(PolicyError::HostnameMismatch),
            Err(_) => {
                return Err(rustls::Error::InvalidCertificate(
                    rustls::CertificateError::BadEncoding,
                ));
            }
        }

        let extra: Vec<&[u8]> = intermediates.iter().map(|c| c.as_ref()).collect();
        let decision = self
            .validator
            .validate(end_entity.as_ref(), &extra, &reported);
        debug!(host = %host, trusted = decision.trusted, "server certificate decision");

        if decision.trusted {
            Ok(ServerCertVerified::assertion())
        } else if reported.contains(&PolicyError::HostnameMismatch) {
            Err(rustls::Error::InvalidCertificate(
                rustls::CertificateError::NotValidForName,
            ))
        } else {
            Err(rustls::Error::InvalidCertificate(
                rustls::CertificateError::UnknownIssuer,
            ))
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
