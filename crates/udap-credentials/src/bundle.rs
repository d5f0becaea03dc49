//! Client certificate + private key bundles.

use p12::PFX;
use x509_parser::prelude::*;

use crate::error::CredentialError;

/// Public-key algorithm family of a client certificate, as used to pick
/// the JWT signing algorithm for UDAP assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    /// RSA key — `RS*` signing algorithms.
    Rsa,
    /// EC key — `ES*` signing algorithms.
    Ecdsa,
    /// Anything else.
    Unknown,
}

impl KeyAlgorithm {
    /// The JWT algorithm family prefix, if the key maps to one.
    #[must_use]
    pub fn jwt_prefix(self) -> Option<&'static str> {
        match self {
            Self::Rsa => Some("RS"),
            Self::Ecdsa => Some("ES"),
            Self::Unknown => None,
        }
    }
}

/// An X.509 leaf certificate and its private key, unpacked from a
/// PKCS#12 container.
///
/// The first certificate in the container is taken as the leaf; any
/// further certificates ride along as chain material. The bundle keeps
/// the decrypted key only in memory — persisting it goes back through
/// [`to_encrypted_container`](Self::to_encrypted_container).
#[derive(Clone)]
pub struct ClientCertificateBundle {
    certificate_der: Vec<u8>,
    private_key_der: Vec<u8>,
    chain_der: Vec<Vec<u8>>,
    subject: String,
    subject_alt_names: Vec<String>,
    key_algorithm: KeyAlgorithm,
    not_after: i64,
}

impl std::fmt::Debug for ClientCertificateBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCertificateBundle")
            .field("subject", &self.subject)
            .field("key_algorithm", &self.key_algorithm)
            .field("chain_len", &self.chain_der.len())
            .finish_non_exhaustive()
    }
}

fn key_algorithm_of(cert: &X509Certificate<'_>) -> KeyAlgorithm {
    use x509_parser::oid_registry::{OID_KEY_TYPE_EC_PUBLIC_KEY, OID_PKCS1_RSAENCRYPTION};
    let alg = &cert.public_key().algorithm.algorithm;
    if *alg == OID_PKCS1_RSAENCRYPTION {
        KeyAlgorithm::Rsa
    } else if *alg == OID_KEY_TYPE_EC_PUBLIC_KEY {
        KeyAlgorithm::Ecdsa
    } else {
        KeyAlgorithm::Unknown
    }
}

fn subject_alt_names_of(cert: &X509Certificate<'_>) -> Vec<String> {
    use x509_parser::extensions::GeneralName;
    let Ok(Some(san)) = cert.subject_alternative_name() else {
        return Vec::new();
    };
    san.value
        .general_names
        .iter()
        .filter_map(|name| match name {
            GeneralName::DNSName(dns) => Some((*dns).to_string()),
            GeneralName::URI(uri) => Some((*uri).to_string()),
            GeneralName::RFC822Name(mail) => Some((*mail).to_string()),
            _ => None,
        })
        .collect()
}

impl ClientCertificateBundle {
    /// Unpacks a PKCS#12 container with its passphrase.
    pub fn from_pkcs12(container: &[u8], passphrase: &str) -> Result<Self, CredentialError> {
        let pfx = PFX::parse(container)
            .map_err(|e| CredentialError::container(format!("unparsable container: {e:?}")))?;
        if !pfx.verify_mac(passphrase) {
            return Err(CredentialError::container(
                "MAC verification failed (wrong passphrase?)",
            ));
        }
        let keys = pfx
            .key_bags(passphrase)
            .map_err(|e| CredentialError::container(format!("unreadable key bag: {e:?}")))?;
        let certs = pfx
            .cert_x509_bags(passphrase)
            .map_err(|e| CredentialError::container(format!("unreadable cert bag: {e:?}")))?;

        let private_key_der = keys
            .into_iter()
            .next()
            .ok_or_else(|| CredentialError::container("container holds no private key"))?;
        let mut certs = certs.into_iter();
        let certificate_der = certs
            .next()
            .ok_or_else(|| CredentialError::container("container holds no certificate"))?;
        let chain_der: Vec<Vec<u8>> = certs.collect();

        let (_, cert) = X509Certificate::from_der(&certificate_der)
            .map_err(|e| CredentialError::invalid_certificate(e.to_string()))?;

        let subject = cert.subject().to_string();
        let subject_alt_names = subject_alt_names_of(&cert);
        let key_algorithm = key_algorithm_of(&cert);
        let not_after = cert.validity().not_after.timestamp();

        Ok(Self {
            certificate_der,
            private_key_der,
            chain_der,
            subject,
            subject_alt_names,
            key_algorithm,
            not_after,
        })
    }

    /// Builds a bundle directly from a leaf certificate and a PKCS#8
    /// private key, both DER. Used when a certificate is generated rather
    /// than imported.
    pub fn from_parts(
        certificate_der: Vec<u8>,
        private_key_der: Vec<u8>,
        chain_der: Vec<Vec<u8>>,
    ) -> Result<Self, CredentialError> {
        let (_, cert) = X509Certificate::from_der(&certificate_der)
            .map_err(|e| CredentialError::invalid_certificate(e.to_string()))?;
        let subject = cert.subject().to_string();
        let subject_alt_names = subject_alt_names_of(&cert);
        let key_algorithm = key_algorithm_of(&cert);
        let not_after = cert.validity().not_after.timestamp();
        Ok(Self {
            certificate_der,
            private_key_der,
            chain_der,
            subject,
            subject_alt_names,
            key_algorithm,
            not_after,
        })
    }

    /// Re-packs the bundle as an encrypted PKCS#12 container under the
    /// given passphrase.
    ///
    /// Only the first chain certificate travels in the container; deeper
    /// chains are expected to be distributed as anchors/intermediates
    /// instead.
    pub fn to_encrypted_container(&self, passphrase: &str) -> Result<Vec<u8>, CredentialError> {
        let pfx = PFX::new(
            &self.certificate_der,
            &self.private_key_der,
            self.chain_der.first().map(Vec::as_slice),
            passphrase,
            "udap-client",
        )
        .ok_or_else(|| CredentialError::container("failed to assemble container"))?;
        Ok(pfx.to_der())
    }

    /// The leaf certificate, DER.
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    /// The private key, PKCS#8 DER.
    pub fn private_key_der(&self) -> &[u8] {
        &self.private_key_der
    }

    /// Additional chain certificates from the container, DER.
    pub fn chain_der(&self) -> &[Vec<u8>] {
        &self.chain_der
    }

    /// Subject distinguished name of the leaf.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Subject alternative names of the leaf (DNS, URI and email
    /// entries; UDAP identifies clients by URI SANs).
    pub fn subject_alt_names(&self) -> &[String] {
        &self.subject_alt_names
    }

    /// Public-key algorithm family of the leaf.
    pub fn key_algorithm(&self) -> KeyAlgorithm {
        self.key_algorithm
    }

    /// Expiry of the leaf as a Unix timestamp.
    pub fn not_after_timestamp(&self) -> i64 {
        self.not_after
    }
}
