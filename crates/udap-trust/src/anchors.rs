//! Anchor (trust-root) certificate sets.

use x509_parser::prelude::*;

use crate::error::TrustError;

/// An ordered set of trusted root certificates, optionally accompanied by
/// intermediates used to complete chain building.
///
/// Intermediates are never trust termini themselves — a chain ending at
/// an intermediate that is not also present as a root is untrusted.
/// Certificates are held as DER bytes; every entry is parse-checked on
/// insertion so validation never meets garbage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorCertificateSet {
    roots: Vec<Vec<u8>>,
    intermediates: Vec<Vec<u8>>,
}

fn check_der(der: &[u8]) -> Result<(), TrustError> {
    X509Certificate::from_der(der)
        .map(|_| ())
        .map_err(|e| TrustError::invalid_certificate(e.to_string()))
}

fn pem_to_der_list(pem: &[u8]) -> Result<Vec<Vec<u8>>, TrustError> {
    let mut reader = std::io::BufReader::new(pem);
    rustls_pemfile::certs(&mut reader)
        .map(|item| {
            item.map(|cert| cert.as_ref().to_vec())
                .map_err(|e| TrustError::invalid_pem(e.to_string()))
        })
        .collect()
}

impl AnchorCertificateSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a trusted root from DER bytes.
    pub fn add_root_der(&mut self, der: impl Into<Vec<u8>>) -> Result<(), TrustError> {
        let der = der.into();
        check_der(&der)?;
        self.roots.push(der);
        Ok(())
    }

    /// Adds an intermediate from DER bytes.
    pub fn add_intermediate_der(&mut self, der: impl Into<Vec<u8>>) -> Result<(), TrustError> {
        let der = der.into();
        check_der(&der)?;
        self.intermediates.push(der);
        Ok(())
    }

    /// Adds every certificate in a PEM bundle as a trusted root.
    ///
    /// Returns the number of roots added.
    pub fn add_roots_pem(&mut self, pem: &[u8]) -> Result<usize, TrustError> {
        let ders = pem_to_der_list(pem)?;
        let added = ders.len();
        for der in ders {
            check_der(&der)?;
            self.roots.push(der);
        }
        Ok(added)
    }

    /// Adds every certificate in a PEM bundle as an intermediate.
    ///
    /// Returns the number of intermediates added.
    pub fn add_intermediates_pem(&mut self, pem: &[u8]) -> Result<usize, TrustError> {
        let ders = pem_to_der_list(pem)?;
        let added = ders.len();
        for der in ders {
            check_der(&der)?;
            self.intermediates.push(der);
        }
        Ok(added)
    }

    /// Builds a set from pre-validated DER lists.
    ///
    /// Used when reloading a set that was serialized by this crate's
    /// consumers; each entry is still parse-checked.
    pub fn from_der_lists(
        roots: Vec<Vec<u8>>,
        intermediates: Vec<Vec<u8>>,
    ) -> Result<Self, TrustError> {
        let mut set = Self::new();
        for der in roots {
            set.add_root_der(der)?;
        }
        for der in intermediates {
            set.add_intermediate_der(der)?;
        }
        Ok(set)
    }

    /// The trusted root certificates, in insertion order.
    pub fn roots(&self) -> &[Vec<u8>] {
        &self.roots
    }

    /// The intermediate certificates, in insertion order.
    pub fn intermediates(&self) -> &[Vec<u8>] {
        &self.intermediates
    }

    /// Returns `true` when the set contains no roots.
    ///
    /// An empty set must never be used for validation; consumers fail
    /// closed on it.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Number of trusted roots.
    pub fn len(&self) -> usize {
        self.roots.len()
    }
}
