//! Host name matching against a leaf certificate.
//!
//! The HTTP pipeline uses this to compute the hostname-mismatch policy
//! condition before delegating to the chain validator; the condition is
//! never overridable by anchors.

use std::net::IpAddr;
use x509_parser::extensions::GeneralName;
use x509_parser::prelude::*;

use crate::error::TrustError;

fn dns_name_matches(pattern: &str, host: &str) -> bool {
    let pattern = pattern.trim_end_matches('.').to_ascii_lowercase();
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if let Some(suffix) = pattern.strip_prefix("*.") {
        // A wildcard covers exactly one leftmost label.
        match host.split_once('.') {
            Some((first, rest)) => !first.is_empty() && rest == suffix,
            None => false,
        }
    } else {
        pattern == host
    }
}

fn ip_matches(san_bytes: &[u8], ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => san_bytes == v4.octets(),
        IpAddr::V6(v6) => san_bytes == v6.octets(),
    }
}

/// Returns whether `host` (a DNS name or IP literal) matches the leaf
/// certificate's subject alternative names.
///
/// The subject common name is consulted only when the certificate carries
/// no SAN extension at all.
pub fn leaf_matches_hostname(leaf_der: &[u8], host: &str) -> Result<bool, TrustError> {
    let (_, cert) = X509Certificate::from_der(leaf_der)
        .map_err(|e| TrustError::invalid_certificate(e.to_string()))?;

    let san = cert
        .subject_alternative_name()
        .map_err(|e| TrustError::invalid_certificate(e.to_string()))?;

    let Some(san) = san else {
        // No SAN extension: legacy common-name fallback.
        return Ok(cert
            .subject()
            .iter_common_name()
            .filter_map(|cn| cn.as_str().ok())
            .any(|cn| dns_name_matches(cn, host)));
    };

    let ip: Option<IpAddr> = host.parse().ok();
    for name in &san.value.general_names {
        match (name, &ip) {
            (GeneralName::DNSName(dns), None) => {
                if dns_name_matches(dns, host) {
                    return Ok(true);
                }
            }
            (GeneralName::IPAddress(bytes), Some(ip)) => {
                if ip_matches(bytes, ip) {
                    return Ok(true);
                }
            }
            _ => {}
        }
    }
    Ok(false)
}
