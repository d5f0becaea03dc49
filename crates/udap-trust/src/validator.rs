//! Chain building against configured anchors.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use x509_parser::prelude::*;

use crate::anchors::AnchorCertificateSet;
use crate::decision::{ChainElementInfo, ChainStatus, TrustDecision};
use crate::error::TrustError;
use crate::policy::PolicyError;

/// Maximum chain depth, guarding against pathological issuer loops.
pub const MAX_CHAIN_DEPTH: usize = 32;

/// Decides whether a presented server certificate chains to one of a
/// fixed snapshot of trust anchors.
///
/// The validator copies the anchor and intermediate bytes at construction
/// and never mutates them afterwards, so a single instance may be invoked
/// from any number of concurrent connection callbacks. Each
/// [`validate`](Self::validate) call parses into a fresh local context;
/// nothing is shared across calls and no platform trust store is ever
/// consulted.
#[derive(Debug, Clone)]
pub struct TrustAnchorValidator {
    roots: Vec<Vec<u8>>,
    intermediates: Vec<Vec<u8>>,
}

struct Parsed<'a> {
    der: &'a [u8],
    cert: X509Certificate<'a>,
}

fn parse_all<'a, T: AsRef<[u8]>>(ders: &'a [T]) -> Vec<Parsed<'a>> {
    // Unparsable entries cannot complete a chain; they are dropped here
    // rather than failing the whole decision.
    ders.iter()
        .filter_map(|der| {
            let der = der.as_ref();
            match X509Certificate::from_der(der) {
                Ok((_, cert)) => Some(Parsed { der, cert }),
                Err(e) => {
                    debug!(error = %e, "skipping unparsable certificate in pool");
                    None
                }
            }
        })
        .collect()
}

fn find_issuer<'p, 'a>(pool: &'p [Parsed<'a>], child: &X509Certificate<'_>) -> Option<&'p Parsed<'a>> {
    pool.iter().find(|cand| {
        cand.cert.subject().as_raw() == child.issuer().as_raw()
            && child
                .verify_signature(Some(cand.cert.public_key()))
                .is_ok()
    })
}

fn is_self_signed(cert: &X509Certificate<'_>) -> bool {
    cert.subject().as_raw() == cert.issuer().as_raw() && cert.verify_signature(None).is_ok()
}

fn element_info(cert: &X509Certificate<'_>, depth: usize, is_anchor: bool) -> ChainElementInfo {
    ChainElementInfo {
        depth,
        subject: cert.subject().to_string(),
        issuer: cert.issuer().to_string(),
        is_anchor,
    }
}

fn check_validity(
    cert: &X509Certificate<'_>,
    depth: usize,
    now_ts: i64,
    statuses: &mut Vec<ChainStatus>,
) {
    let validity = cert.validity();
    if now_ts < validity.not_before.timestamp() {
        statuses.push(ChainStatus::NotYetValid { depth });
    } else if now_ts > validity.not_after.timestamp() {
        statuses.push(ChainStatus::Expired { depth });
    }
}

impl TrustAnchorValidator {
    /// Creates a validator over a snapshot of `anchors`.
    ///
    /// Fails fast with [`TrustError::EmptyAnchorSet`] when the set holds
    /// no roots — an empty set must fail closed at construction, not
    /// quietly distrust (or worse, trust) everything at the handshake.
    pub fn new(anchors: &AnchorCertificateSet) -> Result<Self, TrustError> {
        if anchors.is_empty() {
            return Err(TrustError::EmptyAnchorSet);
        }
        Ok(Self {
            roots: anchors.roots().to_vec(),
            intermediates: anchors.intermediates().to_vec(),
        })
    }

    /// Number of anchor roots in the snapshot.
    pub fn anchor_count(&self) -> usize {
        self.roots.len()
    }

    /// Decides trust for one presented server certificate.
    ///
    /// `handshake_intermediates` are the extra certificates the peer sent
    /// during the handshake; they seed the chain-building pool together
    /// with the intermediates configured on the anchor set, and are never
    /// treated as trust termini. `reported` carries policy conditions the
    /// handshake layer already detected: any non-overridable condition
    /// fails the decision immediately, so a custom anchor set can only
    /// ever cure a missing trust root, never a hostname mismatch or an
    /// expired certificate.
    pub fn validate<T: AsRef<[u8]>>(
        &self,
        server_cert_der: &[u8],
        handshake_intermediates: &[T],
        reported: &[PolicyError],
    ) -> TrustDecision {
        let fatal: Vec<ChainStatus> = reported
            .iter()
            .filter(|e| !e.overridable())
            .map(|e| ChainStatus::ReportedPolicyError(*e))
            .collect();
        if !fatal.is_empty() {
            return TrustDecision::untrusted(Vec::new(), fatal);
        }

        // Fresh per-call context: parse the leaf, the pool of candidate
        // issuers, and the anchors. No state survives this call.
        let leaf = match X509Certificate::from_der(server_cert_der) {
            Ok((_, cert)) => Parsed {
                der: server_cert_der,
                cert,
            },
            Err(_) => {
                return TrustDecision::untrusted(
                    Vec::new(),
                    vec![ChainStatus::ParseFailure { depth: 0 }],
                );
            }
        };

        let mut pool_ders: Vec<&[u8]> = handshake_intermediates
            .iter()
            .map(AsRef::as_ref)
            .collect();
        pool_ders.extend(self.intermediates.iter().map(Vec::as_slice));
        let pool = parse_all(&pool_ders);
        let anchor_pool = parse_all(&self.roots);

        let now_ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let mut statuses: Vec<ChainStatus> = Vec::new();
        let mut chain: Vec<ChainElementInfo> = Vec::new();
        let mut seen: HashSet<&[u8]> = HashSet::new();
        let mut anchored = false;

        let mut current: &Parsed<'_> = &leaf;
        let mut depth = 0usize;
        loop {
            if depth > MAX_CHAIN_DEPTH {
                statuses.push(ChainStatus::DepthExceeded);
                break;
            }
            chain.push(element_info(&current.cert, depth, false));
            check_validity(&current.cert, depth, now_ts, &mut statuses);

            // The element itself is a configured anchor.
            if anchor_pool.iter().any(|a| a.der == current.der) {
                if let Some(last) = chain.last_mut() {
                    last.is_anchor = true;
                }
                anchored = true;
                break;
            }

            // An anchor directly issues the element: the chain terminates.
            if let Some(anchor) = find_issuer(&anchor_pool, &current.cert) {
                chain.push(element_info(&anchor.cert, depth + 1, true));
                check_validity(&anchor.cert, depth + 1, now_ts, &mut statuses);
                anchored = true;
                break;
            }

            // A self-signed element that is not an anchor is a dead end.
            if is_self_signed(&current.cert) {
                statuses.push(ChainStatus::UntrustedRoot);
                break;
            }

            // Otherwise keep climbing through the intermediate pool.
            seen.insert(current.der);
            match find_issuer(&pool, &current.cert) {
                Some(next) if !seen.contains(next.der) => {
                    current = next;
                    depth += 1;
                }
                _ => {
                    statuses.push(ChainStatus::NoIssuerFound { depth });
                    break;
                }
            }
        }

        let trusted = anchored && statuses.is_empty();
        debug!(
            trusted,
            chain_len = chain.len(),
            statuses = statuses.len(),
            "trust decision"
        );
        if trusted {
            TrustDecision::trusted(chain)
        } else {
            TrustDecision::untrusted(chain, statuses)
        }
    }
}
