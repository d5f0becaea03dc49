//! Validation outcomes.

use crate::policy::PolicyError;

/// One certificate of a built (or partially built) chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainElementInfo {
    /// Position in the chain, 0 = presented server certificate.
    pub depth: usize,
    /// Subject distinguished name.
    pub subject: String,
    /// Issuer distinguished name.
    pub issuer: String,
    /// Whether this element is one of the configured anchors.
    pub is_anchor: bool,
}

/// A diagnostic condition recorded while deciding trust.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainStatus {
    /// The handshake reported a policy error that anchors cannot
    /// override.
    ReportedPolicyError(PolicyError),
    /// Certificate bytes at the given depth failed to parse.
    ParseFailure {
        /// Chain depth of the unparsable element.
        depth: usize,
    },
    /// The element at the given depth is past its validity window.
    Expired {
        /// Chain depth of the expired element.
        depth: usize,
    },
    /// The element at the given depth is not yet within its validity
    /// window.
    NotYetValid {
        /// Chain depth of the element.
        depth: usize,
    },
    /// The element's signature did not verify against its issuer.
    BadSignature {
        /// Chain depth of the element whose signature failed.
        depth: usize,
    },
    /// No issuer could be found for the element at the given depth among
    /// the anchors and supplied intermediates.
    NoIssuerFound {
        /// Chain depth of the dead-end element.
        depth: usize,
    },
    /// Chain building exceeded the maximum depth.
    DepthExceeded,
    /// The chain terminates at a self-signed certificate that is not a
    /// configured anchor.
    UntrustedRoot,
}

impl std::fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReportedPolicyError(e) => write!(f, "handshake reported: {e}"),
            Self::ParseFailure { depth } => write!(f, "unparsable certificate at depth {depth}"),
            Self::Expired { depth } => write!(f, "certificate at depth {depth} has expired"),
            Self::NotYetValid { depth } => {
                write!(f, "certificate at depth {depth} is not yet valid")
            }
            Self::BadSignature { depth } => {
                write!(f, "signature verification failed at depth {depth}")
            }
            Self::NoIssuerFound { depth } => {
                write!(f, "no issuer found for certificate at depth {depth}")
            }
            Self::DepthExceeded => f.write_str("maximum chain depth exceeded"),
            Self::UntrustedRoot => f.write_str("chain does not terminate at a configured anchor"),
        }
    }
}

/// Result of one validation attempt.
///
/// Ephemeral: produced per connection callback and handed straight back
/// to the transport layer, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustDecision {
    /// Whether the presented certificate chains to a configured anchor
    /// with no disqualifying conditions.
    pub trusted: bool,
    /// The chain as far as it could be built, leaf first. On success the
    /// final element is the anchor.
    pub chain: Vec<ChainElementInfo>,
    /// Diagnostic conditions, empty on success.
    pub statuses: Vec<ChainStatus>,
}

impl TrustDecision {
    /// A trusted decision carrying the built chain.
    #[must_use]
    pub fn trusted(chain: Vec<ChainElementInfo>) -> Self {
        Self {
            trusted: true,
            chain,
            statuses: Vec::new(),
        }
    }

    /// An untrusted decision carrying whatever chain was built and the
    /// conditions that disqualified it.
    #[must_use]
    pub fn untrusted(chain: Vec<ChainElementInfo>, statuses: Vec<ChainStatus>) -> Self {
        Self {
            trusted: false,
            chain,
            statuses,
        }
    }
}

impl std::fmt::Display for TrustDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.trusted {
            write!(f, "trusted")?;
            if let Some(anchor) = self.chain.last() {
                write!(f, " (anchor: {})", anchor.subject)?;
            }
            Ok(())
        } else {
            write!(f, "untrusted")?;
            for status in &self.statuses {
                write!(f, "; {status}")?;
            }
            Ok(())
        }
    }
}
