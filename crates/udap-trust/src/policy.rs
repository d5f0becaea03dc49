/// TLS policy conditions reported by the handshake layer for a
/// connection, before anchor validation runs.
///
/// Only [`PolicyError::UntrustedRoot`] may be overridden by a custom
/// anchor set; everything else fails the connection no matter what
/// anchors are configured. This keeps the custom-root mechanism from
/// masking unrelated TLS failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyError {
    /// The platform could not build a chain to a root it trusts.
    ///
    /// This is the one condition a custom anchor set exists to resolve.
    UntrustedRoot,
    /// The presented certificate does not match the requested host name.
    HostnameMismatch,
    /// A certificate in the presented chain is outside its validity
    /// window.
    Expired,
    /// A certificate in the presented chain is revoked.
    Revoked,
    /// Any other reported policy failure.
    Other,
}

impl PolicyError {
    /// Whether a custom anchor set is allowed to override this condition.
    #[must_use]
    pub fn overridable(self) -> bool {
        matches!(self, Self::UntrustedRoot)
    }
}

impl std::fmt::Display for PolicyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UntrustedRoot => "untrusted root",
            Self::HostnameMismatch => "hostname mismatch",
            Self::Expired => "certificate expired",
            Self::Revoked => "certificate revoked",
            Self::Other => "policy failure",
        };
        f.write_str(name)
    }
}
