use serde::{Deserialize, Serialize};

/// Per-session behavior toggles.
///
/// Stored alongside the session's credentials and read by the HTTP
/// pipeline when a client is built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// When true, outbound requests advertise `gzip, deflate` and response
    /// bodies are transparently decompressed (with byte accounting).
    /// When false, requests advertise `identity` only and bodies pass
    /// through untouched.
    #[serde(default)]
    pub decompression_enabled: bool,
}

impl SessionSettings {
    /// Settings with response decompression switched on.
    pub fn with_decompression() -> Self {
        Self {
            decompression_enabled: true,
        }
    }
}
