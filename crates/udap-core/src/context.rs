use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one user session.
///
/// All session-scoped operations take a `SessionContext` explicitly; two
/// contexts with different identifiers never observe each other's state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionContext {
    session_id: String,
}

impl SessionContext {
    /// Creates a context for an externally-assigned session identifier
    /// (e.g. a web session cookie value).
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    /// Creates a context with a freshly generated identifier.
    pub fn generate() -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
        }
    }

    /// The session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl std::fmt::Display for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.session_id)
    }
}
