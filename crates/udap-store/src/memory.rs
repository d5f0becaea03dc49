//! In-memory session store backend.

use async_trait::async_trait;
use dashmap::DashMap;
use udap_core::SessionContext;

use crate::error::StoreError;
use crate::traits::SessionStore;

fn entry_key(ctx: &SessionContext, key: &str) -> String {
    format!("{}\u{1f}{}", ctx.session_id(), key)
}

/// In-memory [`SessionStore`] backed by a concurrent map.
///
/// The adapter used by tests and by hosts whose session state lives in
/// process memory. Entries are keyed by session identifier and key, so
/// sessions never observe each other's values.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, String>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all keys currently present for a session.
    ///
    /// Intended for tests that assert no orphaned entries remain.
    pub fn keys_for_session(&self, ctx: &SessionContext) -> Vec<String> {
        let prefix = format!("{}\u{1f}", ctx.session_id());
        self.entries
            .iter()
            .filter_map(|e| e.key().strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    /// Total entry count across all sessions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no entries exist.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, ctx: &SessionContext, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(entry_key(ctx, key), value.to_string());
        Ok(())
    }

    async fn get(&self, ctx: &SessionContext, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .entries
            .get(&entry_key(ctx, key))
            .map(|v| v.value().clone()))
    }

    async fn remove(&self, ctx: &SessionContext, key: &str) -> Result<(), StoreError> {
        self.entries.remove(&entry_key(ctx, key));
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
