//! Backend trait for session key/value storage.

use async_trait::async_trait;
use std::sync::Arc;
use udap_core::SessionContext;

use crate::error::StoreError;

/// Primitive key/value backend scoped by session.
///
/// Implementations are the thin per-platform adapters: web session state,
/// device secure storage, an in-memory map for tests. Values are strings
/// because that is the common denominator of the target backends; binary
/// payloads are base64-encoded and chunked by
/// [`ChunkedStore`](crate::ChunkedStore) before they reach this trait.
///
/// Implementations must be thread-safe (`Send + Sync`) and must keep the
/// state of distinct sessions fully isolated.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Writes `value` under `key` for the given session, overwriting any
    /// previous value.
    async fn set(&self, ctx: &SessionContext, key: &str, value: &str) -> Result<(), StoreError>;

    /// Reads the value under `key` for the given session.
    ///
    /// Returns `None` if the key is absent. Backends return an error only
    /// for infrastructure failures, never for missing keys.
    async fn get(&self, ctx: &SessionContext, key: &str) -> Result<Option<String>, StoreError>;

    /// Removes the value under `key` for the given session. Removing an
    /// absent key is a no-op.
    async fn remove(&self, ctx: &SessionContext, key: &str) -> Result<(), StoreError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared backend trait object.
pub type DynSessionStore = Arc<dyn SessionStore>;

#[async_trait]
impl<S: SessionStore + ?Sized> SessionStore for Arc<S> {
    async fn set(&self, ctx: &SessionContext, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(ctx, key, value).await
    }

    async fn get(&self, ctx: &SessionContext, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(ctx, key).await
    }

    async fn remove(&self, ctx: &SessionContext, key: &str) -> Result<(), StoreError> {
        (**self).remove(ctx, key).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}
