//! Chunked encode/split/store and fetch/join/decode of byte values.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, warn};
use udap_core::SessionContext;

use crate::error::StoreError;
use crate::traits::SessionStore;

/// Maximum characters written per backend entry.
///
/// Matches the smallest per-item limit observed across the target
/// backends.
pub const DEFAULT_CHUNK_SIZE: usize = 4000;

fn chunk_key(base_key: &str, index: usize) -> String {
    format!("{base_key}_chunk_{index}")
}

fn count_key(base_key: &str) -> String {
    format!("{base_key}_totalChunks")
}

/// Stores byte values of arbitrary size over a backend with small
/// per-entry limits.
///
/// A logical value under `base_key` becomes `{base_key}_chunk_0` ..
/// `{base_key}_chunk_{n-1}` plus a `{base_key}_totalChunks` count entry.
/// The count entry is written last and read first: a reader either sees a
/// complete value or none at all, provided writers keep to one writer per
/// logical key.
#[derive(Debug, Clone)]
pub struct ChunkedStore<S> {
    backend: S,
    chunk_size: usize,
}

impl<S: SessionStore> ChunkedStore<S> {
    /// Creates a chunked store with [`DEFAULT_CHUNK_SIZE`].
    pub fn new(backend: S) -> Self {
        Self::with_chunk_size(backend, DEFAULT_CHUNK_SIZE)
    }

    /// Creates a chunked store with an explicit chunk size.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn with_chunk_size(backend: S, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be non-zero");
        Self {
            backend,
            chunk_size,
        }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// The configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Stores `bytes` under `base_key`, replacing any prior value.
    ///
    /// The previous value is removed first so a shorter replacement never
    /// leaves stale trailing chunks behind. The count entry is written
    /// after every chunk; cancellation mid-write leaves at worst orphaned
    /// chunk entries that no count references.
    pub async fn put(
        &self,
        ctx: &SessionContext,
        base_key: &str,
        bytes: &[u8],
    ) -> Result<(), StoreError> {
        self.delete(ctx, base_key).await?;

        let encoded = BASE64.encode(bytes);
        // base64 output is ASCII, so any byte index is a char boundary
        let mut chunks: Vec<&str> = Vec::new();
        let mut rest = encoded.as_str();
        while !rest.is_empty() {
            let (head, tail) = rest.split_at(rest.len().min(self.chunk_size));
            chunks.push(head);
            rest = tail;
        }

        for (index, chunk) in chunks.iter().enumerate() {
            self.backend.set(ctx, &chunk_key(base_key, index), chunk).await?;
        }
        self.backend
            .set(ctx, &count_key(base_key), &chunks.len().to_string())
            .await?;

        debug!(
            backend = self.backend.backend_name(),
            key = base_key,
            chunks = chunks.len(),
            bytes = bytes.len(),
            "stored chunked value"
        );
        Ok(())
    }

    /// Retrieves the value under `base_key`.
    ///
    /// Returns `Ok(None)` when no count entry exists. A present count with
    /// a missing chunk, an unparsable count, or an undecodable payload is
    /// a corruption error — never a partial result.
    pub async fn fetch(
        &self,
        ctx: &SessionContext,
        base_key: &str,
    ) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(raw_count) = self.backend.get(ctx, &count_key(base_key)).await? else {
            return Ok(None);
        };
        let total: usize = raw_count
            .trim()
            .parse()
            .map_err(|_| StoreError::corrupt_count(base_key, raw_count.clone()))?;

        let mut encoded = String::with_capacity(total * self.chunk_size);
        for index in 0..total {
            match self.backend.get(ctx, &chunk_key(base_key, index)).await? {
                Some(chunk) => encoded.push_str(&chunk),
                None => {
                    warn!(
                        backend = self.backend.backend_name(),
                        key = base_key,
                        index,
                        total,
                        "chunked value is missing a chunk"
                    );
                    return Err(StoreError::missing_chunk(base_key, index, total));
                }
            }
        }

        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| StoreError::encoding(base_key, e.to_string()))?;
        Ok(Some(bytes))
    }

    /// Removes the value under `base_key`, chunks first, count entry last.
    /// No-op when no count entry exists.
    pub async fn delete(&self, ctx: &SessionContext, base_key: &str) -> Result<(), StoreError> {
        let Some(raw_count) = self.backend.get(ctx, &count_key(base_key)).await? else {
            return Ok(());
        };
        match raw_count.trim().parse::<usize>() {
            Ok(total) => {
                for index in 0..total {
                    self.backend.remove(ctx, &chunk_key(base_key, index)).await?;
                }
            }
            Err(_) => {
                // The chunks are unreachable without a valid count; drop the
                // count entry so the key reads as absent again.
                warn!(
                    backend = self.backend.backend_name(),
                    key = base_key,
                    count = %raw_count,
                    "removing value with unparsable chunk count"
                );
            }
        }
        self.backend.remove(ctx, &count_key(base_key)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySessionStore;

    fn store() -> ChunkedStore<MemorySessionStore> {
        ChunkedStore::with_chunk_size(MemorySessionStore::new(), 16)
    }

    #[tokio::test]
    async fn absent_key_reads_as_none() {
        let store = store();
        let ctx = SessionContext::new("s1");
        assert!(store.fetch(&ctx, "nothing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_chunk_is_corruption_not_truncation() {
        let store = store();
        let ctx = SessionContext::new("s1");
        store.put(&ctx, "blob", &[7u8; 64]).await.unwrap();
        store.backend().remove(&ctx, "blob_chunk_1").await.unwrap();

        let err = store.fetch(&ctx, "blob").await.unwrap_err();
        assert!(matches!(err, StoreError::MissingChunk { index: 1, .. }));
    }

    #[tokio::test]
    async fn unparsable_count_is_corruption() {
        let store = store();
        let ctx = SessionContext::new("s1");
        store
            .backend()
            .set(&ctx, "blob_totalChunks", "three")
            .await
            .unwrap();

        let err = store.fetch(&ctx, "blob").await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptCount { .. }));
    }

    #[tokio::test]
    async fn invalid_base64_is_corruption() {
        let store = store();
        let ctx = SessionContext::new("s1");
        store.backend().set(&ctx, "blob_chunk_0", "!!!!").await.unwrap();
        store.backend().set(&ctx, "blob_totalChunks", "1").await.unwrap();

        let err = store.fetch(&ctx, "blob").await.unwrap_err();
        assert!(matches!(err, StoreError::Encoding { .. }));
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = store();
        let a = SessionContext::new("a");
        let b = SessionContext::new("b");
        store.put(&a, "blob", b"alpha").await.unwrap();

        assert!(store.fetch(&b, "blob").await.unwrap().is_none());
        assert_eq!(store.fetch(&a, "blob").await.unwrap().unwrap(), b"alpha");
    }

    #[tokio::test]
    async fn delete_with_corrupt_count_clears_the_key() {
        let store = store();
        let ctx = SessionContext::new("s1");
        store.backend().set(&ctx, "blob_totalChunks", "x").await.unwrap();

        store.delete(&ctx, "blob").await.unwrap();
        assert!(store.fetch(&ctx, "blob").await.unwrap().is_none());
    }
}
