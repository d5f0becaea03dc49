use thiserror::Error;

/// Errors that can occur during session storage operations.
///
/// Absence of a value is not an error — lookups return `Ok(None)`.
/// The corruption variants mean a logical value exists but cannot be
/// reassembled; callers must treat the value as lost rather than work
/// with partial bytes.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A chunk referenced by the count entry was not found.
    #[error("missing chunk {index} of {total} for key '{base_key}'")]
    MissingChunk {
        /// Base key of the logical value.
        base_key: String,
        /// Index of the missing chunk.
        index: usize,
        /// Total chunk count recorded for the value.
        total: usize,
    },

    /// The count entry exists but does not parse as a chunk count.
    #[error("invalid chunk count for key '{base_key}': '{value}'")]
    CorruptCount {
        /// Base key of the logical value.
        base_key: String,
        /// The raw count entry contents.
        value: String,
    },

    /// The reassembled payload is not valid base64.
    #[error("stored payload for key '{base_key}' is not valid base64: {message}")]
    Encoding {
        /// Base key of the logical value.
        base_key: String,
        /// Decoder error description.
        message: String,
    },

    /// The underlying backend failed.
    #[error("storage backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

impl StoreError {
    /// Creates a new `MissingChunk` error.
    #[must_use]
    pub fn missing_chunk(base_key: impl Into<String>, index: usize, total: usize) -> Self {
        Self::MissingChunk {
            base_key: base_key.into(),
            index,
            total,
        }
    }

    /// Creates a new `CorruptCount` error.
    #[must_use]
    pub fn corrupt_count(base_key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::CorruptCount {
            base_key: base_key.into(),
            value: value.into(),
        }
    }

    /// Creates a new `Encoding` error.
    #[must_use]
    pub fn encoding(base_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Encoding {
            base_key: base_key.into(),
            message: message.into(),
        }
    }

    /// Creates a new `Backend` error.
    #[must_use]
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` if the stored value exists but is unreadable.
    #[must_use]
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::MissingChunk { .. } | Self::CorruptCount { .. } | Self::Encoding { .. }
        )
    }
}
