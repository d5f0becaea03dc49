//! File-backed session store backend.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use udap_core::SessionContext;

use crate::error::StoreError;
use crate::traits::SessionStore;

/// [`SessionStore`] that keeps one file per entry under a root directory.
///
/// The adapter for hosts that persist session state on device storage.
/// Layout: `{root}/{session}/{key}`, with session identifiers and keys
/// mapped onto a filesystem-safe alphabet.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    root: PathBuf,
}

fn sanitize(component: &str) -> String {
    component
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl FileSessionStore {
    /// Creates a store rooted at `root`. The directory is created lazily
    /// on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, ctx: &SessionContext, key: &str) -> PathBuf {
        self.root
            .join(sanitize(ctx.session_id()))
            .join(sanitize(key))
    }
}

fn io_err(op: &str, path: &Path, err: std::io::Error) -> StoreError {
    StoreError::backend(format!("{op} {}: {err}", path.display()))
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn set(&self, ctx: &SessionContext, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.entry_path(ctx, key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err("create", parent, e))?;
        }
        tokio::fs::write(&path, value)
            .await
            .map_err(|e| io_err("write", &path, e))
    }

    async fn get(&self, ctx: &SessionContext, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.entry_path(ctx, key);
        match tokio::fs::read_to_string(&path).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_err("read", &path, e)),
        }
    }

    async fn remove(&self, ctx: &SessionContext, key: &str) -> Result<(), StoreError> {
        let path = self.entry_path(ctx, key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err("remove", &path, e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        "file"
    }
}
