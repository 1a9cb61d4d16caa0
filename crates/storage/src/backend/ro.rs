//! Read-only storage backend decorator.
//!
//! Wraps another backend and drops every mutating operation while reporting
//! success, which is how `--dry-run` builds avoid touching the cache map.

use async_trait::async_trait;
use std::path::Path;

use crate::{BackendHandle, FileInfo, StorageBackend, backend::FileInfoStream, error::Result};

/// Read-only storage backend.
///
/// Reads are forwarded to the wrapped backend; writes, deletes and renames
/// are logged as an [`info event`](tracing::Event) and skipped.
#[derive(Clone)]
pub struct ReadOnlyBackend {
    inner: BackendHandle,
}
impl ReadOnlyBackend {
    pub fn new(inner: BackendHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl StorageBackend for ReadOnlyBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        self.inner.list_stream(prefix)
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        self.inner.exists(path).await
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.inner.read(path).await
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        tracing::info!(backend = self.name(), path = %path.display(), bytes = data.len(), "Skipping write during dry run");
        Ok(())
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        tracing::info!(backend = self.name(), path = %path.display(), "Skipping delete during dry run");
        Ok(())
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        tracing::info!(backend = self.name(), from = %from.display(), to = %to.display(), "Skipping rename during dry run");
        Ok(())
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        self.inner.stat(path).await
    }
}
