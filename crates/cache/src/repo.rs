//! Load-transform-save access to the persisted map.
//!
//! The map is only ever read whole and written whole. Writes go to a
//! temporary sibling that is renamed over the real file, so readers (and an
//! interrupted build) only ever see a complete map.

use crate::error::{ErrorKind, Result};
use crate::map::CacheMap;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use thumbmap_storage::error::ErrorKind as StorageErrorKind;
use thumbmap_storage::{BackendHandle, FileInfo};

/// Location of the map inside the cache directory. Kept identical to the
/// upstream VitePress plugin so its client component finds the file.
pub const DEFAULT_MAP_PATH: &str = "@nolebase/vitepress-plugin-thumbnail-hash/thumbhashes/map.json";

const EMPTY_MAP: &[u8] = b"{}";

/// Repository for the cache map stored in a [`StorageBackend`](thumbmap_storage::StorageBackend).
#[derive(Clone)]
pub struct Repository {
    backend: BackendHandle,
    path: PathBuf,
}
impl Repository {
    pub fn new(backend: BackendHandle, path: impl Into<PathBuf>) -> Self {
        Self { backend, path: path.into() }
    }

    /// Repository for the map at [`DEFAULT_MAP_PATH`].
    pub fn with_default_path(backend: BackendHandle) -> Self {
        Self::new(backend, DEFAULT_MAP_PATH)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Read and parse the map.
    ///
    /// Returns [`NotFound`](ErrorKind::NotFound) if it was never written and
    /// [`InvalidData`](ErrorKind::InvalidData) if it can't be parsed.
    pub async fn read(&self) -> Result<CacheMap> {
        let bytes = match self.backend.read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => exn::bail!(ErrorKind::NotFound),
            Err(e) => return Err(e.raise(ErrorKind::Storage)),
        };
        CacheMap::from_json(&bytes)
    }

    /// Load the previous map for reuse, never failing.
    ///
    /// A missing map is an empty map. An unreadable or unparsable one is
    /// logged and also treated as empty, which results in every image being
    /// regenerated.
    pub async fn load(&self) -> CacheMap {
        match self.read().await {
            Ok(map) => map,
            Err(e) if *e == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "No previous cache map");
                CacheMap::new()
            },
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = ?e, "Ignoring unusable cache map");
                CacheMap::new()
            },
        }
    }

    /// Replace the stored map with `map`.
    pub async fn save(&self, map: &CacheMap) -> Result<()> {
        self.write_atomic(&map.to_json()?).await
    }

    /// Write an empty map if none exists yet. Returns `true` if one was
    /// written.
    pub async fn ensure_exists(&self) -> Result<bool> {
        if self.backend.exists(&self.path).await.or_raise(|| ErrorKind::Storage)? {
            return Ok(false);
        }
        self.write_atomic(EMPTY_MAP).await?;
        Ok(true)
    }

    /// Storage metadata of the map file, if it exists.
    pub async fn stat(&self) -> Result<Option<FileInfo>> {
        match self.backend.stat(&self.path).await {
            Ok(info) => Ok(Some(info)),
            Err(e) if matches!(&*e, StorageErrorKind::NotFound(_)) => Ok(None),
            Err(e) => Err(e.raise(ErrorKind::Storage)),
        }
    }

    async fn write_atomic(&self, bytes: &[u8]) -> Result<()> {
        let temp = self.temp_path();
        self.backend.write(&temp, bytes).await.or_raise(|| ErrorKind::Storage)?;
        if let Err(e) = self.backend.rename(&temp, &self.path).await {
            if let Err(cleanup) = self.backend.delete(&temp).await {
                tracing::warn!(path = %temp.display(), error = ?cleanup, "Unable to remove temporary cache map");
            }
            return Err(e.raise(ErrorKind::Storage));
        }
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "Cache map written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::record;
    use std::sync::Arc;
    use thumbmap_storage::StorageBackend;
    use thumbmap_storage::backend::MockBackend;

    fn repository() -> (Arc<MockBackend>, Repository) {
        let backend = Arc::new(MockBackend::default().with_name("cache"));
        let repository = Repository::with_default_path(backend.clone());
        (backend, repository)
    }

    #[tokio::test]
    async fn test_load_missing_is_empty() {
        let (_backend, repository) = repository();
        assert!(repository.load().await.is_empty());
        let err = repository.read().await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_load_malformed_is_empty() {
        let (backend, repository) = repository();
        backend.write(Path::new(DEFAULT_MAP_PATH), b"{ definitely: not json").await.unwrap();
        assert!(repository.load().await.is_empty());
        let err = repository.read().await.unwrap_err();
        assert_eq!(*err, ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let (backend, repository) = repository();
        let map = CacheMap::assemble([("public/a.png".to_string(), record("public/a.png"))]);
        repository.save(&map).await.unwrap();
        assert_eq!(repository.load().await, map);
        // No temporary file left behind
        assert_eq!(backend.list(None).await.unwrap().len(), 1);
        assert!(!backend.exists(&repository.temp_path()).await.unwrap());
    }

    #[tokio::test]
    async fn test_save_replaces_whole_map() {
        let (_backend, repository) = repository();
        let first = CacheMap::assemble([("public/a.png".to_string(), record("public/a.png"))]);
        let second = CacheMap::assemble([("public/b.png".to_string(), record("public/b.png"))]);
        repository.save(&first).await.unwrap();
        repository.save(&second).await.unwrap();
        let loaded = repository.load().await;
        assert!(loaded.get("public/a.png").is_none());
        assert!(loaded.get("public/b.png").is_some());
    }

    #[tokio::test]
    async fn test_ensure_exists() {
        let (backend, repository) = repository();
        assert!(repository.stat().await.unwrap().is_none());
        assert!(repository.ensure_exists().await.unwrap());
        assert_eq!(backend.read(Path::new(DEFAULT_MAP_PATH)).await.unwrap(), b"{}");
        // Existing maps are left alone, even empty or broken ones.
        backend.write(Path::new(DEFAULT_MAP_PATH), b"broken").await.unwrap();
        assert!(!repository.ensure_exists().await.unwrap());
        assert_eq!(backend.read(Path::new(DEFAULT_MAP_PATH)).await.unwrap(), b"broken");
        assert!(repository.stat().await.unwrap().is_some());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let (_backend, repository) = repository();
        assert_eq!(
            repository.temp_path(),
            Path::new("@nolebase/vitepress-plugin-thumbnail-hash/thumbhashes/map.json.tmp")
        );
    }
}
