//! Local filesystem storage backend.
//!
//! Files are accessed relative to a configured root directory using
//! `tokio::fs` for async I/O.

use crate::backend::FileInfoStream;
use crate::error::ErrorKind;
use crate::{FileInfo, StorageBackend, error::Result, path::validate as validate_path};
use async_stream::stream;
use async_trait::async_trait;
use exn::ResultExt;
use std::collections::HashSet;
use std::fs::{Metadata, create_dir_all as sync_create_dir};
use std::path::{Path, PathBuf};
use time::UtcDateTime;
use tokio::fs::{self, DirEntry};

enum WalkEntry {
    File(FileInfo),
    Descend(PathBuf),
    Skip,
}

/// Local filesystem storage backend.
///
/// # Examples
///
/// ```no_run
/// use thumbmap_storage::backend::LocalBackend;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let site = LocalBackend::new("site", "/srv/docs")?;
/// let cache = LocalBackend::new("cache", "/srv/docs/.vitepress/cache")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct LocalBackend {
    name: String,
    root: PathBuf,
}
impl LocalBackend {
    /// Create a new local filesystem backend.
    ///
    /// The root directory is created if it does not exist yet (idempotent).
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not absolute, or exists but is not a
    /// directory.
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_absolute() {
            exn::bail!(ErrorKind::InvalidPath(root));
        }
        if root.exists() {
            if !root.is_dir() {
                exn::bail!(ErrorKind::InvalidPath(root));
            }
        } else {
            // Only happens once per build, not worth an async constructor.
            sync_create_dir(&root).map_err(|e| Self::map_io_error(e, &root))?;
        }
        Ok(Self { name: name.into(), root })
    }

    /// Root directory all relative paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the absolute path for a relative storage path.
    pub fn absolute_path(&self, path: impl AsRef<Path>) -> Result<PathBuf> {
        let validated = validate_path(path.as_ref())?;
        Ok(self.root.join(validated))
    }

    /// Convert an absolute path back to a relative storage path.
    fn relative_path(&self, absolute: impl AsRef<Path>) -> Result<PathBuf> {
        let absolute = absolute.as_ref();
        let relative = absolute.strip_prefix(&self.root).or_raise(|| {
            ErrorKind::BackendError(format!("path `{:?}` is not within root `{:?}`", absolute, self.root))
        })?;
        validate_path(relative)
    }

    fn metadata(path: &Path, metadata: Metadata) -> Result<FileInfo> {
        let modified = UtcDateTime::from(metadata.modified().map_err(ErrorKind::Io)?);
        Ok(FileInfo::new(path, metadata.len(), modified))
    }

    fn map_io_error(e: std::io::Error, path: &Path) -> ErrorKind {
        match e.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied(path.to_path_buf()),
            _ => ErrorKind::Io(e),
        }
    }

    /// Keeps the `?` operator usable; inside the stream loop errors have to be
    /// yielded instead.
    async fn process_entry(&self, entry: DirEntry, prefix: Option<&Path>) -> Result<WalkEntry> {
        let path = entry.path();
        // Follows symlinks, so linked image directories are scanned too.
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) => {
                // Dangling or self-referencing link: not something to list.
                if entry.file_type().await.is_ok_and(|t| t.is_symlink()) {
                    tracing::debug!(path = %path.display(), error = %e, "Skipping unresolvable symlink");
                    return Ok(WalkEntry::Skip);
                }
                return Err(Self::map_io_error(e, &path).into());
            },
        };
        let relative = self.relative_path(&path)?;
        if let Some(pfx) = prefix
            && !relative.starts_with(pfx)
            && !pfx.starts_with(&relative)
        {
            return Ok(WalkEntry::Skip);
        }
        if metadata.is_dir() {
            return Ok(WalkEntry::Descend(path));
        }
        if metadata.is_file() && prefix.is_none_or(|pfx| relative.starts_with(pfx)) {
            return Ok(WalkEntry::File(Self::metadata(&relative, metadata)?));
        }
        Ok(WalkEntry::Skip)
    }
}

#[async_trait]
impl StorageBackend for LocalBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_stream<'a>(&'a self, prefix: Option<&'a Path>) -> FileInfoStream<'a> {
        let validated_prefix = match prefix.map(validate_path).transpose() {
            Ok(pfx) => pfx,
            Err(e) => return Box::pin(futures::stream::once(async { Result::Err(e) })),
        };

        // Walk from the parent of the prefix so a prefix whose leaf doesn't
        // exist (or is a file) isn't an error. `Path::starts_with` is
        // component-based, so "public" never matches "public-old/a.png".
        let start_dir = validated_prefix
            .as_ref()
            .map(|prefix| self.root.join(prefix).parent().unwrap_or(&self.root).to_path_buf())
            .unwrap_or_else(|| self.root.clone());
        let mut stack = vec![start_dir];
        // Canonical directories already walked; links back into them are
        // cycles (or duplicates) and are not entered again.
        let mut visited = HashSet::new();

        Box::pin(stream! {
            if let Some(start) = stack.first()
                && let Ok(canonical) = fs::canonicalize(start).await
            {
                visited.insert(canonical);
            }
            'dirs: while let Some(current) = stack.pop() {
                let mut entries = match fs::read_dir(&current).await {
                    Ok(entries) => entries,
                    // Listing a directory that doesn't exist is an empty list.
                    Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                    Err(err) => {
                        yield Err(exn::Exn::from(Self::map_io_error(err, &current)));
                        continue 'dirs;
                    }
                };

                'entries: loop {
                    let entry = match entries.next_entry().await {
                        Ok(Some(entry)) => entry,
                        Ok(None) => break 'entries,
                        Err(e) => { yield Err(exn::Exn::from(Self::map_io_error(e, &current))); continue 'entries; },
                    };
                    match self.process_entry(entry, validated_prefix.as_deref()).await {
                        Ok(WalkEntry::File(f)) => yield Ok(f),
                        Ok(WalkEntry::Descend(d)) => match fs::canonicalize(&d).await {
                            Ok(canonical) if visited.insert(canonical.clone()) => stack.push(d),
                            Ok(_) => tracing::debug!(path = %d.display(), "Skipping already visited directory"),
                            Err(e) => yield Err(exn::Exn::from(Self::map_io_error(e, &d))),
                        },
                        Ok(WalkEntry::Skip) => {},
                        Err(e) => yield Err(e),
                    };
                }
            }
        })
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::try_exists(&abs_path).await.map_err(ErrorKind::Io)?)
    }

    async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::read(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        if let Some(parent) = abs_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, path))?;
        }
        Ok(fs::write(&abs_path, data).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn delete(&self, path: &Path) -> Result<()> {
        let abs_path = self.absolute_path(path)?;
        Ok(fs::remove_file(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?)
    }

    async fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let from_path = self.absolute_path(from)?;
        let to_path = self.absolute_path(to)?;
        if let Some(parent) = to_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| Self::map_io_error(e, to))?;
        }
        Ok(fs::rename(&from_path, &to_path).await.map_err(|e| Self::map_io_error(e, from))?)
    }

    async fn stat(&self, path: &Path) -> Result<FileInfo> {
        let abs_path = self.absolute_path(path)?;
        let metadata = fs::metadata(&abs_path).await.map_err(|e| Self::map_io_error(e, path))?;
        Self::metadata(&validate_path(path)?, metadata)
    }
}
