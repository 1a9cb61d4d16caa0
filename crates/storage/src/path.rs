//! Path validation, canonical keys and discovery filters.
//!
//! Everything in here is purely lexical: nothing touches the filesystem. The
//! builder relies on these to turn backend listings into the stable,
//! `/`-separated keys that end up in the cache map.

use std::path::{Component, Path, PathBuf};

use crate::error::{ErrorKind, Result};

/// Validates a storage path, ensuring it stays inside the storage root.
///
/// `.` components and duplicate separators are dropped, `..` is resolved
/// lexically and rejected if it would climb above the root. Null bytes and
/// Windows prefixes are rejected. A leading `/` is treated as "relative to
/// the root", so `/public/a.png` and `public/a.png` are the same path.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use thumbmap_storage::validate_path;
/// assert!(validate_path("public/a.png").is_ok());
/// assert!(validate_path("../etc/passwd").is_err());
/// assert_eq!(validate_path("/public/./img//a.png").unwrap(), Path::new("public/img/a.png"));
/// ```
pub fn validate(path: impl AsRef<Path>) -> Result<PathBuf> {
    let original = path.as_ref();
    let invalid = || ErrorKind::InvalidPath(original.to_path_buf());
    let mut components = Vec::new();
    for component in original.components() {
        match component {
            // Null bytes pass through Path::components() on Unix but truncate
            // paths in C-based syscalls.
            Component::Normal(s) if s.as_encoded_bytes().contains(&0) => exn::bail!(invalid()),
            Component::Normal(s) => components.push(s),
            Component::CurDir | Component::RootDir => {},
            Component::Prefix(_) => exn::bail!(invalid()),
            Component::ParentDir => {
                if components.pop().is_none() {
                    exn::bail!(invalid());
                }
            },
        }
    }
    if components.is_empty() {
        exn::bail!(invalid());
    }
    Ok(components.into_iter().collect())
}

/// The canonical cache key for a root-relative path: its normal components
/// joined with `/`, regardless of the host separator.
///
/// Non-UTF-8 components are converted lossily; the key is only ever used as
/// a lookup string, never to open the file again.
pub fn canonical_key(path: impl AsRef<Path>) -> String {
    path.as_ref()
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Returns `true` if the file extension matches one of `extensions`
/// (ASCII case-insensitive, without the leading dot).
pub fn has_extension<S: AsRef<str>>(path: impl AsRef<Path>, extensions: &[S]) -> bool {
    let Some(ext) = path.as_ref().extension().and_then(|e| e.to_str()) else {
        return false;
    };
    extensions.iter().any(|allowed| allowed.as_ref().trim_start_matches('.').eq_ignore_ascii_case(ext))
}

/// Returns `true` if any pattern matches a contiguous run of directory
/// components in `path`.
///
/// A pattern is a `/`-separated component sequence: `node_modules` excludes
/// every `node_modules` directory at any depth, `.vitepress/dist` excludes
/// every `dist` directly below a `.vitepress`. The final component of `path`
/// (the file name itself) never matches.
pub fn is_ignored<S: AsRef<str>>(path: impl AsRef<Path>, patterns: &[S]) -> bool {
    let path = canonical_key(path);
    let mut dirs: Vec<&str> = path.split('/').collect();
    dirs.pop();
    patterns.iter().any(|pattern| {
        let needle: Vec<&str> = pattern.as_ref().split('/').filter(|s| !s.is_empty()).collect();
        !needle.is_empty() && dirs.windows(needle.len()).any(|window| window == needle.as_slice())
    })
}
