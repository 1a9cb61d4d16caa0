//! Storage models.

use std::path::PathBuf;
use time::UtcDateTime;

/// File metadata returned by storage backends.
///
/// For images this is everything the builder needs to decide whether a cached
/// record is still valid: the pair (`modified`, `size`) is compared against
/// what was recorded the last time the file was hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Relative path from storage root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified timestamp
    pub modified: UtcDateTime,
}
impl FileInfo {
    pub fn new(path: impl Into<PathBuf>, size: u64, modified: UtcDateTime) -> Self {
        Self { path: path.into(), size, modified }
    }

    /// Modification time as fractional milliseconds since the Unix epoch.
    ///
    /// Same unit as the `mtimeMs` reported by Node's `fs.stat`, which is what
    /// existing map files were written with.
    pub fn modified_ms(&self) -> f64 {
        self.modified.unix_timestamp_nanos() as f64 / 1_000_000.0
    }
}
