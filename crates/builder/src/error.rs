//! Builder Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A builder error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for builder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What went wrong, at the granularity the build loop acts on.
///
/// [`Scan`](ErrorKind::Scan) is the only per-image kind: the build records it
/// and carries on. Everything else aborts the build.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Listing the content roots failed.
    #[display("unable to discover images")]
    Discovery,
    /// A single image could not be hashed.
    #[display("unable to hash {}", _0.display())]
    Scan(#[error(not(source))] PathBuf),
    /// Reading or writing the cache map failed.
    #[display("cache map error")]
    Cache,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Discovery | Self::Cache)
    }

    /// The image this error is about, if it concerns exactly one.
    pub fn failed_path(&self) -> Option<PathBuf> {
        match self {
            Self::Scan(path) => Some(path.clone()),
            _ => None,
        }
    }
}
