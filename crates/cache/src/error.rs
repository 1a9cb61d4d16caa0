//! Cache Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The storage backend holding the map failed.
    #[display("cache storage error")]
    Storage,
    /// No map has been written yet.
    #[display("cache map not found")]
    NotFound,
    /// The map file exists but isn't a valid map.
    #[display("invalid cache data")]
    InvalidData,
    /// The map could not be serialized.
    #[display("unable to serialize cache map")]
    Serialize,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
