//! Error types for the [`scan`](super) module.

use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

/// The step of a single-image scan that failed.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Listing or reading from the storage backend failed.
    Storage,
    /// The image could not be decoded or hashed.
    Extract,
    /// The hashing task panicked or was cancelled.
    Blocking,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage)
    }
}
