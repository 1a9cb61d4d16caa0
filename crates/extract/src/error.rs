//! Extraction Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The bytes are not an image in a supported format, or are corrupt.
    #[display("unable to decode image")]
    Decode,
    /// A thumbhash could not be turned back into pixels.
    #[display("invalid thumbhash")]
    InvalidHash,
    /// The preview image could not be encoded.
    #[display("unable to encode preview image")]
    Encode,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Same bytes in, same failure out.
        false
    }
}
