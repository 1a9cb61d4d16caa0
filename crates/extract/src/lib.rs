//! Per-image derivation for the thumbnail cache.
//!
//! Given the raw bytes of a PNG or JPEG this crate produces the two things
//! the cache needs to remember about it: a [`Digest`] of the file contents
//! and a [`Thumbnail`] (thumbhash plus a renderable preview). Everything here
//! is synchronous and CPU-bound; async callers should run it on a blocking
//! thread.

mod consts;
mod digest;
pub mod error;
pub mod models;
mod thumbnail;

use tracing::instrument;

use crate::error::Result;
pub use crate::consts::{FINGERPRINT_LEN, MAX_EDGE};
pub use crate::digest::normalize_base64;
pub use crate::models::{Digest, Extracted, Thumbnail};
pub use crate::thumbnail::{data_url, resized_dimensions};

/// Top-level entrypoint: digest and thumbhash for one image's raw bytes.
#[instrument(skip(bytes), fields(size = bytes.as_ref().len()))]
pub fn extract(bytes: impl AsRef<[u8]>) -> Result<Extracted> {
    let bytes = bytes.as_ref();
    Ok(Extracted {
        digest: Digest::of(bytes),
        thumbnail: Thumbnail::from_image_bytes(bytes)?,
    })
}
