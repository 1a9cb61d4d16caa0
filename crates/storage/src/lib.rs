//! Storage backends for the thumbnail cache builder.
//!
//! Two roots are accessed through a [`StorageBackend`]: the site source tree
//! (read-only, scanned for images) and the cache directory (where the map is
//! written). Keeping both behind the trait lets tests swap in the in-memory
//! [`MockBackend`](backend::MockBackend) for either.

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::{canonical_key, has_extension, is_ignored, validate as validate_path};
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;
