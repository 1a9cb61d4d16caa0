//! The persisted thumbhash map and everything needed to read and write it.
//!
//! The map is a cache in the strict sense: the images are the source of
//! truth. Deleting it costs one full regeneration, nothing more.
//!
//! # Layout
//! - [`Record`]: what the front-end reads for one image reference.
//! - [`CacheMap`]: path variant → record, ordered for deterministic output.
//! - [`derive_variants`]: the pure expansion of a canonical key into the keys
//!   the record is published under.
//! - [`Site`]/[`Location`]: URL derivation from a canonical key.
//! - [`FreshnessPolicy`]: when a stored record may be reused.
//! - [`Repository`]: load (forgiving) and save (atomic) over a storage
//!   backend.

pub mod error;
mod location;
mod map;
mod models;
mod policy;
mod repo;

pub use crate::location::{Location, Site, join_url};
pub use crate::map::{CacheMap, derive_variants};
pub use crate::models::Record;
pub use crate::policy::FreshnessPolicy;
pub use crate::repo::{DEFAULT_MAP_PATH, Repository};
