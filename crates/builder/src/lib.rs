//! Incremental construction of the thumbhash map.
//!
//! A build lists every image under the configured content roots, decides per
//! image whether the previous map's record can be reused, hashes the rest
//! and writes the assembled map back in one go. See [`build`] for the
//! top-level entry point and [`scan`] for the underlying event stream.

mod build;
pub mod error;
pub mod scan;

use thumbmap_cache::{FreshnessPolicy, Site};
use time::Duration;

pub use crate::build::{Failure, Outcome, Summary, build};

/// Everything a build needs besides the storage handles.
#[derive(Debug, Clone)]
pub struct Context {
    pub site: Site,
    /// Directories searched for images, relative to the site root.
    pub content_roots: Vec<String>,
    /// Accepted image extensions, without the dot.
    pub extensions: Vec<String>,
    /// Directory patterns excluded from discovery.
    pub ignore: Vec<String>,
    pub policy: FreshnessPolicy,
    /// Maximum number of images processed at once.
    pub concurrency: usize,
    /// When `false` the build only makes sure a map exists.
    pub enabled: bool,
    /// A map written less than this long ago is trusted without scanning.
    /// Zero disables the shortcut.
    pub fresh_for: Duration,
}
