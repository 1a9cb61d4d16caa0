use crate::Context;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use futures::TryStreamExt;
use std::collections::BTreeMap;
use std::path::Path;
use thumbmap_storage::{BackendHandle, FileInfo, has_extension, is_ignored};

/// Lists every image below the content roots of `ctx`.
///
/// Only files with one of the configured extensions are kept, and anything
/// inside an ignored directory is dropped. Roots may overlap; each file is
/// returned once, ordered by path. A content root that doesn't exist simply
/// contributes nothing.
pub async fn discover(backend: &BackendHandle, ctx: &Context) -> Result<Vec<FileInfo>> {
    let mut found = BTreeMap::new();
    for root in &ctx.content_roots {
        let mut listing = backend.list_stream(Some(Path::new(root)));
        while let Some(file) = listing.try_next().await.or_raise(|| ErrorKind::Discovery)? {
            if !has_extension(&file.path, &ctx.extensions) || is_ignored(&file.path, &ctx.ignore) {
                continue;
            }
            found.entry(file.path.clone()).or_insert(file);
        }
    }
    tracing::debug!(target = backend.name(), count = found.len(), "Discovered images");
    Ok(found.into_values().collect())
}
