use crate::Context;
use crate::error::{ErrorKind as BuilderErrorKind, Result as BuilderResult};
use crate::scan::error::{ErrorKind, Result as ScanResult};
use derive_more::Display;
use exn::ResultExt;
use thumbmap_cache::{CacheMap, Record};
use thumbmap_extract::{Digest, extract};
use thumbmap_storage::{BackendHandle, FileInfo, canonical_key};

/// How much work was needed to produce a [`Scan`].
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ScanEffort {
    /// The stored record's modification time and size matched; nothing was
    /// read.
    #[display("reused")]
    Reused,
    /// The stat didn't match (or wasn't trusted) but the content digest did,
    /// so the stored hash data was kept.
    #[display("revalidated")]
    Revalidated,
    /// The image was decoded and hashed.
    #[display("generated")]
    Generated,
}

/// The settled record for one image.
#[derive(Debug, Clone)]
pub struct Scan {
    /// Canonical key the record is stored under.
    pub key: String,
    pub record: Record,
    pub effort: ScanEffort,
}

/// Settles a single image against the `previous` map.
///
/// 1. **Stat match**: if the policy trusts metadata and the record under the
///    canonical key has the same modification time and size, it is reused
///    without reading the file.
/// 2. **Digest match**: if the policy compares content, the file is read and
///    the record is kept when its content hash is unchanged.
/// 3. Otherwise the image is decoded and hashed on the blocking pool.
///
/// Reused and revalidated records get their path-derived fields and their
/// stat pair refreshed, since the site settings may have changed even though
/// the image didn't.
pub async fn scan_file(
    backend: &BackendHandle,
    previous: &CacheMap,
    ctx: &Context,
    file: FileInfo,
) -> BuilderResult<Scan> {
    let path = file.path.clone();
    scan_file_inner(backend, previous, ctx, file).await.or_raise(|| BuilderErrorKind::Scan(path))
}

pub(crate) async fn scan_file_inner(
    backend: &BackendHandle,
    previous: &CacheMap,
    ctx: &Context,
    file: FileInfo,
) -> ScanResult<Scan> {
    let key = canonical_key(&file.path);
    let location = ctx.site.locate(key.as_str());
    let existing = previous.get(&key);

    if let Some(record) = existing
        && ctx.policy.trusts_metadata()
        && record.is_fresh_for(&file)
    {
        tracing::debug!(path = %file.path.display(), "Reusing cached thumbhash");
        let record = record.clone().refreshed(location, &file);
        return Ok(Scan { key, record, effort: ScanEffort::Reused });
    }

    let bytes = backend.read(&file.path).await.or_raise(|| ErrorKind::Storage)?;

    if let Some(record) = existing
        && ctx.policy.compares_content()
        && Digest::of(&bytes).full == record.asset_full_hash
    {
        tracing::debug!(path = %file.path.display(), "Content unchanged; keeping cached thumbhash");
        let record = record.clone().refreshed(location, &file);
        return Ok(Scan { key, record, effort: ScanEffort::Revalidated });
    }

    tracing::debug!(path = %file.path.display(), size = file.size, "Generating thumbhash");
    let extracted = tokio::task::spawn_blocking(move || extract(&bytes))
        .await
        .or_raise(|| ErrorKind::Blocking)?
        .or_raise(|| ErrorKind::Extract)?;
    let record = Record::generated(extracted, location, &file);
    Ok(Scan { key, record, effort: ScanEffort::Generated })
}
