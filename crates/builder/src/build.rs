use crate::Context;
use crate::error::{Error, ErrorKind, Result};
use crate::scan::{Scan, ScanEffort, ScanEvent, scan};
use exn::ResultExt;
use futures::StreamExt;
use std::fmt;
use std::path::PathBuf;
use thumbmap_cache::{CacheMap, Repository};
use thumbmap_storage::BackendHandle;
use time::{Duration, UtcDateTime};

/// An image that couldn't be hashed and was left out of the map.
#[derive(Debug)]
pub struct Failure {
    pub path: PathBuf,
    pub error: Error,
}

/// Counts for one completed build.
#[derive(Debug, Default)]
pub struct Summary {
    pub reused: usize,
    pub revalidated: usize,
    pub generated: usize,
    pub failures: Vec<Failure>,
}
impl Summary {
    /// Every discovered image, whether it made it into the map or not.
    pub fn images(&self) -> usize {
        self.reused + self.revalidated + self.generated + self.failures.len()
    }

    fn count(&mut self, effort: ScanEffort) {
        match effort {
            ScanEffort::Reused => self.reused += 1,
            ScanEffort::Revalidated => self.revalidated += 1,
            ScanEffort::Generated => self.generated += 1,
        }
    }
}
impl fmt::Display for Summary {
    /// Revalidated images count as reused: neither was decoded.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Done. ({} images, {} reused, {} generated, {} failed)",
            self.images(),
            self.reused + self.revalidated,
            self.generated,
            self.failures.len()
        )
    }
}

/// What a call to [`build`] ended up doing.
#[derive(Debug)]
pub enum Outcome {
    /// Hashing is switched off; an empty map was written if none existed.
    Disabled,
    /// The map was written recently enough to be trusted as-is.
    FreshCache,
    Built(Summary),
}

/// Runs one build: load the previous map, settle every image and save the
/// assembled map.
///
/// `site` is the backend rooted at the site source, `cache` the map
/// repository. Images that fail are logged, summarised and left out of the
/// map; only discovery and map I/O failures abort the build.
pub async fn build(ctx: &Context, site: &BackendHandle, cache: &Repository) -> Result<Outcome> {
    if !ctx.enabled {
        cache.ensure_exists().await.or_raise(|| ErrorKind::Cache)?;
        tracing::info!(path = %cache.path().display(), "Skipped");
        return Ok(Outcome::Disabled);
    }

    if ctx.fresh_for > Duration::ZERO
        && let Some(info) = cache.stat().await.or_raise(|| ErrorKind::Cache)?
        && UtcDateTime::now() - info.modified < ctx.fresh_for
    {
        tracing::info!(path = %cache.path().display(), "skipped, fresh cache found");
        return Ok(Outcome::FreshCache);
    }

    tracing::info!("Prepare to generate hashes for images...");
    let previous = cache.load().await;
    let mut summary = Summary::default();
    let mut entries = Vec::new();

    let mut events = std::pin::pin!(scan(site, &previous, ctx));
    while let Some(event) = events.next().await {
        match event {
            Ok(ScanEvent::DiscoveryComplete(count)) => tracing::debug!(count, "Discovery complete"),
            Ok(ScanEvent::Scanned(scan)) => {
                let Scan { key, record, effort } = *scan;
                tracing::debug!(key = %key, effort = %effort, "Scanned");
                summary.count(effort);
                entries.push((key, record));
            },
            Ok(ScanEvent::Started | ScanEvent::Complete) => {},
            Err(e) => match e.failed_path() {
                Some(path) => {
                    tracing::warn!(path = %path.display(), error = ?e, "Unable to hash image; skipping");
                    summary.failures.push(Failure { path, error: e });
                },
                None => return Err(e),
            },
        }
    }

    let map = CacheMap::assemble(entries);
    cache.save(&map).await.or_raise(|| ErrorKind::Cache)?;

    tracing::info!(
        images = summary.images(),
        reused = summary.reused,
        revalidated = summary.revalidated,
        generated = summary.generated,
        failed = summary.failures.len(),
        "{summary}"
    );
    if !summary.failures.is_empty() {
        let list: Vec<String> = summary.failures.iter().map(|f| format!("  - {}", f.path.display())).collect();
        tracing::warn!("{} images could not be hashed:\n{}", summary.failures.len(), list.join("\n"));
    }
    Ok(Outcome::Built(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, png};
    use std::path::Path;
    use std::sync::Arc;
    use thumbmap_cache::{DEFAULT_MAP_PATH, FreshnessPolicy, Site};
    use thumbmap_storage::StorageBackend;
    use thumbmap_storage::backend::{LocalBackend, MockBackend, ReadOnlyBackend};

    struct Fixture {
        site_mock: Arc<MockBackend>,
        site: BackendHandle,
        cache_mock: Arc<MockBackend>,
        cache: Repository,
    }

    fn fixture(files: Vec<(&str, Vec<u8>)>) -> Fixture {
        let site_mock = Arc::new(MockBackend::with_files(files).with_name("site"));
        let cache_mock = Arc::new(MockBackend::default().with_name("cache"));
        Fixture {
            site: site_mock.clone(),
            site_mock,
            cache: Repository::with_default_path(cache_mock.clone()),
            cache_mock,
        }
    }

    fn images() -> Vec<(&'static str, Vec<u8>)> {
        vec![
            ("public/a.png", png(120, 80, 10)),
            ("public/my photo.png", png(80, 120, 90)),
            ("笔记/img/b.png", png(64, 64, 170)),
        ]
    }

    fn built(outcome: Outcome) -> Summary {
        match outcome {
            Outcome::Built(summary) => summary,
            other => panic!("expected a build, got {other:?}"),
        }
    }

    async fn map_bytes(fixture: &Fixture) -> Vec<u8> {
        fixture.cache_mock.read(Path::new(DEFAULT_MAP_PATH)).await.unwrap()
    }

    #[tokio::test]
    async fn test_second_build_is_identical_and_reused() {
        let fixture = fixture(images());
        let ctx = context();
        let first = built(build(&ctx, &fixture.site, &fixture.cache).await.unwrap());
        assert_eq!((first.images(), first.generated, first.reused), (3, 3, 0));
        let first_bytes = map_bytes(&fixture).await;

        let second = built(build(&ctx, &fixture.site, &fixture.cache).await.unwrap());
        assert_eq!((second.images(), second.generated, second.reused), (3, 0, 3));
        assert_eq!(map_bytes(&fixture).await, first_bytes);
        assert_eq!(second.to_string(), "Done. (3 images, 3 reused, 0 generated, 0 failed)");
    }

    #[tokio::test]
    async fn test_rebuild_over_local_files_reuses_everything() {
        let temp_dir = tempfile::tempdir().unwrap();
        let base = std::time::UNIX_EPOCH + std::time::Duration::from_nanos(1_760_000_000_047_515_900);
        for (index, (path, bytes)) in images().into_iter().enumerate() {
            let absolute = temp_dir.path().join(path);
            std::fs::create_dir_all(absolute.parent().unwrap()).unwrap();
            std::fs::write(&absolute, bytes).unwrap();
            let mtime = base + std::time::Duration::from_nanos(7_919 * index as u64);
            std::fs::File::options().write(true).open(&absolute).unwrap().set_modified(mtime).unwrap();
        }
        #[cfg(unix)]
        std::os::unix::fs::symlink("gone", temp_dir.path().join("public/.#draft.md")).unwrap();

        let site: BackendHandle = Arc::new(LocalBackend::new("site", temp_dir.path()).unwrap());
        let cache_root = temp_dir.path().join(".vitepress/cache");
        let cache = Repository::with_default_path(Arc::new(LocalBackend::new("cache", &cache_root).unwrap()));
        let ctx = Context { site: Site::new(temp_dir.path(), "assets", "/"), ..context() };

        let first = built(build(&ctx, &site, &cache).await.unwrap());
        assert_eq!((first.images(), first.generated), (3, 3));
        let first_bytes = std::fs::read(cache_root.join(DEFAULT_MAP_PATH)).unwrap();

        let second = built(build(&ctx, &site, &cache).await.unwrap());
        assert_eq!(second.reused, second.images());
        assert_eq!(second.images(), 3);
        assert_eq!(std::fs::read(cache_root.join(DEFAULT_MAP_PATH)).unwrap(), first_bytes);
    }

    #[tokio::test]
    async fn test_changed_image_is_the_only_one_regenerated() {
        let fixture = fixture(images());
        let ctx = context();
        build(&ctx, &fixture.site, &fixture.cache).await.unwrap();
        let before = fixture.cache.load().await;

        fixture.site_mock.write(Path::new("public/a.png"), &png(120, 80, 250)).await.unwrap();
        let summary = built(build(&ctx, &fixture.site, &fixture.cache).await.unwrap());
        assert_eq!((summary.generated, summary.reused), (1, 2));

        let after = fixture.cache.load().await;
        assert_ne!(after.get("public/a.png").unwrap().asset_full_hash, before.get("public/a.png").unwrap().asset_full_hash);
        assert_eq!(after.get("笔记/img/b.png"), before.get("笔记/img/b.png"));
        assert_eq!(after.get("public/my photo.png"), before.get("public/my photo.png"));
    }

    #[tokio::test]
    async fn test_map_holds_every_variant() {
        let fixture = fixture(images());
        build(&context(), &fixture.site, &fixture.cache).await.unwrap();
        let map = fixture.cache.load().await;
        // Two keys for each path without spaces, four for the one with.
        assert_eq!(map.len(), 2 + 4 + 2);
        let raw = map.get("public/my photo.png").unwrap();
        for key in ["/public/my photo.png", "public/my%20photo.png", "/public/my%20photo.png"] {
            let variant = map.get(key).unwrap();
            assert_eq!(variant.asset_file_name, key);
            assert!(variant.same_image_as(raw));
        }
    }

    #[tokio::test]
    async fn test_disabled_only_ensures_map() {
        let fixture = fixture(images());
        let ctx = Context { enabled: false, ..context() };
        let outcome = build(&ctx, &fixture.site, &fixture.cache).await.unwrap();
        assert!(matches!(outcome, Outcome::Disabled));
        assert_eq!(map_bytes(&fixture).await, b"{}");
    }

    #[tokio::test]
    async fn test_disabled_keeps_existing_map() {
        let fixture = fixture(images());
        build(&context(), &fixture.site, &fixture.cache).await.unwrap();
        let existing = map_bytes(&fixture).await;
        build(&Context { enabled: false, ..context() }, &fixture.site, &fixture.cache).await.unwrap();
        assert_eq!(map_bytes(&fixture).await, existing);
    }

    #[tokio::test]
    async fn test_base_path() {
        let fixture = fixture(images());
        let ctx = Context { site: Site::new("/srv/docs", "assets", "/docs/"), ..context() };
        build(&ctx, &fixture.site, &fixture.cache).await.unwrap();
        let record = fixture.cache.load().await.get("public/a.png").cloned().unwrap();
        assert_eq!(record.asset_url, "assets/public/a.png");
        assert_eq!(record.asset_url_with_base, "/docs/assets/public/a.png");
        assert_eq!(record.asset_url_with_base.matches("docs").count(), 1);
        assert_eq!(record.asset_full_file_name, "/srv/docs/public/a.png");
    }

    #[tokio::test]
    async fn test_malformed_map_is_rebuilt() {
        let fixture = fixture(images());
        fixture.cache_mock.write(Path::new(DEFAULT_MAP_PATH), b"{ oops").await.unwrap();
        let summary = built(build(&context(), &fixture.site, &fixture.cache).await.unwrap());
        assert_eq!(summary.generated, 3);
        assert_eq!(fixture.cache.read().await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_corrupt_image_is_isolated() {
        let mut files = images();
        files.push(("public/broken.png", b"definitely not an image".to_vec()));
        let fixture = fixture(files);
        let summary = built(build(&context(), &fixture.site, &fixture.cache).await.unwrap());
        assert_eq!(summary.images(), 4);
        assert_eq!(summary.generated, 3);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, Path::new("public/broken.png"));
        let map = fixture.cache.load().await;
        assert!(map.get("public/broken.png").is_none());
        assert!(map.get("public/a.png").is_some());
    }

    #[tokio::test]
    async fn test_touched_files_by_policy() {
        for (policy, revalidated, generated) in [(FreshnessPolicy::Content, 3, 0), (FreshnessPolicy::Metadata, 0, 3)] {
            let fixture = fixture(images());
            let ctx = Context { policy, ..context() };
            build(&ctx, &fixture.site, &fixture.cache).await.unwrap();
            for (path, _) in images() {
                fixture.site_mock.touch(path, UtcDateTime::now() + Duration::hours(1)).await.unwrap();
            }
            let summary = built(build(&ctx, &fixture.site, &fixture.cache).await.unwrap());
            assert_eq!((summary.revalidated, summary.generated), (revalidated, generated), "{policy}");
        }
    }

    #[tokio::test]
    async fn test_fresh_map_window() {
        let fixture = fixture(images());
        build(&context(), &fixture.site, &fixture.cache).await.unwrap();
        let ctx = Context { fresh_for: Duration::minutes(2), ..context() };
        assert!(matches!(build(&ctx, &fixture.site, &fixture.cache).await.unwrap(), Outcome::FreshCache));

        fixture.cache_mock.touch(DEFAULT_MAP_PATH, UtcDateTime::now() - Duration::minutes(5)).await.unwrap();
        assert!(matches!(build(&ctx, &fixture.site, &fixture.cache).await.unwrap(), Outcome::Built(_)));
    }

    #[tokio::test]
    async fn test_dry_run_leaves_cache_untouched() {
        let fixture = fixture(images());
        let read_only = Repository::with_default_path(Arc::new(ReadOnlyBackend::new(fixture.cache_mock.clone())));
        let summary = built(build(&context(), &fixture.site, &read_only).await.unwrap());
        assert_eq!(summary.generated, 3);
        assert!(fixture.cache_mock.list(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unreadable_roots_abort() {
        let fixture = fixture(images());
        let ctx = Context { content_roots: vec!["../outside".to_string()], ..context() };
        let err = build(&ctx, &fixture.site, &fixture.cache).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Discovery);
        assert!(fixture.cache_mock.list(None).await.unwrap().is_empty());
    }
}
