use crate::Context;
use crate::error::Result;
use crate::scan::discover;
use crate::scan::file::{Scan, scan_file};
use async_stream::stream;
use futures::stream::FuturesUnordered;
use futures::{Stream, StreamExt};
use thumbmap_cache::CacheMap;
use thumbmap_storage::BackendHandle;

/// Progress events emitted by [`scan`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`DiscoveryComplete`](Self::DiscoveryComplete) exactly once, with the
///    number of images found.
/// 3. [`Scanned`](Self::Scanned) once per image that was settled.
/// 4. [`Complete`](Self::Complete) exactly once.
///
/// An image that fails is yielded as an `Err` of kind
/// [`Scan`](crate::error::ErrorKind::Scan) in place of its `Scanned` event and
/// the stream carries on. A discovery failure is yielded as an `Err` and ends
/// the stream without `Complete`.
#[derive(Debug)]
pub enum ScanEvent {
    Started,
    DiscoveryComplete(u64),
    Scanned(Box<Scan>),
    Complete,
}

/// Streams [`ScanEvent`]s for every image below the content roots of `ctx`.
///
/// Images are settled against `previous` concurrently, with at most
/// `ctx.concurrency` in flight. Further images are started in discovery order
/// as earlier ones finish, so results arrive in completion order.
pub fn scan<'a>(
    backend: &'a BackendHandle,
    previous: &'a CacheMap,
    ctx: &'a Context,
) -> impl Stream<Item = Result<ScanEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(ScanEvent::Started);

        let files = match discover(backend, ctx).await {
            Ok(files) => files,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        yield Ok(ScanEvent::DiscoveryComplete(u64::try_from(files.len()).unwrap_or(u64::MAX)));

        let mut pending = files.into_iter().map(|file| scan_file(backend, previous, ctx, file));
        let mut processing = FuturesUnordered::new();
        processing.extend(pending.by_ref().take(ctx.concurrency.max(1)));
        while let Some(result) = processing.next().await {
            yield result.map(|scan| ScanEvent::Scanned(Box::new(scan)));
            if let Some(next) = pending.next() {
                processing.push(next);
            }
        }

        yield Ok(ScanEvent::Complete);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{context, png};
    use std::path::PathBuf;
    use std::sync::Arc;
    use thumbmap_storage::backend::MockBackend;

    async fn collect(backend: &BackendHandle, ctx: &Context) -> Vec<Result<ScanEvent>> {
        let previous = CacheMap::new();
        scan(backend, &previous, ctx).collect().await
    }

    #[tokio::test]
    async fn test_event_order() {
        let backend: BackendHandle = Arc::new(MockBackend::with_files([
            ("public/a.png", png(10, 10, 1)),
            ("public/b.png", png(10, 20, 2)),
            ("public/c.png", png(20, 10, 3)),
        ]));
        let ctx = Context { concurrency: 2, ..context() };
        let events = collect(&backend, &ctx).await;
        assert_eq!(events.len(), 6);
        assert!(matches!(events[0], Ok(ScanEvent::Started)));
        assert!(matches!(events[1], Ok(ScanEvent::DiscoveryComplete(3))));
        let mut keys: Vec<_> = events[2..5]
            .iter()
            .map(|event| match event {
                Ok(ScanEvent::Scanned(scan)) => scan.key.clone(),
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        keys.sort();
        assert_eq!(keys, ["public/a.png", "public/b.png", "public/c.png"]);
        assert!(matches!(events[5], Ok(ScanEvent::Complete)));
    }

    #[tokio::test]
    async fn test_failure_does_not_end_stream() {
        let backend: BackendHandle = Arc::new(MockBackend::with_files([
            ("public/a.png", png(10, 10, 1)),
            ("public/broken.png", b"garbage".to_vec()),
        ]));
        let events = collect(&backend, &Context { concurrency: 1, ..context() }).await;
        let failures: Vec<_> = events.iter().filter_map(|e| e.as_ref().err()).map(|e| (**e).clone()).collect();
        assert_eq!(failures, [ErrorKind::Scan(PathBuf::from("public/broken.png"))]);
        assert!(matches!(events.last(), Some(Ok(ScanEvent::Complete))));
        let scanned = events.iter().filter(|e| matches!(e, Ok(ScanEvent::Scanned(_)))).count();
        assert_eq!(scanned, 1);
    }

    #[tokio::test]
    async fn test_discovery_failure_ends_stream() {
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let ctx = Context { content_roots: vec!["../escape".to_string()], ..context() };
        let events = collect(&backend, &ctx).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Ok(ScanEvent::Started)));
        assert!(matches!(&events[1], Err(e) if **e == ErrorKind::Discovery));
    }

    #[tokio::test]
    async fn test_nothing_to_scan() {
        let backend: BackendHandle = Arc::new(MockBackend::default());
        let events = collect(&backend, &context()).await;
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], Ok(ScanEvent::DiscoveryComplete(0))));
    }
}
