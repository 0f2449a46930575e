//! Best-effort background preload
//!
//! The coordinator deduplicates and schedules prefetch of a URL's leading
//! bytes against an external download/cache backend. It is an explicit
//! context object with its own bounded worker pool; callers hold it for the
//! lifetime of the hosting session.
//!
//! Failure policy: preload must never block or fail playback. Parse and
//! network errors on this path are logged and swallowed; an over-full queue
//! drops requests instead of waiting.

use crate::{
    adaptation::{create_logic, AdaptiveOptions, LogicKind},
    manifest::{create_parser, detect_format},
    Result,
};
use async_trait::async_trait;
use reqwest::header::RANGE;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

/// External download/cache subsystem seam.
///
/// Implementations must be safe to call concurrently from every worker.
#[async_trait]
pub trait PrefetchBackend: Send + Sync {
    /// Whether the URL's content is already resident in the local cache
    async fn is_cached(&self, url: &str) -> bool;

    /// Fetch up to `max_bytes` leading bytes of `url` into the cache,
    /// returning the number of bytes moved
    async fn fetch_leading_bytes(&self, url: &str, max_bytes: u64) -> Result<u64>;
}

/// Preload coordinator configuration
#[derive(Debug, Clone, Copy)]
pub struct PreloadConfig {
    /// Concurrent preload tasks process-wide
    pub workers: usize,
    /// Bounded submission queue depth; excess requests are dropped
    pub queue_depth: usize,
    /// How much of each resource to prefetch
    pub leading_bytes: u64,
    /// Variant used to resolve a manifest to one representation. Lowest
    /// keeps prefetch cost minimal.
    pub logic: LogicKind,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_depth: 32,
            leading_bytes: 512 * 1024,
            logic: LogicKind::AlwaysLowest,
        }
    }
}

#[derive(Debug)]
struct PreloadJob {
    id: Uuid,
    url: String,
}

/// Deduplicating, bounded, fire-and-forget prefetch scheduler
pub struct PreloadCoordinator {
    config: PreloadConfig,
    inflight: Arc<Mutex<HashSet<String>>>,
    tx: mpsc::Sender<PreloadJob>,
    workers: Vec<JoinHandle<()>>,
}

impl PreloadCoordinator {
    /// Create the coordinator and spawn its worker pool. Must be called
    /// within a tokio runtime.
    pub fn new(backend: Arc<dyn PrefetchBackend>, config: PreloadConfig) -> Self {
        let (tx, rx) = mpsc::channel::<PreloadJob>(config.queue_depth.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let inflight: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));

        let workers = (0..config.workers.max(1))
            .map(|worker| {
                let rx = Arc::clone(&rx);
                let backend = Arc::clone(&backend);
                let inflight = Arc::clone(&inflight);
                let leading_bytes = config.leading_bytes;
                tokio::spawn(async move {
                    loop {
                        let job = { rx.lock().await.recv().await };
                        let Some(job) = job else { break };
                        Self::run_job(&*backend, &job, leading_bytes, worker).await;
                        inflight
                            .lock()
                            .expect("inflight lock poisoned")
                            .remove(&job.url);
                    }
                })
            })
            .collect();

        Self {
            config,
            inflight,
            tx,
            workers,
        }
    }

    async fn run_job(backend: &dyn PrefetchBackend, job: &PreloadJob, leading_bytes: u64, worker: usize) {
        if backend.is_cached(&job.url).await {
            debug!(task = %job.id, url = %job.url, "already cached, skipping");
            return;
        }
        match backend.fetch_leading_bytes(&job.url, leading_bytes).await {
            Ok(bytes) => {
                debug!(task = %job.id, url = %job.url, bytes, worker, "preload complete");
            }
            Err(e) => {
                // Swallowed: preload failures never reach the caller
                warn!(task = %job.id, url = %job.url, code = e.error_code(), "preload failed: {e}");
            }
        }
    }

    /// Request best-effort prefetch of `url`'s leading bytes.
    ///
    /// At most one preload task per distinct URL is in flight at any time; a
    /// repeated request for an in-flight URL is a no-op, as is any request
    /// that does not fit the bounded queue.
    pub fn preload_url(&self, url: &str) {
        if url.is_empty() {
            debug!("ignoring empty preload url");
            return;
        }
        {
            let mut inflight = self.inflight.lock().expect("inflight lock poisoned");
            if !inflight.insert(url.to_string()) {
                debug!(url, "preload already in flight");
                return;
            }
        }
        let job = PreloadJob {
            id: Uuid::new_v4(),
            url: url.to_string(),
        };
        if self.tx.try_send(job).is_err() {
            self.inflight
                .lock()
                .expect("inflight lock poisoned")
                .remove(url);
            debug!(url, "preload queue full, request dropped");
        }
    }

    /// Parse a manifest payload and prefetch its resolved representation.
    ///
    /// Opportunistic: a manifest that fails to parse is dropped silently;
    /// validity errors surface through the playback-start path where the
    /// same parser runs again.
    pub fn preload_manifest(&self, raw: &str) {
        let playlist = match create_parser(detect_format(raw)).parse(raw) {
            Ok(playlist) => playlist,
            Err(e) => {
                debug!(code = e.error_code(), "preload manifest dropped: {e}");
                return;
            }
        };
        let logic = create_logic(self.config.logic, AdaptiveOptions::default());
        match logic.initial_representation(&playlist, 0) {
            Ok(index) => self.preload_url(&playlist.representations()[index].url),
            Err(e) => debug!(code = e.error_code(), "preload selection dropped: {e}"),
        }
    }

    /// URLs currently queued or being fetched
    pub fn in_flight_count(&self) -> usize {
        self.inflight.lock().expect("inflight lock poisoned").len()
    }

    /// Stop accepting requests, drain the queue, and join the workers.
    /// Session teardown, not a cancellation API: queued work still runs.
    pub async fn close(self) {
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.await;
        }
    }
}

/// Plain HTTP prefetch backend issuing Range requests.
///
/// Stands in for a real download/cache subsystem: it remembers which URLs it
/// has completed so `is_cached` answers true for them, but the bytes
/// themselves are discarded after counting.
pub struct HttpPrefetcher {
    client: reqwest::Client,
    completed: Mutex<HashSet<String>>,
}

impl HttpPrefetcher {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            completed: Mutex::new(HashSet::new()),
        }
    }
}

impl Default for HttpPrefetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PrefetchBackend for HttpPrefetcher {
    async fn is_cached(&self, url: &str) -> bool {
        self.completed
            .lock()
            .expect("completed lock poisoned")
            .contains(url)
    }

    async fn fetch_leading_bytes(&self, url: &str, max_bytes: u64) -> Result<u64> {
        let parsed = url::Url::parse(url)?;
        let response = self
            .client
            .get(parsed)
            .header(RANGE, format!("bytes=0-{}", max_bytes.saturating_sub(1)))
            .send()
            .await?
            .error_for_status()?;
        let body = response.bytes().await?;
        let fetched = (body.len() as u64).min(max_bytes);
        self.completed
            .lock()
            .expect("completed lock poisoned")
            .insert(url.to_string());
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingBackend {
        fetches: AtomicUsize,
        urls: Mutex<Vec<String>>,
        cached: HashSet<String>,
    }

    impl CountingBackend {
        fn new() -> Self {
            Self {
                fetches: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
                cached: HashSet::new(),
            }
        }

        fn with_cached(urls: &[&str]) -> Self {
            let mut backend = Self::new();
            backend.cached = urls.iter().map(|u| u.to_string()).collect();
            backend
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PrefetchBackend for CountingBackend {
        async fn is_cached(&self, url: &str) -> bool {
            self.cached.contains(url)
        }

        async fn fetch_leading_bytes(&self, url: &str, max_bytes: u64) -> Result<u64> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            Ok(max_bytes.min(1024))
        }
    }

    #[tokio::test]
    async fn test_rapid_duplicate_requests_fetch_once() {
        let backend = Arc::new(CountingBackend::new());
        let coordinator = PreloadCoordinator::new(backend.clone(), PreloadConfig::default());

        // No await between these: the second sees the first in flight
        coordinator.preload_url("https://cdn.example.com/a.mp4");
        coordinator.preload_url("https://cdn.example.com/a.mp4");

        coordinator.close().await;
        assert_eq!(backend.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_distinct_urls_all_fetched() {
        let backend = Arc::new(CountingBackend::new());
        let coordinator = PreloadCoordinator::new(backend.clone(), PreloadConfig::default());

        coordinator.preload_url("https://cdn.example.com/a.mp4");
        coordinator.preload_url("https://cdn.example.com/b.mp4");
        coordinator.preload_url("https://cdn.example.com/c.mp4");

        coordinator.close().await;
        assert_eq!(backend.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_queue_overflow_drops_silently() {
        let backend = Arc::new(CountingBackend::new());
        let coordinator = PreloadCoordinator::new(
            backend.clone(),
            PreloadConfig {
                workers: 1,
                queue_depth: 1,
                ..PreloadConfig::default()
            },
        );

        // Submitted without yielding: only one fits the bounded queue
        coordinator.preload_url("https://cdn.example.com/a.mp4");
        coordinator.preload_url("https://cdn.example.com/b.mp4");
        coordinator.preload_url("https://cdn.example.com/c.mp4");

        coordinator.close().await;
        assert_eq!(backend.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_dropped_request_can_be_retried() {
        let backend = Arc::new(CountingBackend::new());
        let coordinator = PreloadCoordinator::new(
            backend.clone(),
            PreloadConfig {
                workers: 1,
                queue_depth: 1,
                ..PreloadConfig::default()
            },
        );

        coordinator.preload_url("https://cdn.example.com/a.mp4");
        coordinator.preload_url("https://cdn.example.com/b.mp4"); // dropped
        assert_eq!(coordinator.in_flight_count(), 1);

        // Let the pool drain, then the dropped URL is accepted again
        tokio::time::sleep(Duration::from_millis(50)).await;
        coordinator.preload_url("https://cdn.example.com/b.mp4");

        coordinator.close().await;
        assert_eq!(backend.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_cached_url_is_not_fetched() {
        let backend = Arc::new(CountingBackend::with_cached(&[
            "https://cdn.example.com/a.mp4",
        ]));
        let coordinator = PreloadCoordinator::new(backend.clone(), PreloadConfig::default());

        coordinator.preload_url("https://cdn.example.com/a.mp4");

        coordinator.close().await;
        assert_eq!(backend.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_preload_manifest_resolves_lowest_representation() {
        let backend = Arc::new(CountingBackend::new());
        let coordinator = PreloadCoordinator::new(backend.clone(), PreloadConfig::default());

        coordinator.preload_manifest(
            r#"{ "adaptationSet": { "representations": [
                { "url": "https://cdn.example.com/sd.mp4", "avgBitrate": 500000,
                  "width": 640, "height": 360 },
                { "url": "https://cdn.example.com/hd.mp4", "avgBitrate": 1500000,
                  "width": 1280, "height": 720 }
            ] } }"#,
        );

        coordinator.close().await;
        assert_eq!(backend.fetch_count(), 1);
        assert_eq!(
            backend.urls.lock().unwrap().as_slice(),
            ["https://cdn.example.com/sd.mp4"]
        );
    }

    #[tokio::test]
    async fn test_preload_malformed_manifest_is_silent() {
        let backend = Arc::new(CountingBackend::new());
        let coordinator = PreloadCoordinator::new(backend.clone(), PreloadConfig::default());

        coordinator.preload_manifest("{ not a manifest");
        coordinator.preload_manifest(r#"{"adaptationSet":{"representations":[]}}"#);

        coordinator.close().await;
        assert_eq!(backend.fetch_count(), 0);
    }

    #[tokio::test]
    async fn test_fetch_error_clears_inflight() {
        struct FailingBackend;

        #[async_trait]
        impl PrefetchBackend for FailingBackend {
            async fn is_cached(&self, _url: &str) -> bool {
                false
            }

            async fn fetch_leading_bytes(&self, _url: &str, _max_bytes: u64) -> Result<u64> {
                Err(crate::Error::ManifestParse("boom".to_string()))
            }
        }

        let coordinator =
            PreloadCoordinator::new(Arc::new(FailingBackend), PreloadConfig::default());
        coordinator.preload_url("https://cdn.example.com/a.mp4");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(coordinator.in_flight_count(), 0);
        coordinator.close().await;
    }
}
