//! Cache coordinator.
//!
//! Owns the response cache, the post snapshot and the background task that
//! populates the snapshot from upstream. Route handlers only talk to this
//! type.

use std::sync::{Arc, Mutex};
use std::time::Instant;

use metrics::{counter, histogram};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::application::projection::project_summary;
use crate::application::upstream::ContentSource;
use crate::domain::paging::PageRequest;
use crate::domain::posts::{CacheItem, Post, PostResponse};
use crate::domain::search::SearchQuery;

use super::config::CacheConfig;
use super::keys::RequestKey;
use super::lock::mutex_lock;
use super::metric_names::{POPULATION_MS, POPULATION_RUNS, RESPONSE_HIT, RESPONSE_MISS};
use super::snapshot::{PopulationStatus, SnapshotStore};
use super::store::{Epoch, ResponseStore};

const SOURCE: &str = "cache::coordinator";

#[derive(Default)]
struct Population {
    generation: u64,
    task: Option<JoinHandle<()>>,
}

pub struct CacheCoordinator {
    config: CacheConfig,
    source: Arc<dyn ContentSource>,
    responses: ResponseStore,
    snapshot: Arc<SnapshotStore>,
    population: Mutex<Population>,
}

impl CacheCoordinator {
    /// Build a coordinator and start the first snapshot population.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(source: Arc<dyn ContentSource>, config: CacheConfig) -> Arc<Self> {
        let coordinator = Arc::new(Self {
            config,
            source,
            responses: ResponseStore::new(),
            snapshot: Arc::new(SnapshotStore::new()),
            population: Mutex::new(Population::default()),
        });
        coordinator.start_population();
        coordinator
    }

    /// Clear the response cache and repopulate the snapshot in the background.
    ///
    /// The clear is complete when this returns; the snapshot is not.
    pub fn refresh(&self) {
        let cleared = self.responses.clear();
        let generation = self.start_population();
        info!(
            target = "postcache::cache",
            cleared,
            generation,
            "Response cache cleared; snapshot repopulation started"
        );
    }

    pub fn get(&self, key: &RequestKey) -> Option<Arc<CacheItem>> {
        let hit = self.responses.get(key);
        if hit.is_some() {
            counter!(RESPONSE_HIT).increment(1);
        } else {
            counter!(RESPONSE_MISS).increment(1);
        }
        hit
    }

    /// Epoch to pair with a later [`CacheCoordinator::set`] for the same miss.
    pub fn epoch(&self) -> Epoch {
        self.responses.epoch()
    }

    /// Memoize `item`, unless a refresh happened since `epoch` was taken.
    pub fn set(&self, epoch: Epoch, key: RequestKey, item: CacheItem) {
        if !self.responses.set(epoch, key, item) {
            info!(
                target = "postcache::cache",
                "Discarded response fetched before the last refresh"
            );
        }
    }

    /// Search the snapshot. `None` means the snapshot cannot be trusted right
    /// now and the caller must ask upstream; it never means "no matches".
    pub fn search(&self, query: &SearchQuery, request: PageRequest) -> Option<PostResponse> {
        self.snapshot.search(query, request)
    }

    pub fn status(&self) -> PopulationStatus {
        self.snapshot.status()
    }

    /// Resolve once the current population run has finished either way.
    pub async fn settled(&self) -> PopulationStatus {
        self.snapshot.settled().await
    }

    pub fn cached_responses(&self) -> usize {
        self.responses.len()
    }

    fn start_population(&self) -> u64 {
        let mut population = mutex_lock(&self.population, SOURCE, "start_population");
        population.generation += 1;
        let generation = population.generation;

        self.snapshot.begin(generation);
        let task = tokio::spawn(populate(
            Arc::clone(&self.source),
            Arc::clone(&self.snapshot),
            self.config.clone(),
            generation,
        ));
        if let Some(previous) = population.task.replace(task) {
            previous.abort();
        }
        generation
    }
}

impl Drop for CacheCoordinator {
    fn drop(&mut self) {
        let population = mutex_lock(&self.population, SOURCE, "drop");
        if let Some(task) = population.task.as_ref() {
            task.abort();
        }
    }
}

async fn populate(
    source: Arc<dyn ContentSource>,
    snapshot: Arc<SnapshotStore>,
    config: CacheConfig,
    generation: u64,
) {
    let started_at = Instant::now();
    let attempts = config.attempts();

    for attempt in 1..=attempts {
        match source.all_posts().await {
            Ok(raw) => {
                let posts: Vec<Post> = raw.into_iter().map(project_summary).collect();
                let count = posts.len();
                if snapshot.commit(generation, attempt, posts) {
                    counter!(POPULATION_RUNS, "outcome" => "success").increment(1);
                    histogram!(POPULATION_MS)
                        .record(started_at.elapsed().as_secs_f64() * 1000.0);
                    info!(
                        target = "postcache::cache",
                        generation,
                        attempt,
                        posts = count,
                        "Snapshot populated"
                    );
                }
                return;
            }
            Err(err) => {
                warn!(
                    target = "postcache::cache",
                    generation,
                    attempt,
                    max_attempts = attempts,
                    error = %err,
                    "Failed to fetch posts for snapshot"
                );
                snapshot.record_failure(generation, attempt, err.to_string());
                if attempt < attempts {
                    tokio::time::sleep(config.backoff(attempt)).await;
                }
            }
        }
    }

    if snapshot.fail(generation) {
        counter!(POPULATION_RUNS, "outcome" => "failure").increment(1);
        error!(
            target = "postcache::cache",
            generation,
            attempts,
            "Snapshot population gave up; search falls back to upstream"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::application::upstream::{
        BrowsePosts, RawPost, RawPostPage, RawTag, UpstreamError,
    };
    use crate::cache::snapshot::PopulationState;
    use crate::domain::posts::{Tag, TagResponse};

    /// Serves a fixed post list after `failures` failed calls.
    struct FlakySource {
        failures: usize,
        calls: AtomicUsize,
        posts: Vec<RawPost>,
    }

    impl FlakySource {
        fn new(failures: usize, slugs: &[&str]) -> Self {
            Self {
                failures,
                calls: AtomicUsize::new(0),
                posts: slugs
                    .iter()
                    .map(|slug| RawPost {
                        id: format!("id-{slug}"),
                        slug: slug.to_string(),
                        title: format!("Title {slug}"),
                        custom_excerpt: None,
                        feature_image: None,
                        feature_image_alt: None,
                        published_at: None,
                        html: None,
                        tags: None,
                    })
                    .collect(),
            }
        }
    }

    #[async_trait]
    impl ContentSource for FlakySource {
        async fn browse_posts(&self, _request: &BrowsePosts) -> Result<RawPostPage, UpstreamError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(UpstreamError::unavailable("connection refused"));
            }
            Ok(RawPostPage {
                posts: self.posts.clone(),
                pagination: None,
            })
        }

        async fn read_post(&self, slug: &str) -> Result<RawPost, UpstreamError> {
            Err(UpstreamError::failure(format!("no post `{slug}`")))
        }

        async fn browse_tags(&self) -> Result<Vec<RawTag>, UpstreamError> {
            Ok(Vec::new())
        }
    }

    fn fast_config(max_retries: u32) -> CacheConfig {
        CacheConfig {
            max_retries,
            retry_base_delay_ms: 1,
            retry_max_delay_ms: 2,
        }
    }

    fn tags_item() -> CacheItem {
        CacheItem::Tags(TagResponse {
            tags: vec![Tag {
                id: "1".into(),
                slug: "rust".into(),
                name: "Rust".into(),
                description: None,
                accent_color: None,
            }],
        })
    }

    fn everything() -> (SearchQuery, PageRequest) {
        (
            SearchQuery::default(),
            PageRequest::parse("10", "1").expect("page"),
        )
    }

    #[tokio::test]
    async fn populates_snapshot_on_spawn() {
        let source = Arc::new(FlakySource::new(0, &["a", "b"]));
        let cache = CacheCoordinator::spawn(source, fast_config(3));

        let status = cache.settled().await;
        assert_eq!(status.state, PopulationState::Ready);
        assert_eq!(status.posts, 2);

        let (query, page) = everything();
        let response = cache.search(&query, page).expect("snapshot ready");
        assert_eq!(response.posts.len(), 2);
    }

    #[tokio::test]
    async fn retries_until_success() {
        let source = Arc::new(FlakySource::new(2, &["a"]));
        let cache = CacheCoordinator::spawn(source.clone(), fast_config(5));

        let status = cache.settled().await;
        assert_eq!(status.state, PopulationState::Ready);
        assert_eq!(status.attempts, 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn search_is_gated_after_exhausting_retries() {
        let source = Arc::new(FlakySource::new(usize::MAX, &["a"]));
        let cache = CacheCoordinator::spawn(source.clone(), fast_config(3));

        let status = cache.settled().await;
        assert_eq!(status.state, PopulationState::Failed);
        assert_eq!(status.attempts, 3);
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(status.last_error.is_some());

        let (query, page) = everything();
        assert!(cache.search(&query, page).is_none());
    }

    #[tokio::test]
    async fn refresh_clears_previously_set_keys() {
        let source = Arc::new(FlakySource::new(0, &["a"]));
        let cache = CacheCoordinator::spawn(source, fast_config(1));
        cache.settled().await;

        let key = RequestKey::new("/api/tags", None);
        cache.set(cache.epoch(), key.clone(), tags_item());
        assert!(cache.get(&key).is_some());

        cache.refresh();
        assert!(cache.get(&key).is_none());
        assert_eq!(cache.cached_responses(), 0);
    }

    #[tokio::test]
    async fn set_with_epoch_from_before_refresh_is_discarded() {
        let source = Arc::new(FlakySource::new(0, &["a"]));
        let cache = CacheCoordinator::spawn(source, fast_config(1));

        let epoch = cache.epoch();
        cache.refresh();
        let key = RequestKey::new("/api/tags", None);
        cache.set(epoch, key.clone(), tags_item());

        assert!(cache.get(&key).is_none());
    }

    #[tokio::test]
    async fn repeated_refresh_converges_to_same_state() {
        let source = Arc::new(FlakySource::new(0, &["a", "b", "c"]));
        let cache = CacheCoordinator::spawn(source, fast_config(1));
        let first = cache.settled().await;

        cache.refresh();
        cache.refresh();
        let second = cache.settled().await;

        assert_eq!(second.state, PopulationState::Ready);
        assert_eq!(second.posts, first.posts);
        assert_eq!(second.generation, 3);
        let (query, page) = everything();
        assert_eq!(
            cache.search(&query, page).expect("ready").posts.len(),
            first.posts
        );
    }

    #[tokio::test]
    async fn failed_refresh_keeps_stale_snapshot() {
        let source = Arc::new(FlakySource::new(0, &["a", "b"]));
        let cache = CacheCoordinator::spawn(source, fast_config(2));
        cache.settled().await;

        // Same snapshot behind an upstream that now always fails.
        let failing = Arc::new(FlakySource::new(usize::MAX, &[]));
        let cache = CacheCoordinator {
            config: fast_config(2),
            source: failing,
            responses: ResponseStore::new(),
            snapshot: Arc::clone(&cache.snapshot),
            population: Mutex::new(Population {
                generation: cache.status().generation,
                task: None,
            }),
        };
        cache.refresh();

        let status = cache.settled().await;
        assert_eq!(status.state, PopulationState::Failed);
        assert_eq!(status.posts, 2);
        let (query, page) = everything();
        assert!(cache.search(&query, page).is_none());
    }
}
