use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use metrics_util::debugging::DebuggingRecorder;
use postcache::application::upstream::{
    BrowsePosts, ContentSource, RawPost, RawPostPage, RawTag, UpstreamError,
};
use postcache::cache::{CacheConfig, CacheCoordinator};
use postcache::config::CorsSettings;
use postcache::infra::http::{HttpState, build_router};
use tower::ServiceExt;

#[derive(Default)]
struct Upstream {
    down: AtomicBool,
}

#[async_trait]
impl ContentSource for Upstream {
    async fn browse_posts(&self, _request: &BrowsePosts) -> Result<RawPostPage, UpstreamError> {
        Ok(RawPostPage {
            posts: Vec::new(),
            pagination: None,
        })
    }

    async fn read_post(&self, slug: &str) -> Result<RawPost, UpstreamError> {
        Err(UpstreamError::failure(format!("no post `{slug}`")))
    }

    async fn browse_tags(&self) -> Result<Vec<RawTag>, UpstreamError> {
        Ok(Vec::new())
    }

    async fn all_posts(&self) -> Result<Vec<RawPost>, UpstreamError> {
        if self.down.load(Ordering::SeqCst) {
            Err(UpstreamError::unavailable("down"))
        } else {
            Ok(Vec::new())
        }
    }
}

fn config() -> CacheConfig {
    CacheConfig {
        max_retries: 1,
        retry_base_delay_ms: 1,
        retry_max_delay_ms: 1,
    }
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    let healthy = CacheCoordinator::spawn(Arc::new(Upstream::default()), config());
    healthy.settled().await;

    let broken_upstream = Arc::new(Upstream::default());
    broken_upstream.down.store(true, Ordering::SeqCst);
    let broken = CacheCoordinator::spawn(broken_upstream.clone(), config());
    broken.settled().await;

    let app = build_router(
        HttpState {
            cache: broken,
            upstream: broken_upstream,
            webhook: None,
        },
        &CorsSettings::Any,
    );
    for uri in ["/api/tags", "/api/tags", "/api/posts/search/5/1?search=rust"] {
        let request = Request::get(uri)
            .body(Body::empty())
            .expect("request should build");
        let response = app
            .clone()
            .oneshot(request)
            .await
            .expect("router should respond");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "postcache_response_cache_hit_total",
        "postcache_response_cache_miss_total",
        "postcache_snapshot_population_total",
        "postcache_snapshot_population_ms",
        "postcache_search_fallback_total",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
