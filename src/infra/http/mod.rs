mod error;
mod handlers;
mod middleware;
mod state;
mod webhook;

pub use error::{ApiError, ApiErrorBody, ApiErrorMessage, codes};
pub use handlers::CacheStatusBody;
pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use state::HttpState;

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

use crate::config::CorsSettings;

use self::middleware::{log_responses, set_request_context};

pub fn build_router(state: HttpState, cors: &CorsSettings) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/posts/update", post(webhook::update_posts))
        .route("/api/posts/browse/{count}", get(handlers::browse_posts))
        .route(
            "/api/posts/browse/{count}/{page}",
            get(handlers::browse_posts_paginated),
        )
        .route(
            "/api/posts/search/{count}/{page}",
            get(handlers::search_posts),
        )
        .route("/api/posts/read/{slug}", get(handlers::read_post))
        .route("/api/tags", get(handlers::list_tags))
        .route("/api/cache/status", get(handlers::cache_status))
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
        .layer(cors_layer(cors))
}

fn cors_layer(cors: &CorsSettings) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    match cors {
        CorsSettings::Any => layer.allow_origin(Any),
        CorsSettings::Restricted(origins) => {
            let allowed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match HeaderValue::from_str(origin) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        warn!(
                            target = "postcache::http",
                            origin = %origin,
                            error = %err,
                            "Skipping unusable CORS origin"
                        );
                        None
                    }
                })
                .collect();
            layer.allow_origin(AllowOrigin::list(allowed))
        }
    }
}
