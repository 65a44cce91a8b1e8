//! Read endpoints. Each one validates its parameters, answers from the
//! response cache when it can, and otherwise asks upstream, projects the
//! result and memoizes it.

use std::sync::Arc;

use axum::{
    Json,
    extract::{OriginalUri, Path, RawQuery, State},
    response::{IntoResponse, Response},
};
use metrics::counter;
use serde::Serialize;
use tracing::debug;

use crate::application::filter::upstream_filter;
use crate::application::projection::{
    project_detail, project_pagination, project_summary, project_tag,
};
use crate::application::upstream::{BrowsePosts, RawPostPage};
use crate::cache::{Epoch, PopulationStatus, RequestKey, metric_names};
use crate::domain::paging::{PageRequest, parse_positive};
use crate::domain::posts::{CacheItem, PostReadResponse, PostResponse, TagResponse};
use crate::domain::search::SearchQuery;

use super::error::ApiError;
use super::state::HttpState;

pub async fn root() -> &'static str {
    "unrecognized endpoint"
}

pub async fn browse_posts(
    State(state): State<HttpState>,
    OriginalUri(uri): OriginalUri,
    Path(count): Path<String>,
) -> Result<Response, ApiError> {
    let count = parse_positive("count", &count)?;
    let key = RequestKey::from_uri(&uri);
    if let Some(hit) = state.cache.get(&key) {
        return Ok(cached(&hit));
    }

    let epoch = state.cache.epoch();
    let page = state
        .upstream
        .browse_posts(&BrowsePosts::latest(count))
        .await?;
    let item = CacheItem::Posts(PostResponse {
        posts: page.posts.into_iter().map(project_summary).collect(),
        meta: None,
    });
    Ok(remember(&state, epoch, key, item))
}

pub async fn browse_posts_paginated(
    State(state): State<HttpState>,
    OriginalUri(uri): OriginalUri,
    Path((count, page)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let request = PageRequest::parse(&count, &page)?;
    let key = RequestKey::from_uri(&uri);
    if let Some(hit) = state.cache.get(&key) {
        return Ok(cached(&hit));
    }

    let epoch = state.cache.epoch();
    let page = state
        .upstream
        .browse_posts(&BrowsePosts::page(request.count, request.page))
        .await?;
    Ok(remember(&state, epoch, key, paginated(page)))
}

pub async fn search_posts(
    State(state): State<HttpState>,
    OriginalUri(uri): OriginalUri,
    Path((count, page)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let request = PageRequest::parse(&count, &page)?;
    let search = SearchQuery::from_query_string(query.as_deref())?;
    let key = RequestKey::from_uri(&uri);
    if let Some(hit) = state.cache.get(&key) {
        return Ok(cached(&hit));
    }

    if let Some(local) = state.cache.search(&search, request) {
        return Ok(Json(local).into_response());
    }

    counter!(metric_names::SEARCH_FALLBACK).increment(1);
    debug!(
        target = "postcache::cache",
        key = %key,
        "Snapshot not ready; forwarding search upstream"
    );

    let epoch = state.cache.epoch();
    let browse =
        BrowsePosts::page(request.count, request.page).with_filter(upstream_filter(&search));
    let page = state.upstream.browse_posts(&browse).await?;
    Ok(remember(&state, epoch, key, paginated(page)))
}

pub async fn read_post(
    State(state): State<HttpState>,
    OriginalUri(uri): OriginalUri,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let key = RequestKey::from_uri(&uri);
    if let Some(hit) = state.cache.get(&key) {
        return Ok(cached(&hit));
    }

    let epoch = state.cache.epoch();
    let post = state.upstream.read_post(&slug).await?;
    let item = CacheItem::Post(PostReadResponse {
        post: project_detail(post),
    });
    Ok(remember(&state, epoch, key, item))
}

pub async fn list_tags(
    State(state): State<HttpState>,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let key = RequestKey::from_uri(&uri);
    if let Some(hit) = state.cache.get(&key) {
        return Ok(cached(&hit));
    }

    let epoch = state.cache.epoch();
    let tags = state.upstream.browse_tags().await?;
    let item = CacheItem::Tags(TagResponse {
        tags: tags.into_iter().map(project_tag).collect(),
    });
    Ok(remember(&state, epoch, key, item))
}

#[derive(Debug, Serialize)]
pub struct CacheStatusBody {
    #[serde(flatten)]
    pub population: PopulationStatus,
    pub cached_responses: usize,
}

pub async fn cache_status(State(state): State<HttpState>) -> Json<CacheStatusBody> {
    Json(CacheStatusBody {
        population: state.cache.status(),
        cached_responses: state.cache.cached_responses(),
    })
}

fn paginated(page: RawPostPage) -> CacheItem {
    CacheItem::Posts(PostResponse {
        posts: page.posts.into_iter().map(project_summary).collect(),
        meta: page.pagination.map(project_pagination),
    })
}

fn cached(item: &Arc<CacheItem>) -> Response {
    Json(item.as_ref()).into_response()
}

fn remember(state: &HttpState, epoch: Epoch, key: RequestKey, item: CacheItem) -> Response {
    let response = Json(&item).into_response();
    state.cache.set(epoch, key, item);
    response
}
