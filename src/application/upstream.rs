//! Port to the upstream content API.
//!
//! The `Raw*` types are the strict boundary shapes decoded from upstream
//! payloads. They are converted by [`crate::application::projection`] before
//! anything else touches them.

use std::num::NonZeroU32;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::posts::PageLimit;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered but reported no usable content.
    #[error("upstream reported failure: {message}")]
    Failure { message: String },
    /// The call itself failed (network, authentication, malformed payload).
    #[error("upstream unavailable: {message}")]
    Unavailable { message: String },
}

impl UpstreamError {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTag {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub accent_color: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPost {
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub custom_excerpt: Option<String>,
    #[serde(default)]
    pub feature_image: Option<String>,
    #[serde(default)]
    pub feature_image_alt: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<RawTag>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPagination {
    pub page: u32,
    pub limit: PageLimit,
    pub pages: u32,
    pub total: u32,
    pub next: Option<u32>,
    pub prev: Option<u32>,
}

/// One page of posts as returned by upstream.
#[derive(Debug, Clone)]
pub struct RawPostPage {
    pub posts: Vec<RawPost>,
    pub pagination: Option<RawPagination>,
}

/// Parameters of a post listing call. Tags are always included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowsePosts {
    pub limit: PageLimit,
    pub page: Option<NonZeroU32>,
    pub filter: Option<String>,
}

impl BrowsePosts {
    /// Every post, unpaginated.
    pub fn all() -> Self {
        Self {
            limit: PageLimit::All,
            page: None,
            filter: None,
        }
    }

    /// The `count` most recent posts.
    pub fn latest(count: NonZeroU32) -> Self {
        Self {
            limit: PageLimit::Count(count.get()),
            page: None,
            filter: None,
        }
    }

    pub fn page(count: NonZeroU32, page: NonZeroU32) -> Self {
        Self {
            limit: PageLimit::Count(count.get()),
            page: Some(page),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: Option<String>) -> Self {
        self.filter = filter;
        self
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn browse_posts(&self, request: &BrowsePosts) -> Result<RawPostPage, UpstreamError>;

    async fn read_post(&self, slug: &str) -> Result<RawPost, UpstreamError>;

    async fn browse_tags(&self) -> Result<Vec<RawTag>, UpstreamError>;

    /// Full post list used to build the search snapshot.
    async fn all_posts(&self) -> Result<Vec<RawPost>, UpstreamError> {
        self.browse_posts(&BrowsePosts::all())
            .await
            .map(|page| page.posts)
    }
}
