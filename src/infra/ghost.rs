//! Ghost Content API client.
//!
//! Talks to `{site}/ghost/api/content/` with the content key as a query
//! parameter and the configured `Accept-Version` header. Payloads decode into
//! the strict `Raw*` boundary types; nothing else leaves this module.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::application::upstream::{
    BrowsePosts, ContentSource, RawPagination, RawPost, RawPostPage, RawTag, UpstreamError,
};
use crate::config::UpstreamSettings;
use crate::domain::posts::PageLimit;

use super::error::InfraError;

const CONTENT_API_PATH: &str = "ghost/api/content/";
const ACCEPT_VERSION: HeaderName = HeaderName::from_static("accept-version");
const READ_FIELDS: &str = "slug,id,title,html,custom_excerpt,feature_image,feature_image_alt,published_at";
const TAG_FIELDS: &str = "id,slug,name,description,accent_color";

#[derive(Clone)]
pub struct GhostClient {
    client: Client,
    api_root: Url,
    key: String,
}

impl GhostClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, InfraError> {
        let version = HeaderValue::from_str(&settings.version).map_err(|err| {
            InfraError::upstream_client(format!("invalid upstream version header: {err}"))
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_VERSION, version);

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::upstream_client(format!("failed to build client: {err}")))?;

        Ok(Self {
            client,
            api_root: api_root(&settings.url)?,
            key: settings.key.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("postcache/", env!("CARGO_PKG_VERSION"))
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url, UpstreamError> {
        let mut url = self
            .api_root
            .join(path)
            .map_err(|err| UpstreamError::unavailable(format!("invalid endpoint `{path}`: {err}")))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.key);
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        let path = url.path().to_string();
        debug!(target = "postcache::upstream", path = %path, "Upstream request");

        let response = self.client.get(url).send().await.map_err(|err| {
            warn!(target = "postcache::upstream", path = %path, error = %err, "Upstream request failed");
            UpstreamError::unavailable(format!("request to {path} failed: {err}"))
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|err| {
            UpstreamError::unavailable(format!("failed to read body from {path}: {err}"))
        })?;

        if !status.is_success() {
            let error = classify_failure(status, &body);
            warn!(
                target = "postcache::upstream",
                path = %path,
                status = status.as_u16(),
                error = %error,
                "Upstream answered with an error"
            );
            return Err(error);
        }

        serde_json::from_slice(&body).map_err(|err| {
            UpstreamError::unavailable(format!("failed to decode response from {path}: {err}"))
        })
    }
}

#[async_trait]
impl ContentSource for GhostClient {
    async fn browse_posts(&self, request: &BrowsePosts) -> Result<RawPostPage, UpstreamError> {
        let mut query = vec![("include", "tags".to_string())];
        query.push((
            "limit",
            match request.limit {
                PageLimit::Count(count) => count.to_string(),
                PageLimit::All => "all".to_string(),
            },
        ));
        if let Some(page) = request.page {
            query.push(("page", page.to_string()));
        }
        if let Some(filter) = request.filter.as_ref() {
            query.push(("filter", filter.clone()));
        }

        let envelope: PostsEnvelope = self.fetch(self.endpoint("posts/", &query)?).await?;
        Ok(RawPostPage {
            posts: envelope.posts,
            pagination: envelope.meta.and_then(|meta| meta.pagination),
        })
    }

    async fn read_post(&self, slug: &str) -> Result<RawPost, UpstreamError> {
        let mut url = self.endpoint("posts/slug/", &[("fields", READ_FIELDS.to_string())])?;
        url.path_segments_mut()
            .map_err(|()| UpstreamError::unavailable("upstream URL cannot carry a path"))?
            .pop_if_empty()
            .push(slug)
            .push("");

        let envelope: PostsEnvelope = self.fetch(url).await?;
        envelope
            .posts
            .into_iter()
            .next()
            .ok_or_else(|| UpstreamError::failure(format!("post `{slug}` not found")))
    }

    async fn browse_tags(&self) -> Result<Vec<RawTag>, UpstreamError> {
        let query = [
            ("limit", "all".to_string()),
            ("fields", TAG_FIELDS.to_string()),
        ];
        let envelope: TagsEnvelope = self.fetch(self.endpoint("tags/", &query)?).await?;
        Ok(envelope.tags)
    }
}

fn api_root(site: &Url) -> Result<Url, InfraError> {
    let mut base = site.clone();
    base.set_query(None);
    base.set_fragment(None);
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(CONTENT_API_PATH)
        .map_err(|err| InfraError::upstream_client(format!("invalid upstream URL: {err}")))
}

/// Authentication problems and server faults mean upstream is unusable;
/// any other client error is upstream telling us the content does not exist.
fn classify_failure(status: StatusCode, body: &[u8]) -> UpstreamError {
    let detail = serde_json::from_slice::<ErrorsEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.errors.into_iter().next())
        .map(|error| match error.kind {
            Some(kind) => format!("{kind}: {}", error.message),
            None => error.message,
        })
        .unwrap_or_else(|| format!("status {status}"));

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            UpstreamError::unavailable(detail)
        }
        status if status.is_client_error() => UpstreamError::failure(detail),
        _ => UpstreamError::unavailable(detail),
    }
}

#[derive(Debug, Deserialize)]
struct PostsEnvelope {
    posts: Vec<RawPost>,
    #[serde(default)]
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    pagination: Option<RawPagination>,
}

#[derive(Debug, Deserialize)]
struct TagsEnvelope {
    tags: Vec<RawTag>,
}

#[derive(Debug, Deserialize)]
struct ErrorsEnvelope {
    errors: Vec<GhostError>,
}

#[derive(Debug, Deserialize)]
struct GhostError {
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_root_appends_content_path() {
        let root = api_root(&Url::parse("https://ghost.example.com").expect("url")).expect("root");
        assert_eq!(root.as_str(), "https://ghost.example.com/ghost/api/content/");

        let nested =
            api_root(&Url::parse("https://example.com/blog?x=1").expect("url")).expect("root");
        assert_eq!(nested.as_str(), "https://example.com/blog/ghost/api/content/");
    }

    #[test]
    fn not_found_is_a_failure() {
        let body = br#"{"errors":[{"message":"Resource not found","type":"NotFoundError"}]}"#;
        let error = classify_failure(StatusCode::NOT_FOUND, body);
        assert!(matches!(error, UpstreamError::Failure { ref message } if message == "NotFoundError: Resource not found"));
    }

    #[test]
    fn auth_and_server_errors_are_unavailable() {
        for status in [
            StatusCode::UNAUTHORIZED,
            StatusCode::FORBIDDEN,
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
        ] {
            let error = classify_failure(status, b"not json");
            assert!(
                matches!(error, UpstreamError::Unavailable { .. }),
                "{status} should be unavailable"
            );
        }
    }
}
