//! Content shapes served to clients.
//!
//! These are the reduced, allow-listed views of upstream posts and tags. They
//! are immutable once built; a refresh replaces them wholesale.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::paging::PageRequest;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub description: Option<String>,
    pub accent_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    pub id: String,
    pub title: String,
    pub custom_excerpt: Option<String>,
    pub feature_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_image_alt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
}

impl Post {
    pub fn tag_slugs(&self) -> impl Iterator<Item = &str> {
        self.tags
            .iter()
            .flatten()
            .map(|tag| tag.slug.as_str())
    }
}

/// Page size reported in pagination metadata; upstream answers `"all"` for
/// unbounded listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageLimit {
    Count(u32),
    All,
}

impl Serialize for PageLimit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PageLimit::Count(count) => serializer.serialize_u32(*count),
            PageLimit::All => serializer.serialize_str("all"),
        }
    }
}

impl<'de> Deserialize<'de> for PageLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Count(u32),
            Text(String),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Count(count) => Ok(PageLimit::Count(count)),
            Wire::Text(text) if text == "all" => Ok(PageLimit::All),
            Wire::Text(text) => Err(serde::de::Error::custom(format!(
                "invalid page limit `{text}`"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub pages: u32,
    pub page: u32,
    pub limit: PageLimit,
    pub total: u32,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

impl PostMetadata {
    /// Build the descriptor for `request` over a result set of `total` items.
    pub fn for_page(total: usize, request: PageRequest) -> Self {
        let count = request.count.get();
        let page = request.page.get();
        let total = u32::try_from(total).unwrap_or(u32::MAX);
        let pages = total.div_ceil(count);

        Self {
            pages,
            page,
            limit: PageLimit::Count(count),
            total,
            prev: (page > 1).then(|| page - 1),
            next: (page < pages).then(|| page + 1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostResponse {
    pub posts: Vec<Post>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<PostMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostReadResponse {
    pub post: Post,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagResponse {
    pub tags: Vec<Tag>,
}

/// A response payload memoized under exactly one request key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CacheItem {
    Posts(PostResponse),
    Post(PostReadResponse),
    Tags(TagResponse),
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn request(count: u32, page: u32) -> PageRequest {
        PageRequest {
            count: NonZeroU32::new(count).expect("non-zero count"),
            page: NonZeroU32::new(page).expect("non-zero page"),
        }
    }

    #[test]
    fn metadata_first_page_has_no_prev() {
        let meta = PostMetadata::for_page(7, request(3, 1));
        assert_eq!(meta.pages, 3);
        assert_eq!(meta.prev, None);
        assert_eq!(meta.next, Some(2));
        assert_eq!(meta.total, 7);
        assert_eq!(meta.limit, PageLimit::Count(3));
    }

    #[test]
    fn metadata_last_page_has_no_next() {
        let meta = PostMetadata::for_page(7, request(3, 3));
        assert_eq!(meta.prev, Some(2));
        assert_eq!(meta.next, None);
    }

    #[test]
    fn metadata_for_empty_result_has_zero_pages() {
        let meta = PostMetadata::for_page(0, request(5, 1));
        assert_eq!(meta.pages, 0);
        assert_eq!(meta.prev, None);
        assert_eq!(meta.next, None);
    }

    #[test]
    fn page_limit_uses_upstream_wire_format() {
        assert_eq!(
            serde_json::to_string(&PageLimit::All).expect("serialize"),
            "\"all\""
        );
        assert_eq!(
            serde_json::from_str::<PageLimit>("15").expect("deserialize"),
            PageLimit::Count(15)
        );
        assert!(serde_json::from_str::<PageLimit>("\"some\"").is_err());
    }

    #[test]
    fn summary_post_omits_detail_fields() {
        let post = Post {
            slug: "hello".into(),
            id: "1".into(),
            title: "Hello".into(),
            custom_excerpt: None,
            feature_image: None,
            feature_image_alt: None,
            published_at: None,
            html: None,
            tags: Some(Vec::new()),
        };

        let value = serde_json::to_value(&post).expect("serialize");
        assert!(value.get("html").is_none());
        assert!(value["custom_excerpt"].is_null());
        assert_eq!(value["tags"], serde_json::json!([]));
    }
}
