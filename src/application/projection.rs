//! Field projection from upstream payloads to served shapes.

use crate::domain::posts::{Post, PostMetadata, Tag};

use super::upstream::{RawPagination, RawPost, RawTag};

/// Listing view of a post: identity, title, excerpt, image and tags. A
/// missing tag list becomes an empty one.
pub fn project_summary(raw: RawPost) -> Post {
    let tags = raw
        .tags
        .unwrap_or_default()
        .into_iter()
        .map(project_tag)
        .collect();

    Post {
        slug: raw.slug,
        id: raw.id,
        title: raw.title,
        custom_excerpt: raw.custom_excerpt,
        feature_image: raw.feature_image,
        feature_image_alt: None,
        published_at: None,
        html: None,
        tags: Some(tags),
    }
}

/// Single-post view: adds body, image alt text and publish time; no tags.
pub fn project_detail(raw: RawPost) -> Post {
    Post {
        slug: raw.slug,
        id: raw.id,
        title: raw.title,
        custom_excerpt: raw.custom_excerpt,
        feature_image: raw.feature_image,
        feature_image_alt: raw.feature_image_alt,
        published_at: raw.published_at,
        html: raw.html,
        tags: None,
    }
}

pub fn project_tag(raw: RawTag) -> Tag {
    Tag {
        id: raw.id,
        slug: raw.slug,
        name: raw.name,
        description: raw.description,
        accent_color: raw.accent_color,
    }
}

pub fn project_pagination(raw: RawPagination) -> PostMetadata {
    PostMetadata {
        pages: raw.pages,
        page: raw.page,
        limit: raw.limit,
        total: raw.total,
        prev: raw.prev,
        next: raw.next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_post(tags: Option<Vec<RawTag>>) -> RawPost {
        RawPost {
            id: "64a1".into(),
            slug: "hello-world".into(),
            title: "Hello world".into(),
            custom_excerpt: Some("first post".into()),
            feature_image: Some("https://img.example/a.png".into()),
            feature_image_alt: Some("a sapling".into()),
            published_at: Some("2024-07-01T10:00:00.000Z".into()),
            html: Some("<p>hi</p>".into()),
            tags,
        }
    }

    #[test]
    fn summary_drops_detail_fields_and_projects_tags() {
        let post = project_summary(raw_post(Some(vec![RawTag {
            id: "t1".into(),
            slug: "rust".into(),
            name: "Rust".into(),
            description: None,
            accent_color: Some("#ff0000".into()),
        }])));

        assert_eq!(post.slug, "hello-world");
        assert!(post.html.is_none());
        assert!(post.published_at.is_none());
        assert!(post.feature_image_alt.is_none());
        let tags = post.tags.expect("tags projected");
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].accent_color.as_deref(), Some("#ff0000"));
    }

    #[test]
    fn summary_treats_missing_tags_as_empty() {
        let post = project_summary(raw_post(None));
        assert_eq!(post.tags, Some(Vec::new()));
    }

    #[test]
    fn detail_keeps_body_and_drops_tags() {
        let post = project_detail(raw_post(Some(Vec::new())));
        assert_eq!(post.html.as_deref(), Some("<p>hi</p>"));
        assert_eq!(post.feature_image_alt.as_deref(), Some("a sapling"));
        assert!(post.tags.is_none());
    }

    #[test]
    fn raw_post_decodes_and_ignores_unknown_fields() {
        let raw: RawPost = serde_json::from_str(
            r#"{"id":"1","slug":"s","title":"T","uuid":"ignored","reading_time":3}"#,
        )
        .expect("decode");
        let post = project_summary(raw);
        assert_eq!(post.title, "T");
        assert!(post.custom_excerpt.is_none());
    }
}
