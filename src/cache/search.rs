//! Offline search over the post snapshot.

use crate::domain::paging::PageRequest;
use crate::domain::posts::{Post, PostMetadata, PostResponse};
use crate::domain::search::SearchQuery;

/// Filter `posts` in snapshot order and cut out the requested page.
///
/// Pages past the end yield an empty list while the metadata still reports
/// the real totals.
pub fn search_posts(posts: &[Post], query: &SearchQuery, request: PageRequest) -> PostResponse {
    let matched: Vec<&Post> = posts.iter().filter(|post| query.matches(post)).collect();
    let meta = PostMetadata::for_page(matched.len(), request);

    let page = matched
        .into_iter()
        .skip(request.offset())
        .take(request.limit())
        .cloned()
        .collect();

    PostResponse {
        posts: page,
        meta: Some(meta),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::posts::{PageLimit, Tag};

    fn tag(slug: &str) -> Tag {
        Tag {
            id: format!("tag-{slug}"),
            slug: slug.to_string(),
            name: slug.to_string(),
            description: None,
            accent_color: None,
        }
    }

    fn post(slug: &str, title: &str, tags: &[&str]) -> Post {
        Post {
            slug: slug.to_string(),
            id: format!("id-{slug}"),
            title: title.to_string(),
            custom_excerpt: None,
            feature_image: None,
            feature_image_alt: None,
            published_at: None,
            html: None,
            tags: Some(tags.iter().map(|slug| tag(slug)).collect()),
        }
    }

    fn snapshot() -> Vec<Post> {
        (1..=7)
            .map(|n| post(&format!("p{n}"), &format!("Post {n}"), &["rust"]))
            .collect()
    }

    #[test]
    fn splits_seven_matches_into_pages_of_three() {
        let posts = snapshot();
        let query = SearchQuery::new("post", Vec::<String>::new()).expect("query");

        let first = search_posts(&posts, &query, PageRequest::parse("3", "1").expect("page"));
        let slugs: Vec<_> = first.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["p1", "p2", "p3"]);
        let meta = first.meta.expect("meta");
        assert_eq!(meta.pages, 3);
        assert_eq!(meta.total, 7);
        assert_eq!(meta.limit, PageLimit::Count(3));
        assert_eq!((meta.prev, meta.next), (None, Some(2)));

        let last = search_posts(&posts, &query, PageRequest::parse("3", "3").expect("page"));
        let slugs: Vec<_> = last.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["p7"]);
        let meta = last.meta.expect("meta");
        assert_eq!((meta.prev, meta.next), (Some(2), None));
    }

    #[test]
    fn page_beyond_end_is_empty_with_real_totals() {
        let posts = snapshot();
        let query = SearchQuery::default();

        let response = search_posts(&posts, &query, PageRequest::parse("3", "9").expect("page"));
        assert!(response.posts.is_empty());
        let meta = response.meta.expect("meta");
        assert_eq!(meta.total, 7);
        assert_eq!(meta.next, None);
    }

    #[test]
    fn combines_text_and_tags() {
        let posts = vec![
            post("a", "Alpha", &["x"]),
            post("b", "Beta", &["y"]),
            post("c", "Alphabet", &["y"]),
        ];
        let query = SearchQuery::new("alpha", ["y"]).expect("query");

        let response = search_posts(&posts, &query, PageRequest::parse("10", "1").expect("page"));
        let slugs: Vec<_> = response.posts.iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["c"]);
    }
}
