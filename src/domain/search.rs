//! Two-predicate post filter: free text over title/excerpt, and tag slugs.

use url::form_urlencoded;

use super::error::DomainError;
use super::posts::Post;

/// A normalized search request.
///
/// `text` is kept verbatim for upstream filters; matching uses the
/// lowercased `needle`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    needle: String,
    tags: Vec<String>,
}

impl SearchQuery {
    pub fn new<I, S>(text: impl Into<String>, tags: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = text.into();
        let mut slugs = Vec::new();
        for raw in tags {
            for slug in raw.as_ref().split(',').map(str::trim) {
                if slug.is_empty() {
                    continue;
                }
                if !is_valid_slug(slug) {
                    return Err(DomainError::validation(format!(
                        "tag `{slug}` is not a valid slug"
                    )));
                }
                if !slugs.iter().any(|existing| existing == slug) {
                    slugs.push(slug.to_string());
                }
            }
        }

        Ok(Self {
            needle: text.to_lowercase(),
            text,
            tags: slugs,
        })
    }

    /// Parse `search=` and `tags=` from a raw query string. `tags` may repeat
    /// and may carry comma separated slugs.
    pub fn from_query_string(query: Option<&str>) -> Result<Self, DomainError> {
        let mut text = String::new();
        let mut tags = Vec::new();
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "search" => text = value.into_owned(),
                "tags" => tags.push(value.into_owned()),
                _ => {}
            }
        }
        Self::new(text, tags)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }

    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Decide whether `post` belongs to the result set. When both filters are
    /// supplied both must match; tags match if any requested slug is present.
    pub fn matches(&self, post: &Post) -> bool {
        let tag_hit = self.has_tags()
            && post
                .tag_slugs()
                .any(|slug| self.tags.iter().any(|wanted| wanted == slug));
        let text_hit = self.has_text()
            && (contains_folded(&post.title, &self.needle)
                || post
                    .custom_excerpt
                    .as_deref()
                    .is_some_and(|excerpt| contains_folded(excerpt, &self.needle)));

        match (self.has_tags(), self.has_text()) {
            (true, true) => tag_hit && text_hit,
            (true, false) => tag_hit,
            (false, true) => text_hit,
            (false, false) => true,
        }
    }
}

fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn is_valid_slug(slug: &str) -> bool {
    slug.chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::posts::Tag;

    fn post(title: &str, excerpt: &str, tags: &[&str]) -> Post {
        Post {
            slug: title.to_lowercase(),
            id: title.to_string(),
            title: title.to_string(),
            custom_excerpt: Some(excerpt.to_string()),
            feature_image: None,
            feature_image_alt: None,
            published_at: None,
            html: None,
            tags: Some(
                tags.iter()
                    .map(|slug| Tag {
                        id: format!("tag-{slug}"),
                        slug: (*slug).to_string(),
                        name: slug.to_uppercase(),
                        description: None,
                        accent_color: None,
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn text_matches_title_or_excerpt_case_insensitively() {
        let alpha = post("Alpha", "x", &["a"]);
        let beta = post("Beta", "alpha here", &["b"]);
        let query = SearchQuery::new("ALPHA", Vec::<String>::new()).expect("query");

        assert!(query.matches(&alpha));
        assert!(query.matches(&beta));
    }

    #[test]
    fn tags_match_any_requested_slug() {
        let alpha = post("Alpha", "x", &["a"]);
        let beta = post("Beta", "alpha here", &["b"]);
        let query = SearchQuery::new("", ["a", "z"]).expect("query");

        assert!(query.matches(&alpha));
        assert!(!query.matches(&beta));
    }

    #[test]
    fn both_filters_require_both_to_match() {
        let alpha = post("Alpha", "x", &["a"]);
        let beta = post("Beta", "alpha here", &["b"]);
        let query = SearchQuery::new("here", ["a"]).expect("query");

        assert!(!query.matches(&alpha));
        assert!(!query.matches(&beta));
    }

    #[test]
    fn missing_tag_list_never_matches_tag_filter() {
        let mut untagged = post("Gamma", "x", &[]);
        untagged.tags = None;
        let query = SearchQuery::new("", ["a"]).expect("query");
        assert!(!query.matches(&untagged));
    }

    #[test]
    fn empty_query_matches_everything() {
        let query = SearchQuery::default();
        assert!(query.matches(&post("Anything", "", &[])));
    }

    #[test]
    fn query_string_accepts_repeated_and_comma_separated_tags() {
        let query = SearchQuery::from_query_string(Some("search=rust&tags=a,b&tags=c&tags=a"))
            .expect("query");
        assert_eq!(query.text(), "rust");
        assert_eq!(query.tags(), ["a", "b", "c"]);
    }

    #[test]
    fn query_string_rejects_filter_syntax_in_tags() {
        let err = SearchQuery::from_query_string(Some("tags=a%5D%2Btitle%3A~x"))
            .expect_err("tag with filter syntax");
        assert!(matches!(err, DomainError::Validation { .. }));
    }
}
