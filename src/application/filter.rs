//! Upstream filter expressions for searches the local snapshot cannot answer.

use crate::domain::search::SearchQuery;

/// Build the upstream filter for `query`.
///
/// Tags alone select `tags:[a,b]`; text alone matches excerpt or title; both
/// are distributed as `(tags AND excerpt) OR (tags AND title)`. Returns `None`
/// when neither filter is present.
pub fn upstream_filter(query: &SearchQuery) -> Option<String> {
    let tags = query
        .has_tags()
        .then(|| format!("tags:[{}]", query.tags().join(",")));
    let text = query.has_text().then(|| escape_literal(query.text()));

    match (tags, text) {
        (Some(tags), Some(text)) => Some(format!(
            "{tags}+custom_excerpt:~'{text}',{tags}+title:~'{text}'"
        )),
        (Some(tags), None) => Some(tags),
        (None, Some(text)) => Some(format!("custom_excerpt:~'{text}',title:~'{text}'")),
        (None, None) => None,
    }
}

fn escape_literal(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\'' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
