//! Request identity used as the response cache key.

use std::fmt;

use axum::http::Uri;
use url::form_urlencoded;

/// Path plus every query parameter, with parameters sorted so that
/// reordering them does not split the cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey(String);

impl RequestKey {
    pub fn new(path: &str, query: Option<&str>) -> Self {
        let mut pairs: Vec<(String, String)> =
            form_urlencoded::parse(query.unwrap_or_default().as_bytes())
                .into_owned()
                .collect();

        if pairs.is_empty() {
            return Self(path.to_string());
        }

        pairs.sort();
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        Self(format!("{path}?{encoded}"))
    }

    pub fn from_uri(uri: &Uri) -> Self {
        Self::new(uri.path(), uri.query())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
