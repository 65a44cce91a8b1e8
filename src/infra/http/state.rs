use std::sync::Arc;

use crate::application::upstream::ContentSource;
use crate::application::webhook::SignatureVerifier;
use crate::cache::CacheCoordinator;

#[derive(Clone)]
pub struct HttpState {
    pub cache: Arc<CacheCoordinator>,
    pub upstream: Arc<dyn ContentSource>,
    /// `None` when no webhook secret is configured; refreshes are then refused.
    pub webhook: Option<Arc<SignatureVerifier>>,
}
