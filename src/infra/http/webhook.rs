use axum::{body::Bytes, extract::State, http::HeaderMap, http::StatusCode};
use tracing::{info, warn};

use crate::application::webhook::SIGNATURE_HEADER;

use super::error::ApiError;
use super::state::HttpState;

/// Verify the upstream signature over the raw body, then refresh the cache.
/// Nothing is touched unless the signature checks out.
pub async fn update_posts(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let Some(verifier) = state.webhook.as_ref() else {
        warn!(
            target = "postcache::webhook",
            "Webhook received but no secret is configured"
        );
        return Err(ApiError::unauthorized("webhook secret not configured"));
    };

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(err) = verifier.verify(signature, &body) {
        warn!(
            target = "postcache::webhook",
            reason = %err,
            body_bytes = body.len(),
            "Rejected webhook"
        );
        return Err(err.into());
    }

    state.cache.refresh();
    info!(target = "postcache::webhook", "Webhook accepted; cache refreshed");
    Ok(StatusCode::OK)
}
