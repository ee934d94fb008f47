//! Last-activity stamping for `/api/v1` requests.
//!
//! The stamp is written after the handler has run and only when it answered
//! with a success status. Requests rejected by the capability check, by
//! validation or by a missing record leave `last_active` untouched.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use fiscal_core::store::UserStore;

use crate::middleware::actor::user_id_from_headers;
use crate::state::AppState;

pub async fn record_activity(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    // A missing or malformed header is rejected by `CurrentUser` downstream.
    let user_id = user_id_from_headers(req.headers()).ok();

    let response = next.run(req).await;

    if let Some(user_id) = user_id.filter(|_| response.status().is_success()) {
        // Presence is informational; a failed stamp must not fail the request.
        if let Err(e) = state.store.record_activity(user_id, state.clock.now()).await {
            tracing::warn!(user_id, error = %e, "Failed to record user activity");
        }
    }

    response
}
