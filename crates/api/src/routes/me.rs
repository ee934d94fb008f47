use axum::routing::get;
use axum::Router;

use crate::handlers::access;
use crate::state::AppState;

/// Routes mounted at `/me`.
///
/// ```text
/// GET  /capabilities   -> my_capabilities
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/capabilities", get(access::my_capabilities))
}
