use axum::routing::{get, post};
use axum::Router;

use crate::handlers::importer;
use crate::state::AppState;

/// Routes mounted at `/import`.
///
/// ```text
/// POST  /          -> import_devices
/// GET   /history   -> import_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(importer::import_devices))
        .route("/history", get(importer::import_history))
}
