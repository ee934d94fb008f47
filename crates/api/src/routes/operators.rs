use axum::routing::{get, put};
use axum::Router;

use crate::handlers::operators;
use crate::state::AppState;

/// Routes mounted at `/operators`.
///
/// ```text
/// GET     /        -> list_operators
/// POST    /        -> create_operator
/// PUT     /{id}    -> update_operator
/// DELETE  /{id}    -> delete_operator
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(operators::list_operators).post(operators::create_operator),
        )
        .route(
            "/{id}",
            put(operators::update_operator).delete(operators::delete_operator),
        )
}
