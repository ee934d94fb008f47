pub mod dashboard;
pub mod devices;
pub mod health;
pub mod importer;
pub mod me;
pub mod operators;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /me/capabilities                                 role and capability set of the caller
///
/// /dashboard                                       counters, histogram, soonest expiring
///
/// /devices                                         list, create
/// /devices/{device_id}                             update, delete
/// /devices/{device_id}/billing-status              billing status transition (PUT)
///
/// /operators                                       list, create
/// /operators/{id}                                  update, delete
///
/// /users                                           list, create
/// /users/{id}                                      update, delete
///
/// /import                                          reconcile parsed rows (POST)
/// /import/history                                  recent imports
/// ```
///
/// Every route resolves the caller from `X-User-Id`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/me", me::router())
        .nest("/dashboard", dashboard::router())
        .nest("/devices", devices::router())
        .nest("/operators", operators::router())
        .nest("/users", users::router())
        .nest("/import", importer::router())
}
