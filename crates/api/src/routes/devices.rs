use axum::routing::{get, put};
use axum::Router;

use crate::handlers::devices;
use crate::state::AppState;

/// Routes mounted at `/devices`.
///
/// ```text
/// GET     /                              -> list_devices
/// POST    /                              -> create_device
/// PUT     /{device_id}                   -> update_device
/// DELETE  /{device_id}                   -> delete_device
/// PUT     /{device_id}/billing-status    -> set_billing_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(devices::list_devices).post(devices::create_device))
        .route(
            "/{device_id}",
            put(devices::update_device).delete(devices::delete_device),
        )
        .route(
            "/{device_id}/billing-status",
            put(devices::set_billing_status),
        )
}
