//! Handlers for fiscal devices.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use fiscal_core::classifier::ClassifiedDevice;
use fiscal_core::device::{BillingStatus, DevicePatch, FiscalDevice, NewDevice};
use fiscal_core::registry;

use crate::error::AppResult;
use crate::extractors::{AppJson, AppPath, AppQuery};
use crate::middleware::actor::CurrentUser;
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BillingStatusUpdate {
    pub billing_status: BillingStatus,
}

/// GET /devices?search=&status=
pub async fn list_devices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<ListParams>,
) -> AppResult<Json<DataResponse<Vec<ClassifiedDevice>>>> {
    let query = params.into_query()?;
    let data =
        registry::list_devices(state.store.as_ref(), &user, state.clock.as_ref(), &query).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /devices
pub async fn create_device(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(input): AppJson<NewDevice>,
) -> AppResult<(StatusCode, Json<DataResponse<FiscalDevice>>)> {
    let data = registry::create_device(state.store.as_ref(), &user, input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT /devices/{device_id}
pub async fn update_device(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(device_id): AppPath<String>,
    AppJson(patch): AppJson<DevicePatch>,
) -> AppResult<Json<DataResponse<FiscalDevice>>> {
    let data = registry::update_device(state.store.as_ref(), &user, &device_id, &patch).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT /devices/{device_id}/billing-status
pub async fn set_billing_status(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(device_id): AppPath<String>,
    AppJson(body): AppJson<BillingStatusUpdate>,
) -> AppResult<Json<DataResponse<FiscalDevice>>> {
    let data = registry::set_billing_status(
        state.store.as_ref(),
        &user,
        &device_id,
        body.billing_status,
    )
    .await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /devices/{device_id}
pub async fn delete_device(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(device_id): AppPath<String>,
) -> AppResult<StatusCode> {
    registry::delete_device(state.store.as_ref(), &user, &device_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
