//! Handlers for fiscal data operators (OFD).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use fiscal_core::operator::{NewOperator, Operator, OperatorPatch};
use fiscal_core::registry::{self, OperatorListing};
use fiscal_core::types::DbId;

use crate::error::AppResult;
use crate::extractors::{AppJson, AppPath, AppQuery};
use crate::middleware::actor::CurrentUser;
use crate::query::ListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /operators?search=&status=
pub async fn list_operators(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<ListParams>,
) -> AppResult<Json<DataResponse<OperatorListing>>> {
    let query = params.into_query()?;
    let data =
        registry::list_operators(state.store.as_ref(), &user, state.clock.as_ref(), &query)
            .await?;
    Ok(Json(DataResponse { data }))
}

/// POST /operators
pub async fn create_operator(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(input): AppJson<NewOperator>,
) -> AppResult<(StatusCode, Json<DataResponse<Operator>>)> {
    let data = registry::create_operator(state.store.as_ref(), &user, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT /operators/{id}
pub async fn update_operator(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<DbId>,
    AppJson(patch): AppJson<OperatorPatch>,
) -> AppResult<Json<DataResponse<Operator>>> {
    let data = registry::update_operator(state.store.as_ref(), &user, id, &patch).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /operators/{id}
pub async fn delete_operator(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    registry::delete_operator(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
