//! Handlers for user management.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use fiscal_core::registry::{self, UserListing};
use fiscal_core::types::DbId;
use fiscal_core::user::{NewUser, User, UserPatch};

use crate::error::AppResult;
use crate::extractors::{AppJson, AppPath, AppQuery};
use crate::middleware::actor::CurrentUser;
use crate::query::UserListParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /users?search=&role=
pub async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<UserListParams>,
) -> AppResult<Json<DataResponse<UserListing>>> {
    let query = params.into_query()?;
    let data = registry::list_users(state.store.as_ref(), &user, state.clock.as_ref(), &query).await?;
    Ok(Json(DataResponse { data }))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(input): AppJson<NewUser>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    let data = registry::create_user(state.store.as_ref(), &user, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<DbId>,
    AppJson(patch): AppJson<UserPatch>,
) -> AppResult<Json<DataResponse<User>>> {
    let data = registry::update_user(state.store.as_ref(), &user, id, &patch).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppPath(id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    registry::delete_user(state.store.as_ref(), &user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
