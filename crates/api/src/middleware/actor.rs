//! Acting-user extractor for Axum handlers.
//!
//! Authentication happens upstream; requests arrive with the caller's id in
//! the `X-User-Id` header. The user is loaded from the store so every
//! capability check sees the role as currently stored. Activity stamping
//! lives in [`crate::middleware::activity`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use fiscal_core::error::CoreError;
use fiscal_core::store::UserStore;
use fiscal_core::types::DbId;
use fiscal_core::user::User;

use crate::error::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The user on whose behalf the request runs.
///
/// ```ignore
/// async fn my_handler(CurrentUser(user): CurrentUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Parse the caller's id out of `X-User-Id`.
pub fn user_id_from_headers(headers: &HeaderMap) -> Result<DbId, AppError> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Missing X-User-Id header".into())))?;

    raw.trim().parse().map_err(|_| {
        AppError::Core(CoreError::Unauthorized(
            "X-User-Id must be a numeric user id".into(),
        ))
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = user_id_from_headers(&parts.headers)?;

        let user = state
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Unknown user".into())))?;

        Ok(CurrentUser(user))
    }
}
