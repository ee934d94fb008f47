//! Handlers exposing the access policy to presentation.

use axum::Json;
use serde::Serialize;

use fiscal_core::access::{capabilities, Capability};
use fiscal_core::roles::Role;
use fiscal_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::actor::CurrentUser;
use crate::response::DataResponse;

#[derive(Debug, Serialize)]
pub struct CapabilitiesResponse {
    pub user_id: DbId,
    pub role: Role,
    pub capabilities: Vec<Capability>,
}

/// GET /me/capabilities
pub async fn my_capabilities(
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<DataResponse<CapabilitiesResponse>>> {
    Ok(Json(DataResponse {
        data: CapabilitiesResponse {
            user_id: user.id,
            role: user.role,
            capabilities: capabilities(user.role).to_vec(),
        },
    }))
}
