//! Handlers for spreadsheet import.
//!
//! The browser parses the spreadsheet and posts the rows; this endpoint only
//! reconciles them.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use fiscal_core::importer::{reconcile_import, ImportRecord, ImportReport, ImportRow};
use fiscal_core::registry;

use crate::error::AppResult;
use crate::extractors::{AppJson, AppQuery};
use crate::middleware::actor::CurrentUser;
use crate::query::LimitParams;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub filename: String,
    pub rows: Vec<ImportRow>,
}

/// POST /import
///
/// Always answers 201 once a history record has been written, even when
/// every row failed; the outcome lives in the record.
pub async fn import_devices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppJson(body): AppJson<ImportRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ImportReport>>)> {
    let report = reconcile_import(
        state.store.as_ref(),
        &user,
        &body.filename,
        &body.rows,
        state.clock.as_ref(),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// GET /import/history?limit=
pub async fn import_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<LimitParams>,
) -> AppResult<Json<DataResponse<Vec<ImportRecord>>>> {
    let limit = params.limit.unwrap_or(state.config.import_history_limit);
    let data = registry::import_history(state.store.as_ref(), &user, limit).await?;
    Ok(Json(DataResponse { data }))
}
