//! Handler for the dashboard summary.

use axum::extract::State;
use axum::Json;

use fiscal_core::dashboard::Dashboard;
use fiscal_core::registry;

use crate::error::AppResult;
use crate::extractors::AppQuery;
use crate::middleware::actor::CurrentUser;
use crate::query::DashboardParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /dashboard?top=
///
/// Counters, the expiry histogram, and the `top` soonest-expiring devices.
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    AppQuery(params): AppQuery<DashboardParams>,
) -> AppResult<Json<DataResponse<Dashboard>>> {
    let top = params.top.unwrap_or(state.config.dashboard_top_expiring);
    let data = registry::dashboard(state.store.as_ref(), &user, state.clock.as_ref(), top).await?;
    Ok(Json(DataResponse { data }))
}
