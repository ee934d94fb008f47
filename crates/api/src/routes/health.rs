//! `GET /health`, mounted at the root so load balancers can call it without `X-User-Id`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use fiscal_core::types::CalendarDate;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Ok,
    Degraded,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: ServiceStatus,
    pub version: &'static str,
    /// `false` when Postgres does not answer `SELECT 1`.
    pub database: bool,
    /// The date every days-left figure is currently computed against.
    pub today: CalendarDate,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let database = match fiscal_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };

    Json(Health {
        status: if database {
            ServiceStatus::Ok
        } else {
            ServiceStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION"),
        database,
        today: state.clock.today(),
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
