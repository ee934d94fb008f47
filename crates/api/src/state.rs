use std::sync::Arc;

use fiscal_core::clock::Clock;
use fiscal_core::store::RegistryStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool, used directly by the health check.
    pub pool: fiscal_db::DbPool,
    /// Record store every registry operation goes through.
    pub store: Arc<dyn RegistryStore>,
    /// Source of "today" for all derived dates.
    pub clock: Arc<dyn Clock>,
    pub config: Arc<ServerConfig>,
}
