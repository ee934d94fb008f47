use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::PgPool;
use tower::ServiceExt;

use fiscal_api::config::ServerConfig;
use fiscal_api::router::build_app_router;
use fiscal_api::state::AppState;
use fiscal_core::clock::FixedClock;
use fiscal_core::types::DbId;
use fiscal_db::PgRegistryStore;

/// The administrator seeded by the users migration.
pub const BOOTSTRAP_ADMIN_ID: DbId = 1;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        dashboard_top_expiring: 4,
        import_history_limit: 10,
    }
}

/// "Today" for every test request.
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 15).unwrap()
}

/// Build the full application router over `pool`, with the clock pinned to
/// [`test_today`].
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let state = AppState {
        store: Arc::new(PgRegistryStore::new(pool.clone())),
        pool,
        clock: Arc::new(FixedClock::on(test_today())),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

fn request(method: Method, uri: &str, user_id: Option<DbId>, body: Option<&Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(id) = user_id {
        builder = builder.header("x-user-id", id.to_string());
    }
    match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// GET without an `X-User-Id` header.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_as(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(user_id), None)).await
}

pub async fn post_json_as(app: Router, uri: &str, user_id: DbId, body: Value) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(user_id), Some(&body))).await
}

pub async fn put_json_as(app: Router, uri: &str, user_id: DbId, body: Value) -> Response<Body> {
    send(app, request(Method::PUT, uri, Some(user_id), Some(&body))).await
}

pub async fn delete_as(app: Router, uri: &str, user_id: DbId) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(user_id), None)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Create a user through the API as the bootstrap admin and return its id.
pub async fn create_user(app: Router, name: &str, email: &str, role: &str) -> DbId {
    let response = post_json_as(
        app,
        "/api/v1/users",
        BOOTSTRAP_ADMIN_ID,
        serde_json::json!({ "name": name, "email": email, "role": role }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create an operator through the API as the bootstrap admin and return its id.
pub async fn create_operator(app: Router, name: &str, expiry: &str) -> DbId {
    let response = post_json_as(
        app,
        "/api/v1/operators",
        BOOTSTRAP_ADMIN_ID,
        serde_json::json!({
            "name": name,
            "contract_number": format!("ДГ-{name}"),
            "contract_expiry_date": expiry,
        }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::CREATED);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}
