//! HTTP-level tests for role-gated access.
//!
//! Denied actions must surface as 403 with `PERMISSION_DENIED`, never as an
//! empty result, and must leave stored records unchanged.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, create_operator, create_user, delete_as, get_as, post_json_as,
    put_json_as, BOOTSTRAP_ADMIN_ID,
};
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn capabilities_follow_role(pool: PgPool) {
    let app = build_test_app(pool);
    let manager = create_user(app.clone(), "Мария", "maria@company.ru", "manager").await;
    let viewer = create_user(app.clone(), "Пётр", "petr@company.ru", "viewer").await;

    let json = body_json(get_as(app.clone(), "/api/v1/me/capabilities", BOOTSTRAP_ADMIN_ID).await).await;
    assert_eq!(json["data"]["role"], "admin");
    assert_eq!(json["data"]["capabilities"].as_array().unwrap().len(), 7);

    let json = body_json(get_as(app.clone(), "/api/v1/me/capabilities", manager).await).await;
    let caps: Vec<&str> = json["data"]["capabilities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert_eq!(caps.len(), 6);
    assert!(!caps.contains(&"editUsers"));

    let json = body_json(get_as(app, "/api/v1/me/capabilities", viewer).await).await;
    let caps: Vec<&str> = json["data"]["capabilities"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c.as_str().unwrap())
        .collect();
    assert!(caps.iter().all(|c| c.starts_with("view")));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn manager_cannot_edit_users(pool: PgPool) {
    let app = build_test_app(pool);
    let manager = create_user(app.clone(), "Мария", "maria@company.ru", "manager").await;
    let viewer = create_user(app.clone(), "Пётр", "petr@company.ru", "viewer").await;

    let response = put_json_as(
        app.clone(),
        &format!("/api/v1/users/{viewer}"),
        manager,
        json!({ "role": "admin" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["code"], "PERMISSION_DENIED");

    let response = delete_as(app.clone(), &format!("/api/v1/users/{viewer}"), manager).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Managers can still read users; the viewer is unchanged.
    let json = body_json(get_as(app, "/api/v1/users?role=viewer", manager).await).await;
    let users = json["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], viewer);
    assert_eq!(users[0]["role"], "viewer");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn viewer_is_read_only(pool: PgPool) {
    let app = build_test_app(pool);
    let viewer = create_user(app.clone(), "Пётр", "petr@company.ru", "viewer").await;
    let ofd = create_operator(app.clone(), "ОФД.ру", "2025-06-15").await;

    let response = post_json_as(
        app.clone(),
        "/api/v1/devices",
        viewer,
        json!({
            "device_id": "ФН-1",
            "name": "Касса",
            "operator_id": ofd,
            "expiry_date": "2025-01-15",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = post_json_as(
        app.clone(),
        "/api/v1/import",
        viewer,
        json!({ "filename": "devices.xlsx", "rows": [] }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_as(app, "/api/v1/devices", viewer).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["data"].as_array().unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_user_management(pool: PgPool) {
    let app = build_test_app(pool);

    let response = post_json_as(
        app.clone(),
        "/api/v1/users",
        BOOTSTRAP_ADMIN_ID,
        json!({ "name": "Пётр", "email": "not-an-email", "role": "viewer" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let viewer = create_user(app.clone(), "Пётр", "petr@company.ru", "viewer").await;
    let response = post_json_as(
        app.clone(),
        "/api/v1/users",
        BOOTSTRAP_ADMIN_ID,
        json!({ "name": "Другой", "email": "petr@company.ru", "role": "viewer" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = delete_as(
        app.clone(),
        &format!("/api/v1/users/{BOOTSTRAP_ADMIN_ID}"),
        BOOTSTRAP_ADMIN_ID,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = delete_as(app.clone(), &format!("/api/v1/users/{viewer}"), BOOTSTRAP_ADMIN_ID).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let json = body_json(get_as(app, "/api/v1/users", BOOTSTRAP_ADMIN_ID).await).await;
    assert_eq!(json["data"]["summary"]["admin"], 1);
    assert_eq!(json["data"]["summary"]["viewer"], 0);
    // Earlier successful requests stamped the acting admin.
    assert_eq!(json["data"]["users"][0]["presence"], "online");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn denied_requests_leave_activity_untouched(pool: PgPool) {
    let app = build_test_app(pool);
    let manager = create_user(app.clone(), "Мария", "maria@company.ru", "manager").await;
    let viewer = create_user(app.clone(), "Пётр", "petr@company.ru", "viewer").await;

    let response = put_json_as(
        app.clone(),
        &format!("/api/v1/users/{viewer}"),
        manager,
        json!({ "role": "admin" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let response = delete_as(app.clone(), &format!("/api/v1/users/{viewer}"), manager).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(get_as(app.clone(), "/api/v1/users", BOOTSTRAP_ADMIN_ID).await).await;
    let users = json["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 3);
    for user in &users[1..] {
        assert!(user["last_active"].is_null(), "{user}");
        assert_eq!(user["presence"], "offline");
    }
    assert_eq!(users[2]["role"], "viewer");

    // A request the manager is allowed to make does count as activity.
    let response = get_as(app.clone(), "/api/v1/devices", manager).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(get_as(app, "/api/v1/users", BOOTSTRAP_ADMIN_ID).await).await;
    assert_eq!(json["data"]["users"][1]["id"], manager);
    assert_eq!(json["data"]["users"][1]["presence"], "online");
    assert!(json["data"]["users"][1]["last_active"].is_string());
}
