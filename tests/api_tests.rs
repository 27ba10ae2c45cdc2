//! Router-level tests for registration, login, roles, and account lifecycle.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use sentinela::config::Config;
use sentinela::entities::{roles, user_roles, users};
use std::sync::Arc;
use tower::ServiceExt;

async fn spawn_app() -> (Arc<sentinela::api::AppState>, Router) {
    let db_path =
        std::env::temp_dir().join(format!("sentinela-api-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());

    let state = sentinela::api::create_app_state(config)
        .await
        .expect("failed to create app state");
    let router = sentinela::api::router(state.clone());
    (state, router)
}

async fn post_json(
    app: &Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn register(app: &Router, name: &str, email: &str, password: &str) -> i32 {
    let (status, body) = post_json(
        app,
        "/api/accounts/register",
        serde_json::json!({ "name": name, "email": email, "password": password }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    i32::try_from(body["data"]["user_id"].as_i64().unwrap()).unwrap()
}

async fn login(app: &Router, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
    post_json(
        app,
        "/api/auth/login",
        serde_json::json!({ "email": email, "password": password }),
    )
    .await
}

#[tokio::test]
async fn test_register_then_login_returns_same_user_id() {
    let (_, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    let (status, body) = login(&app, "ana@x.com", "Secret1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], serde_json::json!(user_id));
}

#[tokio::test]
async fn test_duplicate_registration_is_a_conflict() {
    let (_, app) = spawn_app().await;

    register(&app, "Ana", "ana@x.com", "Secret1").await;

    let (status, body) = post_json(
        &app,
        "/api/accounts/register",
        serde_json::json!({ "name": "Outra", "email": "ana@x.com", "password": "Secret2" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], serde_json::json!(false));
}

#[tokio::test]
async fn test_bad_credentials_are_undifferentiated_and_audited_without_user_id() {
    let (state, app) = spawn_app().await;

    register(&app, "Ana", "ana@x.com", "Secret1").await;

    let (unknown_status, unknown_body) = login(&app, "nobody@x.com", "Secret1").await;
    let (wrong_status, wrong_body) = login(&app, "ana@x.com", "wrong").await;

    assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    // Same error text whether the email or the password was bad.
    assert_eq!(unknown_body["error"], wrong_body["error"]);

    let failures: Vec<_> = state
        .store
        .list_access_logs()
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.action == "falha_login")
        .collect();
    assert_eq!(failures.len(), 2);
    assert!(failures.iter().all(|entry| entry.user_id.is_none()));
}

#[tokio::test]
async fn test_successful_login_is_audited_with_the_forwarded_origin() {
    let (state, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .header("X-Forwarded-For", "203.0.113.7, 10.0.0.1")
                .body(Body::from(
                    serde_json::json!({ "email": "ana@x.com", "password": "Secret1" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let logins: Vec<_> = state
        .store
        .list_access_logs()
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.action == "login")
        .collect();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].user_id, Some(user_id));
    assert_eq!(logins[0].ip, "203.0.113.7");
}

#[tokio::test]
async fn test_logout_requires_a_known_user_and_is_audited() {
    let (state, app) = spawn_app().await;

    let (status, _) =
        post_json(&app, "/api/auth/logout", serde_json::json!({ "user_id": 99 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    let (status, _) = post_json(
        &app,
        "/api/auth/logout",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let logouts: Vec<_> = state
        .store
        .list_access_logs()
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.action == "logout")
        .collect();
    assert_eq!(logouts.len(), 1);
    assert_eq!(logouts[0].user_id, Some(user_id));
}

#[tokio::test]
async fn test_assign_role_twice_leaves_one_role_and_one_link() {
    let (state, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    for _ in 0..2 {
        let (status, _) = post_json(
            &app,
            "/api/roles/assign",
            serde_json::json!({ "user_id": user_id, "role_name": "admin" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let role_rows = roles::Entity::find().all(&state.store.conn).await.unwrap();
    assert_eq!(role_rows.len(), 1);
    assert_eq!(role_rows[0].name, "admin");

    let link_rows = user_roles::Entity::find()
        .all(&state.store.conn)
        .await
        .unwrap();
    assert_eq!(link_rows.len(), 1);

    let (status, _) = post_json(
        &app,
        "/api/roles/assign",
        serde_json::json!({ "user_id": 99, "role_name": "admin" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_authorize_gates_on_role_intersection() {
    let (_, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    let (status, _) = post_json(
        &app,
        "/api/roles/authorize",
        serde_json::json!({ "user_id": user_id, "roles": ["admin"] }),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    post_json(
        &app,
        "/api/roles/assign",
        serde_json::json!({ "user_id": user_id, "role_name": "editor" }),
    )
    .await;

    let (status, _) = post_json(
        &app,
        "/api/roles/authorize",
        serde_json::json!({ "user_id": user_id, "roles": ["admin", "editor"] }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &app,
        "/api/roles/authorize",
        serde_json::json!({ "user_id": 99, "roles": ["admin"] }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_area_requires_the_admin_role() {
    let (_, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/admin/area?user_id={user_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    post_json(
        &app,
        "/api/roles/assign",
        serde_json::json!({ "user_id": user_id, "role_name": "admin" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/admin/area?user_id={user_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_deactivation_is_one_way_and_blocks_login() {
    let (_, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    let (status, _) = post_json(
        &app,
        "/api/accounts/deactivate",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &app,
        "/api/accounts/deactivate",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The correct password now reveals the account state instead of logging in.
    let (status, body) = login(&app, "ana@x.com", "Secret1").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], serde_json::json!("Conta desativada"));
}

#[tokio::test]
async fn test_anonymization_scrubs_the_account_and_is_guarded() {
    let (state, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    let (status, _) = post_json(
        &app,
        "/api/accounts/anonymize",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post_json(
        &app,
        "/api/accounts/anonymize",
        serde_json::json!({ "user_id": user_id }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The scrubbed email no longer resolves, so the old identity is gone.
    let (status, _) = login(&app, "ana@x.com", "Secret1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let user = users::Entity::find_by_id(user_id)
        .one(&state.store.conn)
        .await
        .unwrap()
        .unwrap();
    assert!(user.anonymized);
    assert_eq!(user.name, "Usuário Anonimizado");
    assert!(user.email.ends_with("@exemplo.com"));
}

#[tokio::test]
async fn test_anonymized_flag_blocks_login_after_a_password_match() {
    let (state, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;

    // Flip only the flag so the stored credentials still match and the
    // account-state check is the one that rejects.
    let user = users::Entity::find_by_id(user_id)
        .one(&state.store.conn)
        .await
        .unwrap()
        .unwrap();
    let mut active: users::ActiveModel = user.into();
    active.anonymized = Set(true);
    active.update(&state.store.conn).await.unwrap();

    let (status, body) = login(&app, "ana@x.com", "Secret1").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], serde_json::json!("Conta anonimizada"));
}

#[tokio::test]
async fn test_full_account_recovery_scenario() {
    let (state, app) = spawn_app().await;

    let user_id = register(&app, "Ana", "ana@x.com", "Secret1").await;
    assert_eq!(user_id, 1);

    let (status, _) = login(&app, "ana@x.com", "Secret1").await;
    assert_eq!(status, StatusCode::OK);

    let logins: Vec<_> = state
        .store
        .list_access_logs()
        .await
        .unwrap()
        .into_iter()
        .filter(|entry| entry.action == "login")
        .collect();
    assert_eq!(logins.len(), 1);
    assert_eq!(logins[0].user_id, Some(user_id));

    let (status, _) = post_json(
        &app,
        "/api/recovery/request",
        serde_json::json!({ "email": "ana@x.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let token_row = sentinela::entities::reset_tokens::Entity::find()
        .one(&state.store.conn)
        .await
        .unwrap()
        .expect("reset token should be stored");
    assert_eq!(token_row.user_id, user_id);
    let remaining = token_row.expires_at - chrono::Utc::now();
    assert!(remaining <= chrono::Duration::minutes(30));
    assert!(remaining > chrono::Duration::minutes(29));

    let (status, _) = post_json(
        &app,
        "/api/recovery/confirm",
        serde_json::json!({ "token": token_row.token, "new_password": "NewPass2" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = login(&app, "ana@x.com", "Secret1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = login(&app, "ana@x.com", "NewPass2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user_id"], serde_json::json!(user_id));
}
