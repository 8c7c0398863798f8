use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

use api::auth::generate_jwt;
use db::models::user;
use util::config::AppConfig;
use util::state::AppState;

/// Fresh router over an in-memory database, with a deterministic config.
pub async fn test_app() -> (Router, DatabaseConnection) {
    AppConfig::set_global(AppConfig {
        env: "test".into(),
        project_name: "enrollment-api".into(),
        log_level: "api=warn".into(),
        log_file: "api.log".into(),
        log_to_stdout: false,
        database_path: "sqlite::memory:".into(),
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_duration_minutes: 60,
    });

    let db = db::test_utils::setup_test_db().await;
    let app = Router::new().nest("/api/v1", api::routes::routes(AppState::new(db.clone())));
    (app, db)
}

pub fn token_for(user: &user::Model) -> String {
    generate_jwt(user.id, user.role).0
}

/// Sends one request through the router and decodes the JSON envelope.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("Failed to build request"),
        None => builder.body(Body::empty()).expect("Failed to build request"),
    };

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response was not JSON")
    };
    (status, json)
}
