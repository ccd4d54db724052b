// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use amaliah_tracker::config::Config;
use amaliah_tracker::db::{users::NewUser, Database};
use amaliah_tracker::middleware::auth::create_jwt;
use amaliah_tracker::models::Role;
use amaliah_tracker::routes::create_router;
use amaliah_tracker::services::password::hash_password;
use amaliah_tracker::services::PrayerTimeService;
use amaliah_tracker::AppState;
use axum::body::Body;
use axum::http::{header, Request};
use std::sync::Arc;

/// Password given to every seeded test account.
#[allow(dead_code)]
pub const TEST_PASSWORD: &str = "rahasia123";

/// Create a test app backed by a fresh in-memory database.
/// Upstream APIs point at `upstream_url` when given, otherwise nowhere.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app_with_upstream(
    upstream_url: Option<&str>,
) -> (axum::Router, Arc<AppState>) {
    let mut config = Config::test_default();
    if let Some(url) = upstream_url {
        config.prayer_api_url = url.to_string();
        config.geocoder_url = url.to_string();
    }

    let db = Database::in_memory()
        .await
        .expect("Failed to open in-memory database");
    let prayer_times =
        PrayerTimeService::from_config(&config).expect("Failed to build prayer time client");

    let state = Arc::new(AppState {
        config,
        db,
        prayer_times,
    });

    (create_router(state.clone()), state)
}

#[allow(dead_code)]
pub async fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_upstream(None).await
}

/// Insert an account and return its ID.
#[allow(dead_code)]
pub async fn seed_user(db: &Database, username: &str, role: Role) -> i64 {
    db.create_user(&NewUser {
        username: username.to_string(),
        email: format!("{}@sekolah.test", username),
        password_hash: hash_password(TEST_PASSWORD).expect("hash"),
        full_name: format!("Test {}", username),
        class: "7A".to_string(),
        role,
        school_id: None,
    })
    .await
    .expect("Failed to seed user")
}

/// Create a session JWT with the test signing key.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: i64, role: Role) -> String {
    create_jwt(user_id, role, &Config::test_default().jwt_signing_key).expect("Failed to sign JWT")
}

/// Build a request authenticated with a session cookie.
#[allow(dead_code)]
pub fn authed_request(method: &str, uri: &str, token: &str, body: Option<serde_json::Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, format!("token={}", token));

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}
