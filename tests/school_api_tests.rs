// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! School registration, approval and membership tests.

use amaliah_tracker::models::Role;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn json_post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn registration(username: &str) -> serde_json::Value {
    json!({
        "full_name": "Ustadzah Aminah",
        "phone": "081234567890",
        "school_name": "MTs Al-Hikmah",
        "school_address": "Jl. Masjid 1, Bandung",
        "school_level": "SMP",
        "student_count": 120,
        "username": username,
        "email": format!("{}@alhikmah.sch.id", username),
        "password": "amanah123"
    })
}

/// File a registration and return its request ID.
async fn file_registration(app: &axum::Router, username: &str) -> i64 {
    let response = app
        .clone()
        .oneshot(json_post("/auth/register-admin", registration(username)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "pending");
    body["id"].as_i64().unwrap()
}

/// Approve a registration as a fresh superadmin and return the response body.
async fn approve(app: &axum::Router, state: &amaliah_tracker::AppState, id: i64) -> serde_json::Value {
    let root = common::seed_user(&state.db, "root", Role::SuperAdmin).await;
    let token = common::create_test_jwt(root, Role::SuperAdmin);
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            &format!("/admin/school-requests/{}/approve", id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    common::body_json(response).await
}

#[tokio::test]
async fn test_registration_is_pending_until_approved() {
    let (app, state) = common::create_test_app().await;
    file_registration(&app, "aminah").await;

    // No account yet, so login fails.
    let response = app
        .clone()
        .oneshot(json_post(
            "/auth/login",
            json!({ "username": "aminah", "password": "amanah123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let pending = state.db.pending_admin_requests().await.unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].school_name, "MTs Al-Hikmah");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, state) = common::create_test_app().await;
    file_registration(&app, "aminah").await;
    common::seed_user(&state.db, "fatimah", Role::User).await;

    for username in ["aminah", "fatimah"] {
        let response = app
            .clone()
            .oneshot(json_post("/auth/register-admin", registration(username)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT, "{}", username);
    }
}

#[tokio::test]
async fn test_registration_requires_phone_and_level() {
    let (app, _) = common::create_test_app().await;
    let mut body = registration("aminah");
    body["phone"] = json!("");
    body["school_level"] = json!("");

    let response = app
        .oneshot(json_post("/auth/register-admin", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_approval_creates_school_and_admin() {
    let (app, state) = common::create_test_app().await;
    let id = file_registration(&app, "aminah").await;

    let approved = approve(&app, &state, id).await;
    let code = approved["school"]["code"].as_str().unwrap();
    assert_eq!(code.len(), 8);
    assert_eq!(approved["school"]["name"], "MTs Al-Hikmah");
    assert_eq!(approved["school"]["admin_id"], approved["admin_id"]);

    let admin = state
        .db
        .get_user_by_username("aminah")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(admin.school_id, approved["school"]["id"].as_i64());

    // The password given at registration works.
    let response = app
        .clone()
        .oneshot(json_post(
            "/auth/login",
            json!({ "username": "aminah", "password": "amanah123" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(state.db.pending_admin_requests().await.unwrap().is_empty());
    assert!(state.db.approve_admin_request(id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reject_only_pending_requests() {
    let (app, state) = common::create_test_app().await;
    let id = file_registration(&app, "aminah").await;
    let root = common::seed_user(&state.db, "root", Role::SuperAdmin).await;
    let token = common::create_test_jwt(root, Role::SuperAdmin);
    let uri = format!("/admin/school-requests/{}/reject", id);

    let response = app
        .clone()
        .oneshot(common::authed_request("POST", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(common::authed_request("POST", &uri, &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(state.db.get_user_by_username("aminah").await.unwrap().is_none());
}

#[tokio::test]
async fn test_school_review_needs_superadmin() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state.db, "guru", Role::Admin).await;
    let token = common::create_test_jwt(admin, Role::Admin);

    for uri in ["/admin/schools", "/admin/school-requests"] {
        let response = app
            .clone()
            .oneshot(common::authed_request("GET", uri, &token, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", uri);
    }
}

#[tokio::test]
async fn test_student_registers_into_school_by_code() {
    let (app, state) = common::create_test_app().await;
    let id = file_registration(&app, "aminah").await;
    let approved = approve(&app, &state, id).await;
    let code = approved["school"]["code"].as_str().unwrap().to_lowercase();

    let response = app
        .clone()
        .oneshot(json_post(
            "/auth/register",
            json!({
                "username": "hasan",
                "email": "hasan@alhikmah.sch.id",
                "password": "bismillah",
                "full_name": "Hasan",
                "school_code": code
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["user"]["school_id"], approved["school"]["id"]);

    let response = app
        .oneshot(json_post(
            "/auth/register",
            json!({
                "username": "husain",
                "email": "husain@alhikmah.sch.id",
                "password": "bismillah",
                "full_name": "Husain",
                "school_code": "NOPE1234"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.db.get_user_by_username("husain").await.unwrap().is_none());
}

#[tokio::test]
async fn test_join_school_once() {
    let (app, state) = common::create_test_app().await;
    let id = file_registration(&app, "aminah").await;
    let approved = approve(&app, &state, id).await;
    let code = approved["school"]["code"].as_str().unwrap().to_string();

    let student = common::seed_user(&state.db, "hasan", Role::User).await;
    let token = common::create_test_jwt(student, Role::User);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/school", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let join = || {
        common::authed_request(
            "POST",
            "/api/school/join",
            &token,
            Some(json!({ "code": code })),
        )
    };
    let response = app.clone().oneshot(join()).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["name"], "MTs Al-Hikmah");

    let response = app.clone().oneshot(join()).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(common::authed_request("GET", "/api/school", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_school_admin_manages_members() {
    let (app, state) = common::create_test_app().await;
    let id = file_registration(&app, "aminah").await;
    let approved = approve(&app, &state, id).await;
    let school_id = approved["school"]["id"].as_i64().unwrap();
    let admin_id = approved["admin_id"].as_i64().unwrap();
    let admin_token = common::create_test_jwt(admin_id, Role::Admin);

    let student = common::seed_user(&state.db, "hasan", Role::User).await;
    state.db.join_school(student, school_id).await.unwrap();
    let outsider = common::seed_user(&state.db, "umar", Role::User).await;
    let student_token = common::create_test_jwt(student, Role::User);

    // Students cannot see the member list.
    let response = app
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/api/school/members",
            &student_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/api/school/members",
            &admin_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let members = common::body_json(response).await;
    let members = members.as_array().unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0]["role"], "admin");
    assert_eq!(members[1]["id"], student);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            "/api/school",
            &admin_token,
            Some(json!({ "name": "MTs Al-Hikmah 2" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(common::body_json(response).await["name"], "MTs Al-Hikmah 2");

    let remove = |member: i64| {
        common::authed_request(
            "DELETE",
            &format!("/api/school/members/{}", member),
            &admin_token,
            None,
        )
    };
    let response = app.clone().oneshot(remove(admin_id)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.clone().oneshot(remove(outsider)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.clone().oneshot(remove(student)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let user = state.db.get_user(student).await.unwrap().unwrap();
    assert_eq!(user.school_id, None);
}

#[tokio::test]
async fn test_school_overview_counts_members() {
    let (app, state) = common::create_test_app().await;
    let id = file_registration(&app, "aminah").await;
    let approved = approve(&app, &state, id).await;
    let school_id = approved["school"]["id"].as_i64().unwrap();

    for name in ["hasan", "husain"] {
        let student = common::seed_user(&state.db, name, Role::User).await;
        state.db.join_school(student, school_id).await.unwrap();
    }

    let schools = state.db.list_schools().await.unwrap();
    assert_eq!(schools.len(), 1);
    assert_eq!(schools[0].members, 3);
}
