// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel route tests.

use amaliah_tracker::models::Role;
use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

mod common;

#[tokio::test]
async fn test_admin_creates_and_searches_users() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state.db, "guru", Role::Admin).await;
    let token = common::create_test_jwt(admin, Role::Admin);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/admin/users",
            &token,
            Some(json!({
                "username": "abdullah",
                "email": "abdullah@sekolah.test",
                "password": "bismillah",
                "full_name": "Abdullah Rahman",
                "class": "9C"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = common::body_json(response).await;
    assert_eq!(created["role"], "user");

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/admin/users/search?q=Rahman",
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let found = common::body_json(response).await;
    let found = found.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["username"], "abdullah");
}

#[tokio::test]
async fn test_admin_cannot_create_superadmin() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state.db, "guru", Role::Admin).await;
    let token = common::create_test_jwt(admin, Role::Admin);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/admin/users",
            &token,
            Some(json!({
                "username": "kepsek",
                "email": "kepsek@sekolah.test",
                "password": "bismillah",
                "full_name": "Kepala Sekolah",
                "role": "superadmin"
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_cannot_delete_self_or_superior() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state.db, "guru", Role::Admin).await;
    let boss = common::seed_user(&state.db, "kepsek", Role::SuperAdmin).await;
    let token = common::create_test_jwt(admin, Role::Admin);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "DELETE",
            &format!("/admin/users/{}", admin),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(common::authed_request(
            "DELETE",
            &format!("/admin/users/{}", boss),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    assert!(state.db.get_user(boss).await.unwrap().is_some());
}

#[tokio::test]
async fn test_admin_updates_and_resets_password() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state.db, "guru", Role::SuperAdmin).await;
    let student = common::seed_user(&state.db, "murid", Role::User).await;
    let token = common::create_test_jwt(admin, Role::SuperAdmin);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            &format!("/admin/users/{}", student),
            &token,
            Some(json!({
                "full_name": "Murid Teladan",
                "email": "murid@sekolah.test",
                "class": "9A",
                "role": "admin",
                "password": "sandibaru"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["role"], "admin");
    assert_eq!(body["class"], "9A");

    let response = app
        .oneshot(
            axum::http::Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header("content-type", "application/json")
                .body(axum::body::Body::from(
                    json!({ "username": "murid", "password": "sandibaru" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_detail_and_daily_report() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state.db, "guru", Role::Admin).await;
    let student = common::seed_user(&state.db, "murid", Role::User).await;
    let token = common::create_test_jwt(admin, Role::Admin);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "GET",
            &format!("/admin/users/{}/detail", student),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = common::body_json(response).await;
    assert_eq!(detail["user"]["username"], "murid");
    assert_eq!(detail["quran_sessions"], 0);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "GET",
            "/admin/reports/daily?date=2026-03-10&class=7A",
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report = common::body_json(response).await;
    assert_eq!(report["date"], "2026-03-10");
    // Only students appear in the report
    assert_eq!(report["rows"].as_array().unwrap().len(), 1);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/admin/reports/daily?date=kemarin",
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_class_management() {
    let (app, state) = common::create_test_app().await;
    let admin = common::seed_user(&state.db, "guru", Role::Admin).await;
    let token = common::create_test_jwt(admin, Role::Admin);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/admin/classes",
            &token,
            Some(json!({ "name": "X-TKJ", "level": "X", "description": "Teknik Komputer" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = common::body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/admin/classes", &token, None))
        .await
        .unwrap();
    let classes = common::body_json(response).await;
    assert_eq!(classes.as_array().unwrap().len(), 4);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "DELETE",
            &format!("/admin/classes/{}", id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(common::authed_request(
            "DELETE",
            &format!("/admin/classes/{}", id),
            &token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
