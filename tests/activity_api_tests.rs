// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! End-to-end tests for activity logging through the HTTP API.

use amaliah_tracker::models::Role;
use amaliah_tracker::time_utils::format_day;
use axum::http::StatusCode;
use chrono::Duration;
use serde_json::json;
use tower::ServiceExt;

mod common;

fn all_prayers(date: &str) -> serde_json::Value {
    json!({
        "date": date,
        "subuh": "jamaah",
        "dzuhur": "sendiri",
        "ashar": "jamaah",
        "maghrib": "jamaah",
        "isya": "sendiri"
    })
}

#[tokio::test]
async fn test_two_complete_prayer_days_give_streak_of_two() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "ali", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let today = state.config.today();
    for date in [today - Duration::days(1), today] {
        let response = app
            .clone()
            .oneshot(common::authed_request(
                "PUT",
                "/api/prayers",
                &token,
                Some(all_prayers(&format_day(date))),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/dashboard", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["streaks"]["prayer"]["current"], 2);
    assert_eq!(body["streaks"]["prayer"]["best"], 2);
    assert_eq!(body["streaks"]["fasting"]["current"], 0);
    assert_eq!(body["prayers_attended"], 5);
    assert!(body["schedule"].is_null());

    let new_badges: Vec<&str> = body["new_badges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["name"].as_str().unwrap())
        .collect();
    assert_eq!(new_badges, vec!["Awal Langkah"]);

    // A second visit awards nothing new
    let response = app
        .oneshot(common::authed_request("GET", "/api/dashboard", &token, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert!(body["new_badges"].as_array().unwrap().is_empty());
    assert_eq!(body["badges"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_incomplete_prayer_day_does_not_count() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "salman", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let mut partial = all_prayers(&format_day(state.config.today()));
    partial["isya"] = json!("belum");

    let response = app
        .clone()
        .oneshot(common::authed_request("PUT", "/api/prayers", &token, Some(partial)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(common::authed_request("GET", "/api/dashboard", &token, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["streaks"]["prayer"]["current"], 0);
    assert_eq!(body["prayers_attended"], 4);
}

#[tokio::test]
async fn test_future_prayer_rejected() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "anas", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let tomorrow = format_day(state.config.today() + Duration::days(1));
    let response = app
        .oneshot(common::authed_request(
            "PUT",
            "/api/prayers",
            &token,
            Some(all_prayers(&tomorrow)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unlogged_prayer_day_reads_as_belum() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "mush", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let response = app
        .oneshot(common::authed_request(
            "GET",
            "/api/prayers?date=2026-03-01",
            &token,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["date"], "2026-03-01");
    assert_eq!(body["subuh"], "belum");
    assert_eq!(body["isya"], "belum");
}

#[tokio::test]
async fn test_not_fasting_requires_reason() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "hafsah", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            "/api/fasting",
            &token,
            Some(json!({ "status": "tidak", "reason": "  " })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "PUT",
            "/api/fasting",
            &token,
            Some(json!({ "status": "tidak", "reason": "Sakit" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(common::authed_request("GET", "/api/fasting", &token, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["today"]["status"], "tidak");
    assert_eq!(body["today"]["reason"], "Sakit");
    assert_eq!(body["stats"]["fasting_days"], 0);
    assert_eq!(body["stats"]["not_fasting_days"], 1);
    assert_eq!(body["streak"]["current"], 0);
}

#[tokio::test]
async fn test_fasting_clears_reason() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "saad", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let response = app
        .oneshot(common::authed_request(
            "PUT",
            "/api/fasting",
            &token,
            Some(json!({ "status": "puasa", "reason": "leftover" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["status"], "puasa");
    assert_eq!(body["reason"], "");
}

#[tokio::test]
async fn test_quran_delete_by_non_owner_is_not_found() {
    let (app, state) = common::create_test_app().await;
    let owner = common::seed_user(&state.db, "owner", Role::User).await;
    let other = common::seed_user(&state.db, "other", Role::User).await;
    let owner_token = common::create_test_jwt(owner, Role::User);
    let other_token = common::create_test_jwt(other, Role::User);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/quran",
            &owner_token,
            Some(json!({
                "start_surah_id": 1,
                "start_surah_name": "Al-Fatihah",
                "start_ayah": 1,
                "end_surah_id": 2,
                "end_surah_name": "Al-Baqarah",
                "end_ayah": 25,
                "pages": 4
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let id = common::body_json(response).await["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "DELETE",
            &format!("/api/quran/{}", id),
            &other_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(common::authed_request("GET", "/api/quran", &owner_token, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;
    assert_eq!(body["total_sessions"], 1);
    assert_eq!(body["total_pages"], 4);
    assert_eq!(body["today_pages"], 4);
    assert_eq!(body["daily_target"], 21);

    let response = app
        .oneshot(common::authed_request(
            "DELETE",
            &format!("/api/quran/{}", id),
            &owner_token,
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_quran_backwards_range_rejected() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "umair", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/quran",
            &token,
            Some(json!({
                "start_surah_id": 3,
                "start_ayah": 10,
                "end_surah_id": 3,
                "end_ayah": 5
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_amaliah_points_credit_and_debit_once() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "rahmah", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);
    let check = json!({ "amaliah_type_id": 1 });

    let response = app
        .clone()
        .oneshot(common::authed_request("POST", "/api/amaliah", &token, Some(check.clone())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["points_delta"], 10);
    assert_eq!(body["total_points"], 10);

    // Checking the same amaliah twice in a day is refused
    let response = app
        .clone()
        .oneshot(common::authed_request("POST", "/api/amaliah", &token, Some(check)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(common::authed_request("DELETE", "/api/amaliah/1", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    assert_eq!(body["points_delta"], -10);
    assert_eq!(body["total_points"], 0);

    let response = app
        .oneshot(common::authed_request("DELETE", "/api/amaliah/1", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let user = state.db.get_user(user_id).await.unwrap().unwrap();
    assert_eq!(user.points, 0);
}

#[tokio::test]
async fn test_unknown_amaliah_type_not_found() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "sumayyah", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/amaliah",
            &token,
            Some(json!({ "amaliah_type_id": 999 })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_amaliah_overview_marks_done() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "asma", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    app.clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/amaliah",
            &token,
            Some(json!({ "amaliah_type_id": 2, "notes": "ba'da subuh" })),
        ))
        .await
        .unwrap();

    let response = app
        .oneshot(common::authed_request("GET", "/api/amaliah", &token, None))
        .await
        .unwrap();
    let body = common::body_json(response).await;

    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 10);
    let done: Vec<i64> = items
        .iter()
        .filter(|i| i["done"] == true)
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(done, vec![2]);
    assert_eq!(body["points_today"], 5);
    assert_eq!(body["streak"]["current"], 1);
}

#[tokio::test]
async fn test_profile_rejects_bad_khatam_target() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "ammar", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let response = app
        .oneshot(common::authed_request(
            "PUT",
            "/api/profile",
            &token,
            Some(json!({
                "full_name": "Ammar",
                "email": "ammar@sekolah.test",
                "target_khatam": 0
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_change_password_requires_current() {
    let (app, state) = common::create_test_app().await;
    let user_id = common::seed_user(&state.db, "usman", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/profile/password",
            &token,
            Some(json!({
                "current_password": "tebakan",
                "new_password": "sandibaru",
                "confirm_password": "sandibaru"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(common::authed_request(
            "POST",
            "/api/profile/password",
            &token,
            Some(json!({
                "current_password": common::TEST_PASSWORD,
                "new_password": "sandibaru",
                "confirm_password": "berbeda"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(common::authed_request(
            "POST",
            "/api/profile/password",
            &token,
            Some(json!({
                "current_password": common::TEST_PASSWORD,
                "new_password": "sandibaru",
                "confirm_password": "sandibaru"
            })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_dashboard_survives_upstream_and_history_failures() {
    let mut server = mockito::Server::new_async().await;
    let schedule = server
        .mock("POST", "/shalat")
        .with_status(500)
        .with_body("down")
        .create_async()
        .await;

    let url = server.url();
    let (app, state) = common::create_test_app_with_upstream(Some(&url)).await;
    let user_id = common::seed_user(&state.db, "salman", Role::User).await;
    let token = common::create_test_jwt(user_id, Role::User);

    let user = state.db.get_user(user_id).await.unwrap().unwrap();
    let mut profile = amaliah_tracker::db::users::ProfileUpdate::from(&user);
    profile.province = "Jawa Barat".to_string();
    profile.city = "Kota Bandung".to_string();
    state.db.update_profile(user_id, &profile).await.unwrap();

    // One real reading today, plus a row whose date cannot be read back.
    let today = format_day(state.config.today());
    for date in [today.as_str(), "not-a-day"] {
        sqlx::query(
            "INSERT INTO quran_readings (user_id, date, start_surah_id, start_ayah, \
             end_surah_id, end_ayah, pages) VALUES (?1, ?2, 1, 1, 2, 5, 2)",
        )
        .bind(user_id)
        .bind(date)
        .execute(state.db.pool())
        .await
        .unwrap();
    }

    let response = app
        .oneshot(common::authed_request("GET", "/api/dashboard", &token, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert!(body["schedule"].is_null());
    assert_eq!(body["streaks"]["quran"]["current"], 0);
    assert_eq!(body["streaks"]["quran"]["best"], 0);
    assert_eq!(body["quran_sessions"], 2);
    schedule.assert_async().await;
}
