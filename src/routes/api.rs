// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users: profile, dashboard, rankings and
//! prayer schedules.

use crate::db::users::ProfileUpdate;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::quran::daily_page_target;
use crate::models::{
    Badge, EarnedBadge, FastingRecord, LeaderboardEntry, PrayerRecord, Role, StreakResult, User,
};
use crate::services::badge::BadgeAwarder;
use crate::services::password::{hash_password, verify_password};
use crate::services::prayer_times::{
    DailySchedule, DetectedPlace, ImsakiyahSchedule, LocationMatchOutcome, MonthlySchedule,
};
use crate::services::{compute_streak, ActivityKind};
use crate::time_utils::{days_between, month_bounds};
use crate::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const LEADERBOARD_SIZE: i64 = 50;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/profile", put(update_profile))
        .route("/api/profile/password", post(change_password))
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/api/badges", get(get_badges))
        .route("/api/schedule", get(get_schedule))
        .route("/api/imsakiyah", get(get_imsakiyah))
        .route("/api/location/detect", post(detect_location))
}

/// Location lists used by the profile form before login is required.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/locations/provinces", get(list_provinces))
        .route("/locations/cities", get(list_cities))
}

/// Load the authenticated user's row.
pub(crate) async fn load_user(state: &AppState, user_id: i64) -> Result<User> {
    state
        .db
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

// ─── User Profile ────────────────────────────────────────────

/// User as shown to clients. Never carries the password hash.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct UserResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub class: String,
    pub role: Role,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub points: i64,
    pub avatar: String,
    pub bio: String,
    pub theme: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub target_khatam: i64,
    pub province: String,
    pub city: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub school_id: Option<i64>,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            class: user.class,
            role: user.role,
            points: user.points,
            avatar: user.avatar,
            bio: user.bio,
            theme: user.theme,
            target_khatam: user.target_khatam,
            province: user.province,
            city: user.city,
            school_id: user.school_id,
            created_at: user.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

/// Get current user profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<UserResponse>> {
    let profile = load_user(&state, user.user_id).await?;
    Ok(Json(UserResponse::from(profile)))
}

fn default_theme() -> String {
    "light".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProfileRequest {
    #[validate(length(min = 1, max = 100))]
    full_name: String,
    #[validate(email)]
    email: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    class: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    bio: String,
    #[serde(default)]
    #[validate(length(max = 255))]
    avatar: String,
    #[serde(default = "default_theme")]
    #[validate(length(min = 1, max = 20))]
    theme: String,
    /// Days in which the user aims to finish the Quran
    #[validate(range(min = 1, max = 365))]
    target_khatam: i64,
    #[serde(default)]
    #[validate(length(max = 100))]
    province: String,
    #[serde(default)]
    #[validate(length(max = 100))]
    city: String,
}

async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<ProfileRequest>,
) -> Result<Json<UserResponse>> {
    req.validate()?;

    let update = ProfileUpdate {
        full_name: req.full_name.trim().to_string(),
        email: req.email.trim().to_string(),
        class: req.class.trim().to_string(),
        bio: req.bio,
        avatar: req.avatar,
        theme: req.theme,
        target_khatam: req.target_khatam,
        province: req.province.trim().to_string(),
        city: req.city.trim().to_string(),
    };
    state
        .db
        .update_profile(user.user_id, &update)
        .await
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::Conflict("Email already in use".to_string()),
            other => other,
        })?;

    tracing::info!(user_id = user.user_id, "Profile updated");
    let profile = load_user(&state, user.user_id).await?;
    Ok(Json(UserResponse::from(profile)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct PasswordChangeRequest {
    #[validate(length(min = 1))]
    current_password: String,
    #[validate(length(min = 6, max = 200))]
    new_password: String,
    #[validate(must_match(other = "new_password"))]
    confirm_password: String,
}

async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<PasswordChangeRequest>,
) -> Result<StatusCode> {
    req.validate()?;

    let profile = load_user(&state, user.user_id).await?;
    if !verify_password(&req.current_password, &profile.password_hash)? {
        return Err(AppError::BadRequest(
            "Current password is incorrect".to_string(),
        ));
    }

    let hash = hash_password(&req.new_password)?;
    state.db.update_password(user.user_id, &hash).await?;
    tracing::info!(user_id = user.user_id, "Password changed");

    Ok(StatusCode::NO_CONTENT)
}

// ─── Dashboard ───────────────────────────────────────────────

/// Streaks for each tracked activity.
#[derive(Debug, Default, Serialize)]
pub struct Streaks {
    pub prayer: StreakResult,
    pub fasting: StreakResult,
    pub quran: StreakResult,
    pub amaliah: StreakResult,
}

/// One day of the monthly Quran chart.
#[derive(Debug, Serialize)]
pub struct QuranChartDay {
    pub date: NaiveDate,
    pub target: i64,
    pub actual: i64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: UserResponse,
    pub today: NaiveDate,
    pub prayer: PrayerRecord,
    pub prayers_attended: usize,
    pub fasting: Option<FastingRecord>,
    pub amaliah_done: usize,
    pub amaliah_points_today: i64,
    pub quran_sessions: i64,
    pub fasting_days: i64,
    pub streaks: Streaks,
    /// Badges awarded by this request
    pub new_badges: Vec<Badge>,
    pub badges: Vec<EarnedBadge>,
    pub quran_chart: Vec<QuranChartDay>,
    pub schedule: Option<DailySchedule>,
}

async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<DashboardResponse>> {
    let today = state.config.today();
    let user = load_user(&state, auth.user_id).await?;

    let prayer = state
        .db
        .get_prayer(user.id, today)
        .await?
        .unwrap_or_else(|| PrayerRecord::empty(user.id, today));
    let fasting = state.db.get_fasting(user.id, today).await?;
    let amaliah_done = state.db.amaliah_done_on(user.id, today).await?.len();
    let amaliah_points_today = state
        .db
        .amaliah_points_between(user.id, today, today)
        .await?;
    let quran_sessions = state.db.quran_reading_count(user.id).await?;
    let fasting_days = state.db.fasting_day_count(user.id).await?;

    let streaks = Streaks {
        prayer: streak_or_zero(&state, user.id, ActivityKind::Prayer, today).await,
        fasting: streak_or_zero(&state, user.id, ActivityKind::Fasting, today).await,
        quran: streak_or_zero(&state, user.id, ActivityKind::Quran, today).await,
        amaliah: streak_or_zero(&state, user.id, ActivityKind::Amaliah, today).await,
    };

    let new_badges = BadgeAwarder::new(&state.db)
        .check_and_award(user.id, today)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(user_id = user.id, error = %e, "Badge check failed");
            Vec::new()
        });
    let badges = state.db.user_badges(user.id).await?;

    let quran_chart = quran_chart(&state, &user, today).await?;

    let schedule = if user.has_location() {
        match state
            .prayer_times
            .today_schedule(&user.province, &user.city, today)
            .await
        {
            Ok(day) => Some(day),
            Err(e) => {
                tracing::warn!(user_id = user.id, error = %e, "Prayer schedule unavailable");
                None
            }
        }
    } else {
        None
    };

    Ok(Json(DashboardResponse {
        prayers_attended: prayer.attended_count(),
        prayer,
        fasting,
        amaliah_done,
        amaliah_points_today,
        quran_sessions,
        fasting_days,
        streaks,
        new_badges,
        badges,
        quran_chart,
        schedule,
        today,
        user: UserResponse::from(user),
    }))
}

/// Streak for one activity; a history read failure shows as no streak.
pub(crate) async fn streak_or_zero(
    state: &AppState,
    user_id: i64,
    kind: ActivityKind,
    today: NaiveDate,
) -> StreakResult {
    match state.db.activity_dates(user_id, kind).await {
        Ok(index) => compute_streak(&index, today),
        Err(e) => {
            tracing::warn!(user_id, ?kind, error = %e, "Streak history unavailable");
            StreakResult::default()
        }
    }
}

/// Target versus actual pages for each day of the current month.
async fn quran_chart(state: &AppState, user: &User, today: NaiveDate) -> Result<Vec<QuranChartDay>> {
    let (first, last) = month_bounds(today);
    let target = daily_page_target(user.target_khatam);
    let pages = state.db.quran_pages_by_day(user.id, first, last).await?;

    Ok(days_between(first, last)
        .into_iter()
        .map(|date| QuranChartDay {
            date,
            target,
            actual: pages
                .iter()
                .find(|(d, _)| *d == date)
                .map_or(0, |(_, p)| *p),
        })
        .collect())
}

// ─── Rankings & Badges ───────────────────────────────────────

async fn get_leaderboard(State(state): State<Arc<AppState>>) -> Result<Json<Vec<LeaderboardEntry>>> {
    Ok(Json(state.db.leaderboard(LEADERBOARD_SIZE).await?))
}

#[derive(Debug, Serialize)]
pub struct BadgesResponse {
    pub earned: Vec<EarnedBadge>,
    /// Badges not yet held
    pub available: Vec<Badge>,
}

async fn get_badges(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BadgesResponse>> {
    let earned = state.db.user_badges(user.user_id).await?;
    let available = state
        .db
        .all_badges()
        .await?
        .into_iter()
        .filter(|badge| !earned.iter().any(|e| e.id == badge.id))
        .collect();

    Ok(Json(BadgesResponse { earned, available }))
}

// ─── Prayer Schedule ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    month: Option<u32>,
    year: Option<i32>,
}

/// Province and city from the profile, or a 400 if unset.
fn user_location(user: &User) -> Result<(&str, &str)> {
    if !user.has_location() {
        return Err(AppError::BadRequest(
            "Set your province and city in your profile first".to_string(),
        ));
    }
    Ok((user.province.as_str(), user.city.as_str()))
}

async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<MonthlySchedule>> {
    let user = load_user(&state, auth.user_id).await?;
    let (province, city) = user_location(&user)?;

    let today = state.config.today();
    let month = query.month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(AppError::BadRequest(format!("Invalid month {}", month)));
    }
    let year = query.year.unwrap_or_else(|| today.year());

    Ok(Json(
        state
            .prayer_times
            .monthly_schedule(province, city, month, year)
            .await?,
    ))
}

async fn get_imsakiyah(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ImsakiyahSchedule>> {
    let user = load_user(&state, auth.user_id).await?;
    let (province, city) = user_location(&user)?;
    Ok(Json(state.prayer_times.imsakiyah(province, city).await?))
}

// ─── Location ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LocationDetectRequest {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
pub struct LocationDetectResponse {
    pub detected: DetectedPlace,
    #[serde(flatten)]
    pub outcome: LocationMatchOutcome,
    /// Whether the match was stored on the profile
    pub saved: bool,
}

/// Reverse geocode the browser's position and, on a full match, store the
/// province and city on the profile.
async fn detect_location(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<LocationDetectRequest>,
) -> Result<Json<LocationDetectResponse>> {
    let detected = state.prayer_times.reverse_geocode(req.lat, req.lon).await?;
    let outcome = state.prayer_times.match_location(&detected).await?;

    let saved = if let LocationMatchOutcome::Matched { province, city } = &outcome {
        let user = load_user(&state, auth.user_id).await?;
        let mut update = ProfileUpdate::from(&user);
        update.province = province.clone();
        update.city = city.clone();
        state.db.update_profile(user.id, &update).await?;
        tracing::info!(user_id = user.id, %province, %city, "Location saved from detection");
        true
    } else {
        false
    };

    Ok(Json(LocationDetectResponse {
        detected,
        outcome,
        saved,
    }))
}

async fn list_provinces(State(state): State<Arc<AppState>>) -> Result<Json<Vec<String>>> {
    Ok(Json(state.prayer_times.provinces().await?))
}

#[derive(Debug, Deserialize)]
pub struct CitiesQuery {
    #[serde(default)]
    province: String,
}

async fn list_cities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CitiesQuery>,
) -> Result<Json<Vec<String>>> {
    let province = query.province.trim();
    if province.is_empty() {
        return Err(AppError::BadRequest("province is required".to_string()));
    }
    Ok(Json(state.prayer_times.cities(province).await?))
}
