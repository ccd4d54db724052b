// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin panel routes. Mounted behind both `require_auth` and
//! `require_admin` in routes/mod.rs.

use crate::db::users::{AdminUserUpdate, NewUser};
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::stats::percentage;
use crate::models::{
    ClassInfo, DailyCompletion, DailyReportRow, DayActivityStats, EarnedBadge, FastingRecord,
    LeaderboardEntry, PrayerRecord, PrayerSlotStats, QuranReading, Role, User, UserCounts,
};
use crate::routes::activities::CreatedResponse;
use crate::routes::api::UserResponse;
use crate::services::password::hash_password;
use crate::time_utils::{month_bounds, parse_day};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const TOP_USERS: i64 = 5;
const SERIES_DAYS: i64 = 7;
const DETAIL_RECENT: usize = 7;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/users", get(list_users).post(create_user))
        .route("/admin/users/search", get(search_users))
        .route(
            "/admin/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/admin/users/{id}/detail", get(user_detail))
        .route("/admin/reports/daily", get(daily_report))
        .route("/admin/classes", get(list_classes).post(create_class))
        .route("/admin/classes/{id}", delete(delete_class))
}

/// An admin may manage accounts of equal or lower rank, but never their own
/// account through the admin panel.
fn ensure_can_manage(actor: &AuthUser, target: &User) -> Result<()> {
    if actor.user_id == target.id {
        return Err(AppError::BadRequest(
            "Use the profile page to change your own account".to_string(),
        ));
    }
    if target.role > actor.role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Roles above the actor's own cannot be handed out.
fn ensure_can_grant(actor: &AuthUser, role: Role) -> Result<()> {
    if role > actor.role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

async fn target_user(state: &AppState, id: i64) -> Result<User> {
    state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))
}

#[derive(Debug, Serialize)]
pub struct AdminDashboard {
    pub date: NaiveDate,
    pub counts: UserCounts,
    pub active_today: i64,
    pub today: DayActivityStats,
    pub top_users: Vec<LeaderboardEntry>,
    /// Share of students with a prayer record today
    pub prayer_participation: f64,
    /// Share of students recorded as fasting today
    pub fasting_participation: f64,
    pub prayer_series: Vec<DailyCompletion>,
}

async fn dashboard(State(state): State<Arc<AppState>>) -> Result<Json<AdminDashboard>> {
    let date = state.config.today();

    let counts = state.db.user_counts().await?;
    let active_today = state.db.active_users_on(date).await?;
    let today = state.db.day_activity_stats(date).await?;
    let top_users = state.db.leaderboard(TOP_USERS).await?;
    let prayer_series = state
        .db
        .prayer_completion_series(date, SERIES_DAYS)
        .await?;

    Ok(Json(AdminDashboard {
        date,
        prayer_participation: percentage(today.prayer_records, counts.users),
        fasting_participation: percentage(today.fasting, counts.users),
        counts,
        active_today,
        today,
        top_users,
        prayer_series,
    }))
}

// ─── Users ───────────────────────────────────────────────────

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Json<Vec<UserResponse>>> {
    let users = state.db.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<UserResponse>>> {
    let users = if query.q.trim().is_empty() {
        state.db.list_users().await?
    } else {
        state.db.search_users(&query.q).await?
    };
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>> {
    Ok(Json(UserResponse::from(target_user(&state, id).await?)))
}

fn default_role() -> Role {
    Role::User
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 3, max = 50))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 6, max = 200))]
    password: String,
    #[validate(length(min = 1, max = 100))]
    full_name: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    class: String,
    #[serde(default = "default_role")]
    role: Role,
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    req.validate()?;
    ensure_can_grant(&actor, req.role)?;

    let new_user = NewUser {
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        password_hash: hash_password(&req.password)?,
        full_name: req.full_name.trim().to_string(),
        class: req.class.trim().to_string(),
        role: req.role,
        school_id: None,
    };
    let id = state.db.create_user(&new_user).await.map_err(|e| match e {
        AppError::Conflict(_) => {
            AppError::Conflict("Username or email already registered".to_string())
        }
        other => other,
    })?;

    tracing::info!(admin_id = actor.user_id, user_id = id, "Admin created user");
    let user = target_user(&state, id).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100))]
    full_name: String,
    #[validate(email)]
    email: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    class: String,
    role: Role,
    /// New password; left unchanged when absent
    #[validate(length(min = 6, max = 200))]
    password: Option<String>,
}

async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>> {
    req.validate()?;
    let target = target_user(&state, id).await?;
    ensure_can_manage(&actor, &target)?;
    ensure_can_grant(&actor, req.role)?;

    let update = AdminUserUpdate {
        full_name: req.full_name.trim().to_string(),
        email: req.email.trim().to_string(),
        class: req.class.trim().to_string(),
        role: req.role,
    };
    state.db.admin_update_user(id, &update).await?;

    if let Some(password) = req.password.as_deref().filter(|p| !p.is_empty()) {
        state.db.update_password(id, &hash_password(password)?).await?;
        tracing::info!(admin_id = actor.user_id, user_id = id, "Admin reset password");
    }

    tracing::info!(
        admin_id = actor.user_id,
        user_id = id,
        role = %update.role,
        "Admin updated user"
    );
    Ok(Json(UserResponse::from(target_user(&state, id).await?)))
}

async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    let target = target_user(&state, id).await?;
    ensure_can_manage(&actor, &target)?;

    if !state.db.delete_user(id).await? {
        return Err(AppError::NotFound(format!("User {} not found", id)));
    }
    tracing::warn!(
        admin_id = actor.user_id,
        user_id = id,
        username = %target.username,
        "Admin deleted user"
    );
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub user: UserResponse,
    pub month_prayers: PrayerSlotStats,
    pub month_fasting_days: i64,
    pub month_not_fasting_days: i64,
    pub month_points: i64,
    pub quran_sessions: i64,
    pub quran_pages: i64,
    pub recent_prayers: Vec<PrayerRecord>,
    pub recent_fastings: Vec<FastingRecord>,
    pub recent_readings: Vec<QuranReading>,
    pub badges: Vec<EarnedBadge>,
}

/// Month-to-date summary and recent history for one user.
async fn user_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<UserDetail>> {
    let user = target_user(&state, id).await?;
    let today = state.config.today();
    let (first, _) = month_bounds(today);

    let month_prayers = state.db.prayer_slot_stats(id, first, today).await?;
    let fastings = state.db.fastings_between(id, first, today).await?;
    let month_fasting_days = fastings.iter().filter(|f| f.is_complete()).count() as i64;
    let month_points = state.db.amaliah_points_between(id, first, today).await?;

    Ok(Json(UserDetail {
        month_prayers,
        month_fasting_days,
        month_not_fasting_days: fastings.len() as i64 - month_fasting_days,
        month_points,
        quran_sessions: state.db.quran_reading_count(id).await?,
        quran_pages: state.db.quran_total_pages(id).await?,
        recent_prayers: state.db.recent_prayers(id, DETAIL_RECENT).await?,
        recent_fastings: state.db.recent_fastings(id, DETAIL_RECENT).await?,
        recent_readings: state
            .db
            .recent_quran_readings(id, DETAIL_RECENT as i64)
            .await?,
        badges: state.db.user_badges(id).await?,
        user: UserResponse::from(user),
    }))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    date: Option<String>,
    class: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub class: Option<String>,
    pub rows: Vec<DailyReportRow>,
}

async fn daily_report(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<DailyReport>> {
    let date = match query.date.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => parse_day(raw)
            .ok_or_else(|| AppError::BadRequest(format!("Invalid date '{}'", raw)))?,
        None => state.config.today(),
    };
    let class = query
        .class
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());

    let rows = state.db.daily_report(date, class.as_deref()).await?;
    Ok(Json(DailyReport { date, class, rows }))
}

// ─── Classes ─────────────────────────────────────────────────

async fn list_classes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<ClassInfo>>> {
    Ok(Json(state.db.list_classes().await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ClassRequest {
    #[validate(length(min = 1, max = 50))]
    name: String,
    #[serde(default)]
    #[validate(length(max = 20))]
    level: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    description: String,
}

async fn create_class(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClassRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    req.validate()?;
    let id = state
        .db
        .create_class(req.name.trim(), req.level.trim(), req.description.trim())
        .await?;
    tracing::info!(class_id = id, name = %req.name, "Class created");
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn delete_class(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if !state.db.delete_class(id).await? {
        return Err(AppError::NotFound(format!("Class {} not found", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
