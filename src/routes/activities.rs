// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily activity logging: prayers, fasting, Quran reading and amaliah.

use crate::db::activities::AmaliahToggle;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::quran::{daily_page_target, juz_completed, khatam_progress};
use crate::models::{
    AmaliahType, FastingRecord, FastingStatus, NewQuranReading, PrayerRecord, PrayerSlotStats,
    PrayerStatus, QuranReading, StreakResult,
};
use crate::routes::api::{load_user, streak_or_zero};
use crate::services::ActivityKind;
use crate::time_utils::{days_between, month_bounds, parse_day};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

const RECENT_READINGS: i64 = 10;
const WEEK_DAYS: i64 = 7;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/prayers", get(get_prayer).put(save_prayer))
        .route("/api/prayers/stats", get(get_prayer_stats))
        .route("/api/fasting", get(get_fasting).put(save_fasting))
        .route("/api/quran", get(get_quran).post(add_quran))
        .route("/api/quran/{id}", delete(delete_quran))
        .route("/api/amaliah", get(get_amaliah).post(check_amaliah))
        .route("/api/amaliah/{type_id}", delete(uncheck_amaliah))
}

#[derive(Debug, Default, Deserialize)]
pub struct DayQuery {
    date: Option<String>,
}

/// Resolve an optional `YYYY-MM-DD` day, defaulting to today.
fn resolve_day(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(today),
        Some(raw) => {
            parse_day(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid date '{}'", raw)))
        }
    }
}

/// Like [`resolve_day`], but logging ahead of today is refused.
fn resolve_log_day(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let date = resolve_day(raw, today)?;
    if date > today {
        return Err(AppError::BadRequest(
            "Cannot log activity for a future date".to_string(),
        ));
    }
    Ok(date)
}

// ─── Prayers ─────────────────────────────────────────────────

/// Prayer record for a day; days with nothing logged read as all `belum`.
async fn get_prayer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DayQuery>,
) -> Result<Json<PrayerRecord>> {
    let date = resolve_day(query.date.as_deref(), state.config.today())?;
    let record = state
        .db
        .get_prayer(user.user_id, date)
        .await?
        .unwrap_or_else(|| PrayerRecord::empty(user.user_id, date));
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct PrayerForm {
    date: Option<String>,
    #[serde(default)]
    subuh: PrayerStatus,
    #[serde(default)]
    dzuhur: PrayerStatus,
    #[serde(default)]
    ashar: PrayerStatus,
    #[serde(default)]
    maghrib: PrayerStatus,
    #[serde(default)]
    isya: PrayerStatus,
}

async fn save_prayer(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<PrayerForm>,
) -> Result<Json<PrayerRecord>> {
    let date = resolve_log_day(form.date.as_deref(), state.config.today())?;
    let record = PrayerRecord {
        user_id: user.user_id,
        date,
        subuh: form.subuh,
        dzuhur: form.dzuhur,
        ashar: form.ashar,
        maghrib: form.maghrib,
        isya: form.isya,
    };

    state.db.upsert_prayer(&record).await?;
    tracing::info!(
        user_id = user.user_id,
        %date,
        attended = record.attended_count(),
        "Prayer record saved"
    );

    Ok(Json(record))
}

#[derive(Debug, Serialize)]
pub struct PrayerStatsResponse {
    pub month: PrayerSlotStats,
    /// Last seven days, oldest first
    pub week: Vec<PrayerRecord>,
    pub streak: StreakResult,
}

async fn get_prayer_stats(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<PrayerStatsResponse>> {
    let today = state.config.today();
    let (first, last) = month_bounds(today);
    let month = state.db.prayer_slot_stats(user.user_id, first, last).await?;

    let week_start = today - Duration::days(WEEK_DAYS - 1);
    let logged = state
        .db
        .prayers_between(user.user_id, week_start, today)
        .await?;
    let week = days_between(week_start, today)
        .into_iter()
        .map(|date| {
            logged
                .iter()
                .find(|r| r.date == date)
                .cloned()
                .unwrap_or_else(|| PrayerRecord::empty(user.user_id, date))
        })
        .collect();

    let streak = streak_or_zero(&state, user.user_id, ActivityKind::Prayer, today).await;

    Ok(Json(PrayerStatsResponse {
        month,
        week,
        streak,
    }))
}

// ─── Fasting ─────────────────────────────────────────────────

/// One cell of the monthly fasting calendar.
#[derive(Debug, Serialize)]
pub struct FastingDay {
    pub date: NaiveDate,
    pub has_record: bool,
    pub status: Option<FastingStatus>,
    pub reason: String,
    pub is_today: bool,
    pub is_past: bool,
}

/// Counts over explicit records only; days without a record are neither.
#[derive(Debug, Default, Serialize)]
pub struct FastingStats {
    pub fasting_days: i64,
    pub not_fasting_days: i64,
    /// Days of the month up to and including today
    pub days_elapsed: i64,
}

#[derive(Debug, Serialize)]
pub struct FastingMonthResponse {
    pub today: Option<FastingRecord>,
    pub calendar: Vec<FastingDay>,
    pub stats: FastingStats,
    pub streak: StreakResult,
}

async fn get_fasting(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<FastingMonthResponse>> {
    let today = state.config.today();
    let (first, last) = month_bounds(today);
    let records = state.db.fastings_between(user.user_id, first, last).await?;

    let calendar = days_between(first, last)
        .into_iter()
        .map(|date| {
            let record = records.iter().find(|r| r.date == date);
            FastingDay {
                date,
                has_record: record.is_some(),
                status: record.map(|r| r.status),
                reason: record.map(|r| r.reason.clone()).unwrap_or_default(),
                is_today: date == today,
                is_past: date < today,
            }
        })
        .collect();

    let fasting_days = records.iter().filter(|r| r.is_complete()).count() as i64;
    let stats = FastingStats {
        fasting_days,
        not_fasting_days: records.len() as i64 - fasting_days,
        days_elapsed: (today - first).num_days() + 1,
    };

    let streak = streak_or_zero(&state, user.user_id, ActivityKind::Fasting, today).await;

    Ok(Json(FastingMonthResponse {
        today: records.into_iter().find(|r| r.date == today),
        calendar,
        stats,
        streak,
    }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct FastingForm {
    date: Option<String>,
    status: FastingStatus,
    #[serde(default)]
    #[validate(length(max = 200))]
    reason: String,
}

async fn save_fasting(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(form): Json<FastingForm>,
) -> Result<Json<FastingRecord>> {
    form.validate()?;
    let date = resolve_log_day(form.date.as_deref(), state.config.today())?;

    let reason = match form.status {
        FastingStatus::Fasting => String::new(),
        FastingStatus::NotFasting => {
            let reason = form.reason.trim();
            if reason.is_empty() {
                return Err(AppError::BadRequest(
                    "A reason is required when not fasting".to_string(),
                ));
            }
            reason.to_string()
        }
    };

    let record = FastingRecord {
        user_id: user.user_id,
        date,
        status: form.status,
        reason,
    };
    state.db.upsert_fasting(&record).await?;
    tracing::info!(user_id = user.user_id, %date, status = record.status.as_str(), "Fasting record saved");

    Ok(Json(record))
}

// ─── Quran ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct QuranOverview {
    pub recent: Vec<QuranReading>,
    pub total_sessions: i64,
    pub total_pages: i64,
    pub juz_completed: i64,
    /// Percent of the full mushaf, capped at 100
    pub khatam_progress: f64,
    pub target_khatam: i64,
    pub daily_target: i64,
    pub today_pages: i64,
    pub streak: StreakResult,
}

async fn get_quran(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<QuranOverview>> {
    let today = state.config.today();
    let user = load_user(&state, auth.user_id).await?;

    let recent = state
        .db
        .recent_quran_readings(user.id, RECENT_READINGS)
        .await?;
    let total_sessions = state.db.quran_reading_count(user.id).await?;
    let total_pages = state.db.quran_total_pages(user.id).await?;
    let today_pages: i64 = state
        .db
        .quran_pages_by_day(user.id, today, today)
        .await?
        .into_iter()
        .map(|(_, pages)| pages)
        .sum();
    let streak = streak_or_zero(&state, user.id, ActivityKind::Quran, today).await;

    Ok(Json(QuranOverview {
        recent,
        total_sessions,
        total_pages,
        juz_completed: juz_completed(total_pages),
        khatam_progress: khatam_progress(total_pages),
        target_khatam: user.target_khatam,
        daily_target: daily_page_target(user.target_khatam),
        today_pages,
        streak,
    }))
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

/// Log a reading session for today.
async fn add_quran(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(reading): Json<NewQuranReading>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    reading.validate()?;

    let today = state.config.today();
    let id = state
        .db
        .add_quran_reading(user.user_id, today, &reading)
        .await?;
    tracing::info!(
        user_id = user.user_id,
        reading_id = id,
        pages = reading.pages,
        "Quran reading logged"
    );

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

async fn delete_quran(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if !state.db.delete_quran_reading(user.user_id, id).await? {
        return Err(AppError::NotFound(format!("Reading {} not found", id)));
    }
    tracing::info!(user_id = user.user_id, reading_id = id, "Quran reading deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Amaliah ─────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct AmaliahItem {
    #[serde(flatten)]
    pub amaliah: AmaliahType,
    pub done: bool,
}

#[derive(Debug, Serialize)]
pub struct AmaliahOverview {
    pub date: NaiveDate,
    pub items: Vec<AmaliahItem>,
    pub points_today: i64,
    pub total_points: i64,
    pub streak: StreakResult,
}

async fn get_amaliah(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<AmaliahOverview>> {
    let today = state.config.today();
    let user = load_user(&state, auth.user_id).await?;

    let done = state.db.amaliah_done_on(user.id, today).await?;
    let items = state
        .db
        .amaliah_types()
        .await?
        .into_iter()
        .map(|amaliah| AmaliahItem {
            done: done.contains(&amaliah.id),
            amaliah,
        })
        .collect();
    let points_today = state
        .db
        .amaliah_points_between(user.id, today, today)
        .await?;
    let streak = streak_or_zero(&state, user.id, ActivityKind::Amaliah, today).await;

    Ok(Json(AmaliahOverview {
        date: today,
        items,
        points_today,
        total_points: user.points,
        streak,
    }))
}

/// Active amaliah type by ID; unknown and retired types are both not found.
async fn active_amaliah(state: &AppState, type_id: i64) -> Result<AmaliahType> {
    state
        .db
        .get_amaliah_type(type_id)
        .await?
        .filter(|t| t.is_active)
        .ok_or_else(|| AppError::NotFound(format!("Amaliah type {} not found", type_id)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AmaliahCheckRequest {
    amaliah_type_id: i64,
    #[serde(default)]
    #[validate(length(max = 200))]
    notes: String,
}

#[derive(Debug, Serialize)]
pub struct AmaliahToggleResponse {
    /// Points credited (positive) or debited (negative)
    pub points_delta: i64,
    pub total_points: i64,
}

async fn check_amaliah(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AmaliahCheckRequest>,
) -> Result<Json<AmaliahToggleResponse>> {
    req.validate()?;
    let amaliah = active_amaliah(&state, req.amaliah_type_id).await?;
    let today = state.config.today();

    match state
        .db
        .check_amaliah(user.user_id, &amaliah, today, req.notes.trim())
        .await?
    {
        AmaliahToggle::Changed { points } => toggle_response(&state, user.user_id, points).await,
        AmaliahToggle::Unchanged => Err(AppError::Conflict(format!(
            "{} already recorded today",
            amaliah.name
        ))),
    }
}

async fn uncheck_amaliah(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(type_id): Path<i64>,
) -> Result<Json<AmaliahToggleResponse>> {
    let amaliah = active_amaliah(&state, type_id).await?;
    let today = state.config.today();

    match state
        .db
        .uncheck_amaliah(user.user_id, &amaliah, today)
        .await?
    {
        AmaliahToggle::Changed { points } => toggle_response(&state, user.user_id, points).await,
        AmaliahToggle::Unchanged => Err(AppError::NotFound(format!(
            "{} not recorded today",
            amaliah.name
        ))),
    }
}

async fn toggle_response(
    state: &AppState,
    user_id: i64,
    points_delta: i64,
) -> Result<Json<AmaliahToggleResponse>> {
    let user = load_user(state, user_id).await?;
    tracing::info!(user_id, points_delta, total = user.points, "Amaliah toggled");
    Ok(Json(AmaliahToggleResponse {
        points_delta,
        total_points: user.points,
    }))
}
