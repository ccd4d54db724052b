// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Derived statistics.

use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Consecutive-day streaks for one activity. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StreakResult {
    /// Run ending today or yesterday, otherwise 0
    pub current: u32,
    /// Longest run within the lookback window
    pub best: u32,
}

/// Leaderboard row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub full_name: String,
    pub class: String,
    pub avatar: String,
    pub points: i64,
    /// Distinct days with any logged activity
    pub active_days: i64,
}

/// School-wide account counts.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserCounts {
    pub total: i64,
    pub admins: i64,
    pub users: i64,
    pub total_points: i64,
    pub classes: i64,
}

/// Activity totals for one day across all users.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DayActivityStats {
    pub prayer_records: i64,
    pub complete_prayer_days: i64,
    pub fasting: i64,
    pub not_fasting: i64,
    pub quran_sessions: i64,
    pub quran_pages: i64,
    pub amaliah_entries: i64,
    pub amaliah_points: i64,
}

/// Share of prayer records with all five prayers attended on one day.
#[derive(Debug, Clone, Serialize)]
pub struct DailyCompletion {
    pub date: chrono::NaiveDate,
    pub records: i64,
    pub complete: i64,
    pub percentage: f64,
}

/// Attended count per prayer slot over a range of days.
#[derive(Debug, Clone, Default, Serialize, sqlx::FromRow)]
pub struct PrayerSlotStats {
    pub days_logged: i64,
    pub subuh: i64,
    pub dzuhur: i64,
    pub ashar: i64,
    pub maghrib: i64,
    pub isya: i64,
    pub congregation: i64,
    pub complete_days: i64,
}

/// One student's row in the daily report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DailyReportRow {
    pub user_id: i64,
    pub full_name: String,
    pub class: String,
    pub subuh: Option<String>,
    pub dzuhur: Option<String>,
    pub ashar: Option<String>,
    pub maghrib: Option<String>,
    pub isya: Option<String>,
    pub fasting_status: Option<String>,
    pub quran_sessions: i64,
    pub amaliah_points: i64,
}

/// Percentage helper that treats an empty denominator as 0%.
pub fn percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 * 1000.0 / whole as f64).round() / 10.0
}
