// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Achievement badges.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Which aggregate a badge threshold is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum CriteriaType {
    /// Current all-five-prayers streak
    PrayerStreak,
    /// Days with all five prayers attended
    PrayerCount,
    /// Lifetime amaliah points
    AmaliahPoints,
    /// Lifetime Quran reading sessions
    QuranReadings,
    /// Juz completed from lifetime pages
    QuranJuz,
    /// Juz completed, thresholded at the full Quran
    QuranKhatam,
}

/// Badge definition, seeded reference data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Badge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub criteria_type: CriteriaType,
    pub criteria_value: i64,
}

/// A badge the user holds, with when it was earned.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct EarnedBadge {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub icon: String,
    pub earned_at: NaiveDateTime,
}
