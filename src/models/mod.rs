// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod amaliah;
pub mod badge;
pub mod fasting;
pub mod prayer;
pub mod quran;
pub mod school;
pub mod stats;
pub mod user;

pub use amaliah::AmaliahType;
pub use badge::{Badge, CriteriaType, EarnedBadge};
pub use fasting::{FastingRecord, FastingStatus};
pub use prayer::{PrayerRecord, PrayerStatus};
pub use quran::{NewQuranReading, QuranReading};
pub use school::{AdminRequest, RequestStatus, School, SchoolMember, SchoolSummary};
pub use stats::{
    DailyCompletion, DailyReportRow, DayActivityStats, LeaderboardEntry, PrayerSlotStats,
    StreakResult, UserCounts,
};
pub use user::{ClassInfo, Role, User};
