// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Business logic services.

pub mod badge;
pub mod location;
pub mod password;
pub mod prayer_times;
pub mod streak;

pub use badge::{AchievementStore, BadgeAwarder};
pub use prayer_times::PrayerTimeService;
pub use streak::{compute_streak, ActivityKind, DateIndex};
