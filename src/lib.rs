// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Amaliah Tracker: daily worship tracking for a school community.
//!
//! This crate provides the backend API for logging prayers, fasting, Quran
//! reading and good deeds during Ramadan, computing consecutive-day streaks,
//! awarding badges, and reporting to school administrators.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::PrayerTimeService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub prayer_times: PrayerTimeService,
}
