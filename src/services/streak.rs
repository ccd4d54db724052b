// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consecutive-day streak calculation.
//!
//! Every activity shares one algorithm: build a [`DateIndex`] of the days
//! that count (per [`CompletesDay`]), then walk it newest to oldest with
//! [`compute_streak`]. Contiguity comes purely from day-number arithmetic,
//! so gaps in storage never matter.

use crate::models::{FastingRecord, PrayerRecord, StreakResult};
use crate::time_utils::epoch_day;
use chrono::NaiveDate;
use serde::Serialize;

/// How many distinct recent days are considered. Runs longer than this
/// are undercounted for `best`.
pub const STREAK_LOOKBACK_DAYS: usize = 60;

/// Activities that have a streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Prayer,
    Fasting,
    Quran,
    Amaliah,
}

/// Per-activity rule for whether a stored record makes its day count.
pub trait CompletesDay {
    fn day(&self) -> NaiveDate;
    fn completes_day(&self) -> bool;
}

impl CompletesDay for PrayerRecord {
    fn day(&self) -> NaiveDate {
        self.date
    }

    fn completes_day(&self) -> bool {
        self.is_complete()
    }
}

impl CompletesDay for FastingRecord {
    fn day(&self) -> NaiveDate {
        self.date
    }

    fn completes_day(&self) -> bool {
        self.is_complete()
    }
}

/// A bare date stands for "at least one record exists that day", which is
/// the whole rule for Quran readings and amaliah.
impl CompletesDay for NaiveDate {
    fn day(&self) -> NaiveDate {
        *self
    }

    fn completes_day(&self) -> bool {
        true
    }
}

/// Distinct qualifying days, most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateIndex {
    dates: Vec<NaiveDate>,
}

impl DateIndex {
    /// Keep only records whose day counts, then sort and dedupe.
    pub fn from_records<R: CompletesDay>(records: &[R]) -> Self {
        Self::from_dates(
            records
                .iter()
                .filter(|r| r.completes_day())
                .map(CompletesDay::day),
        )
    }

    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut dates: Vec<NaiveDate> = dates.into_iter().collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        dates.dedup();
        dates.truncate(STREAK_LOOKBACK_DAYS);
        Self { dates }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn most_recent(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn as_slice(&self) -> &[NaiveDate] {
        &self.dates
    }
}

/// Current and best streak as of `today`.
pub fn compute_streak(index: &DateIndex, today: NaiveDate) -> StreakResult {
    let days: Vec<i64> = index.as_slice().iter().map(|d| epoch_day(*d)).collect();
    let Some(&newest) = days.first() else {
        return StreakResult::default();
    };

    let mut run: u32 = 1;
    let mut best: u32 = 1;
    let mut leading_run: Option<u32> = None;

    for pair in days.windows(2) {
        if pair[0] - pair[1] == 1 {
            run += 1;
        } else {
            leading_run.get_or_insert(run);
            run = 1;
        }
        best = best.max(run);
    }
    let leading_run = leading_run.unwrap_or(run);

    // A streak stays alive through yesterday; a future-dated entry is not alive.
    let age = epoch_day(today) - newest;
    let current = if age == 0 || age == 1 { leading_run } else { 0 };

    StreakResult { current, best }
}

/// Convenience for callers holding raw records.
pub fn streak_from_records<R: CompletesDay>(records: &[R], today: NaiveDate) -> StreakResult {
    compute_streak(&DateIndex::from_records(records), today)
}
