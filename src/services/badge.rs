// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! One-time achievement badges.

use crate::error::Result;
use crate::models::quran::juz_completed;
use crate::models::{Badge, CriteriaType, PrayerRecord};
use crate::services::streak::{streak_from_records, STREAK_LOOKBACK_DAYS};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::future::Future;

/// Storage the awarder needs. Implemented by the database and by test fakes.
pub trait AchievementStore {
    fn badges(&self) -> impl Future<Output = Result<Vec<Badge>>> + Send;

    fn earned_badge_ids(&self, user_id: i64) -> impl Future<Output = Result<HashSet<i64>>> + Send;

    /// Record the award. `Ok(false)` when the user already had it.
    fn award_badge(&self, user_id: i64, badge_id: i64)
        -> impl Future<Output = Result<bool>> + Send;

    /// Most recent prayer records, newest first.
    fn recent_prayers(
        &self,
        user_id: i64,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<PrayerRecord>>> + Send;

    /// Days with all five prayers attended.
    fn complete_prayer_days(&self, user_id: i64) -> impl Future<Output = Result<i64>> + Send;

    fn lifetime_amaliah_points(&self, user_id: i64) -> impl Future<Output = Result<i64>> + Send;

    fn quran_reading_count(&self, user_id: i64) -> impl Future<Output = Result<i64>> + Send;

    fn quran_total_pages(&self, user_id: i64) -> impl Future<Output = Result<i64>> + Send;
}

/// Quantity a criteria type is compared against. Juz and khatam badges
/// share one measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Measure {
    PrayerStreak,
    PrayerDays,
    AmaliahPoints,
    QuranSessions,
    QuranJuz,
}

impl From<CriteriaType> for Measure {
    fn from(criteria: CriteriaType) -> Self {
        match criteria {
            CriteriaType::PrayerStreak => Measure::PrayerStreak,
            CriteriaType::PrayerCount => Measure::PrayerDays,
            CriteriaType::AmaliahPoints => Measure::AmaliahPoints,
            CriteriaType::QuranReadings => Measure::QuranSessions,
            CriteriaType::QuranJuz | CriteriaType::QuranKhatam => Measure::QuranJuz,
        }
    }
}

/// Evaluates badge criteria and grants badges not yet held.
pub struct BadgeAwarder<'a, S> {
    store: &'a S,
}

impl<'a, S: AchievementStore + Sync> BadgeAwarder<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Award every badge whose threshold is met and return only the ones
    /// granted by this call. Held badges are skipped without evaluation.
    pub async fn check_and_award(&self, user_id: i64, today: NaiveDate) -> Result<Vec<Badge>> {
        let badges = self.store.badges().await?;
        let held = self.store.earned_badge_ids(user_id).await?;

        let mut measured: HashMap<Measure, i64> = HashMap::new();
        let mut newly_earned = Vec::new();

        for badge in badges {
            if held.contains(&badge.id) {
                continue;
            }

            let measure = Measure::from(badge.criteria_type);
            let value = match measured.get(&measure) {
                Some(value) => *value,
                None => {
                    let value = self.measure(measure, user_id, today).await?;
                    measured.insert(measure, value);
                    value
                }
            };

            if value < badge.criteria_value {
                continue;
            }

            match self.store.award_badge(user_id, badge.id).await {
                Ok(true) => {
                    tracing::info!(user_id, badge = %badge.name, "Badge earned");
                    newly_earned.push(badge);
                }
                Ok(false) => {
                    tracing::debug!(user_id, badge_id = badge.id, "Badge already awarded");
                }
                Err(e) => {
                    tracing::warn!(user_id, badge_id = badge.id, error = %e, "Failed to award badge");
                }
            }
        }

        Ok(newly_earned)
    }

    async fn measure(&self, measure: Measure, user_id: i64, today: NaiveDate) -> Result<i64> {
        Ok(match measure {
            Measure::PrayerStreak => {
                let records = self
                    .store
                    .recent_prayers(user_id, STREAK_LOOKBACK_DAYS)
                    .await?;
                i64::from(streak_from_records(&records, today).current)
            }
            Measure::PrayerDays => self.store.complete_prayer_days(user_id).await?,
            Measure::AmaliahPoints => self.store.lifetime_amaliah_points(user_id).await?,
            Measure::QuranSessions => self.store.quran_reading_count(user_id).await?,
            Measure::QuranJuz => juz_completed(self.store.quran_total_pages(user_id).await?),
        })
    }
}
