// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity logs: prayers, fasting, Quran readings, amaliah and badges.

use super::{Database, COMPLETE_PRAYER_SQL};
use crate::error::Result;
use crate::models::fasting::FastingRow;
use crate::models::prayer::PrayerRow;
use crate::models::{
    AmaliahType, Badge, EarnedBadge, FastingRecord, NewQuranReading, PrayerRecord,
    PrayerSlotStats, QuranReading,
};
use crate::services::badge::AchievementStore;
use crate::services::streak::{ActivityKind, DateIndex, STREAK_LOOKBACK_DAYS};
use chrono::NaiveDate;
use std::collections::HashSet;

const PRAYER_COLUMNS: &str = "user_id, date, subuh, dzuhur, ashar, maghrib, isya";
const FASTING_COLUMNS: &str = "user_id, date, status, reason";
const QURAN_COLUMNS: &str = "id, user_id, date, start_surah_id, start_surah_name, start_ayah, \
     end_surah_id, end_surah_name, end_ayah, pages, notes, created_at";

/// Result of checking off an amaliah for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmaliahToggle {
    /// State changed; points were credited or debited.
    Changed { points: i64 },
    /// Already in the requested state; nothing changed.
    Unchanged,
}

impl Database {
    // ─── Prayer Operations ───────────────────────────────────────

    pub async fn get_prayer(&self, user_id: i64, date: NaiveDate) -> Result<Option<PrayerRecord>> {
        let sql = format!(
            "SELECT {} FROM prayers WHERE user_id = ?1 AND date = ?2",
            PRAYER_COLUMNS
        );
        let row = sqlx::query_as::<_, PrayerRow>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(PrayerRecord::from))
    }

    /// Insert or replace the day's prayer record.
    pub async fn upsert_prayer(&self, record: &PrayerRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO prayers (user_id, date, subuh, dzuhur, ashar, maghrib, isya) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
             ON CONFLICT (user_id, date) DO UPDATE SET \
             subuh = excluded.subuh, dzuhur = excluded.dzuhur, ashar = excluded.ashar, \
             maghrib = excluded.maghrib, isya = excluded.isya",
        )
        .bind(record.user_id)
        .bind(record.date)
        .bind(record.subuh.as_str())
        .bind(record.dzuhur.as_str())
        .bind(record.ashar.as_str())
        .bind(record.maghrib.as_str())
        .bind(record.isya.as_str())
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Most recent prayer records, newest first.
    pub async fn recent_prayers(&self, user_id: i64, limit: usize) -> Result<Vec<PrayerRecord>> {
        let sql = format!(
            "SELECT {} FROM prayers WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
            PRAYER_COLUMNS
        );
        let rows = sqlx::query_as::<_, PrayerRow>(&sql)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(PrayerRecord::from).collect())
    }

    /// Prayer records in `[start, end]`, oldest first.
    pub async fn prayers_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PrayerRecord>> {
        let sql = format!(
            "SELECT {} FROM prayers WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 ORDER BY date",
            PRAYER_COLUMNS
        );
        let rows = sqlx::query_as::<_, PrayerRow>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(PrayerRecord::from).collect())
    }

    /// Per-slot attendance over `[start, end]`.
    pub async fn prayer_slot_stats(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PrayerSlotStats> {
        let sql = format!(
            "SELECT COUNT(*) AS days_logged, \
             COALESCE(SUM(subuh IN ('jamaah', 'sendiri')), 0) AS subuh, \
             COALESCE(SUM(dzuhur IN ('jamaah', 'sendiri')), 0) AS dzuhur, \
             COALESCE(SUM(ashar IN ('jamaah', 'sendiri')), 0) AS ashar, \
             COALESCE(SUM(maghrib IN ('jamaah', 'sendiri')), 0) AS maghrib, \
             COALESCE(SUM(isya IN ('jamaah', 'sendiri')), 0) AS isya, \
             COALESCE(SUM((subuh = 'jamaah') + (dzuhur = 'jamaah') + (ashar = 'jamaah') \
                 + (maghrib = 'jamaah') + (isya = 'jamaah')), 0) AS congregation, \
             COALESCE(SUM({}), 0) AS complete_days \
             FROM prayers WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
            COMPLETE_PRAYER_SQL
        );
        Ok(sqlx::query_as::<_, PrayerSlotStats>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_one(self.pool())
            .await?)
    }

    /// Lifetime days with all five prayers attended.
    pub async fn complete_prayer_days(&self, user_id: i64) -> Result<i64> {
        let sql = format!(
            "SELECT COUNT(*) FROM prayers WHERE user_id = ?1 AND {}",
            COMPLETE_PRAYER_SQL
        );
        Ok(sqlx::query_scalar(&sql)
            .bind(user_id)
            .fetch_one(self.pool())
            .await?)
    }

    // ─── Fasting Operations ──────────────────────────────────────

    pub async fn get_fasting(&self, user_id: i64, date: NaiveDate) -> Result<Option<FastingRecord>> {
        let sql = format!(
            "SELECT {} FROM fastings WHERE user_id = ?1 AND date = ?2",
            FASTING_COLUMNS
        );
        let row = sqlx::query_as::<_, FastingRow>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(FastingRecord::from))
    }

    pub async fn upsert_fasting(&self, record: &FastingRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO fastings (user_id, date, status, reason) VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT (user_id, date) DO UPDATE SET \
             status = excluded.status, reason = excluded.reason",
        )
        .bind(record.user_id)
        .bind(record.date)
        .bind(record.status.as_str())
        .bind(&record.reason)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn recent_fastings(&self, user_id: i64, limit: usize) -> Result<Vec<FastingRecord>> {
        let sql = format!(
            "SELECT {} FROM fastings WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
            FASTING_COLUMNS
        );
        let rows = sqlx::query_as::<_, FastingRow>(&sql)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(FastingRecord::from).collect())
    }

    pub async fn fastings_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<FastingRecord>> {
        let sql = format!(
            "SELECT {} FROM fastings WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 ORDER BY date",
            FASTING_COLUMNS
        );
        let rows = sqlx::query_as::<_, FastingRow>(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(self.pool())
            .await?;
        Ok(rows.into_iter().map(FastingRecord::from).collect())
    }

    /// Lifetime days explicitly recorded as fasting.
    pub async fn fasting_day_count(&self, user_id: i64) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM fastings WHERE user_id = ?1 AND status = 'puasa'")
                .bind(user_id)
                .fetch_one(self.pool())
                .await?,
        )
    }

    // ─── Quran Operations ────────────────────────────────────────

    pub async fn add_quran_reading(
        &self,
        user_id: i64,
        date: NaiveDate,
        reading: &NewQuranReading,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO quran_readings (user_id, date, start_surah_id, start_surah_name, \
             start_ayah, end_surah_id, end_surah_name, end_ayah, pages, notes) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(user_id)
        .bind(date)
        .bind(reading.start_surah_id)
        .bind(&reading.start_surah_name)
        .bind(reading.start_ayah)
        .bind(reading.end_surah_id)
        .bind(&reading.end_surah_name)
        .bind(reading.end_ayah)
        .bind(reading.pages)
        .bind(&reading.notes)
        .execute(self.pool())
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Delete a reading owned by `user_id`. Returns false if it does not
    /// exist or belongs to someone else.
    pub async fn delete_quran_reading(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM quran_readings WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn recent_quran_readings(&self, user_id: i64, limit: i64) -> Result<Vec<QuranReading>> {
        let sql = format!(
            "SELECT {} FROM quran_readings WHERE user_id = ?1 \
             ORDER BY date DESC, id DESC LIMIT ?2",
            QURAN_COLUMNS
        );
        Ok(sqlx::query_as::<_, QuranReading>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn quran_reading_count(&self, user_id: i64) -> Result<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM quran_readings WHERE user_id = ?1")
                .bind(user_id)
                .fetch_one(self.pool())
                .await?,
        )
    }

    pub async fn quran_total_pages(&self, user_id: i64) -> Result<i64> {
        Ok(sqlx::query_scalar(
            "SELECT COALESCE(SUM(pages), 0) FROM quran_readings WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?)
    }

    /// Pages read per day in `[start, end]`; days without reading are absent.
    pub async fn quran_pages_by_day(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(NaiveDate, i64)>> {
        Ok(sqlx::query_as(
            "SELECT date, COALESCE(SUM(pages), 0) FROM quran_readings \
             WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 GROUP BY date ORDER BY date",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.pool())
        .await?)
    }

    // ─── Amaliah Operations ──────────────────────────────────────

    pub async fn amaliah_types(&self) -> Result<Vec<AmaliahType>> {
        Ok(sqlx::query_as::<_, AmaliahType>(
            "SELECT id, name, description, points, icon, is_active FROM amaliah_types \
             WHERE is_active = 1 ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn get_amaliah_type(&self, id: i64) -> Result<Option<AmaliahType>> {
        Ok(sqlx::query_as::<_, AmaliahType>(
            "SELECT id, name, description, points, icon, is_active FROM amaliah_types WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?)
    }

    /// Type IDs checked off by the user on `date`.
    pub async fn amaliah_done_on(&self, user_id: i64, date: NaiveDate) -> Result<HashSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT amaliah_type_id FROM daily_amaliah WHERE user_id = ?1 AND date = ?2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_all(self.pool())
        .await?;
        Ok(ids.into_iter().collect())
    }

    /// Check off an amaliah for the day and credit its points, atomically.
    pub async fn check_amaliah(
        &self,
        user_id: i64,
        amaliah: &AmaliahType,
        date: NaiveDate,
        notes: &str,
    ) -> Result<AmaliahToggle> {
        let mut tx = self.pool().begin().await?;

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO daily_amaliah (user_id, amaliah_type_id, date, notes) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(user_id)
        .bind(amaliah.id)
        .bind(date)
        .bind(notes)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if inserted == 0 {
            tx.rollback().await?;
            return Ok(AmaliahToggle::Unchanged);
        }

        sqlx::query("UPDATE users SET points = points + ?1 WHERE id = ?2")
            .bind(amaliah.points)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(AmaliahToggle::Changed {
            points: amaliah.points,
        })
    }

    /// Undo a day's amaliah and debit its points, atomically.
    pub async fn uncheck_amaliah(
        &self,
        user_id: i64,
        amaliah: &AmaliahType,
        date: NaiveDate,
    ) -> Result<AmaliahToggle> {
        let mut tx = self.pool().begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM daily_amaliah WHERE user_id = ?1 AND amaliah_type_id = ?2 AND date = ?3",
        )
        .bind(user_id)
        .bind(amaliah.id)
        .bind(date)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if deleted == 0 {
            tx.rollback().await?;
            return Ok(AmaliahToggle::Unchanged);
        }

        sqlx::query("UPDATE users SET points = MAX(points - ?1, 0) WHERE id = ?2")
            .bind(amaliah.points)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(AmaliahToggle::Changed {
            points: -amaliah.points,
        })
    }

    /// Sum of amaliah points earned in `[start, end]`.
    pub async fn amaliah_points_between(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<i64> {
        Ok(sqlx::query_scalar(
            "SELECT COALESCE(SUM(t.points), 0) FROM daily_amaliah d \
             JOIN amaliah_types t ON t.id = d.amaliah_type_id \
             WHERE d.user_id = ?1 AND d.date BETWEEN ?2 AND ?3",
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(self.pool())
        .await?)
    }

    pub async fn lifetime_amaliah_points(&self, user_id: i64) -> Result<i64> {
        Ok(sqlx::query_scalar(
            "SELECT COALESCE(SUM(t.points), 0) FROM daily_amaliah d \
             JOIN amaliah_types t ON t.id = d.amaliah_type_id WHERE d.user_id = ?1",
        )
        .bind(user_id)
        .fetch_one(self.pool())
        .await?)
    }

    // ─── Streak History ──────────────────────────────────────────

    /// Qualifying days for an activity within the lookback window.
    pub async fn activity_dates(&self, user_id: i64, kind: ActivityKind) -> Result<DateIndex> {
        Ok(match kind {
            ActivityKind::Prayer => {
                DateIndex::from_records(&self.recent_prayers(user_id, STREAK_LOOKBACK_DAYS).await?)
            }
            ActivityKind::Fasting => {
                DateIndex::from_records(&self.recent_fastings(user_id, STREAK_LOOKBACK_DAYS).await?)
            }
            ActivityKind::Quran => {
                DateIndex::from_dates(self.distinct_dates("quran_readings", user_id).await?)
            }
            ActivityKind::Amaliah => {
                DateIndex::from_dates(self.distinct_dates("daily_amaliah", user_id).await?)
            }
        })
    }

    async fn distinct_dates(&self, table: &'static str, user_id: i64) -> Result<Vec<NaiveDate>> {
        let sql = format!(
            "SELECT DISTINCT date FROM {} WHERE user_id = ?1 ORDER BY date DESC LIMIT ?2",
            table
        );
        Ok(sqlx::query_scalar(&sql)
            .bind(user_id)
            .bind(STREAK_LOOKBACK_DAYS as i64)
            .fetch_all(self.pool())
            .await?)
    }

    // ─── Badge Operations ────────────────────────────────────────

    pub async fn all_badges(&self) -> Result<Vec<Badge>> {
        Ok(sqlx::query_as::<_, Badge>(
            "SELECT id, name, description, icon, criteria_type, criteria_value \
             FROM badges ORDER BY id",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn earned_badge_ids(&self, user_id: i64) -> Result<HashSet<i64>> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT badge_id FROM user_badges WHERE user_id = ?1")
            .bind(user_id)
            .fetch_all(self.pool())
            .await?;
        Ok(ids.into_iter().collect())
    }

    /// Record a badge. The unique constraint makes a repeat a no-op.
    pub async fn award_badge(&self, user_id: i64, badge_id: i64) -> Result<bool> {
        let result =
            sqlx::query("INSERT OR IGNORE INTO user_badges (user_id, badge_id) VALUES (?1, ?2)")
                .bind(user_id)
                .bind(badge_id)
                .execute(self.pool())
                .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn user_badges(&self, user_id: i64) -> Result<Vec<EarnedBadge>> {
        Ok(sqlx::query_as::<_, EarnedBadge>(
            "SELECT b.id, b.name, b.description, b.icon, ub.earned_at \
             FROM user_badges ub JOIN badges b ON b.id = ub.badge_id \
             WHERE ub.user_id = ?1 ORDER BY ub.earned_at DESC, b.id",
        )
        .bind(user_id)
        .fetch_all(self.pool())
        .await?)
    }
}

impl AchievementStore for Database {
    async fn badges(&self) -> Result<Vec<Badge>> {
        self.all_badges().await
    }

    async fn earned_badge_ids(&self, user_id: i64) -> Result<HashSet<i64>> {
        Database::earned_badge_ids(self, user_id).await
    }

    async fn award_badge(&self, user_id: i64, badge_id: i64) -> Result<bool> {
        Database::award_badge(self, user_id, badge_id).await
    }

    async fn recent_prayers(&self, user_id: i64, limit: usize) -> Result<Vec<PrayerRecord>> {
        Database::recent_prayers(self, user_id, limit).await
    }

    async fn complete_prayer_days(&self, user_id: i64) -> Result<i64> {
        Database::complete_prayer_days(self, user_id).await
    }

    async fn lifetime_amaliah_points(&self, user_id: i64) -> Result<i64> {
        Database::lifetime_amaliah_points(self, user_id).await
    }

    async fn quran_reading_count(&self, user_id: i64) -> Result<i64> {
        Database::quran_reading_count(self, user_id).await
    }

    async fn quran_total_pages(&self, user_id: i64) -> Result<i64> {
        Database::quran_total_pages(self, user_id).await
    }
}
