// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! School-wide aggregates for the admin panel.

use super::{Database, COMPLETE_PRAYER_SQL};
use crate::error::Result;
use crate::models::stats::percentage;
use crate::models::{DailyCompletion, DailyReportRow, DayActivityStats, UserCounts};
use crate::time_utils::days_between;
use chrono::{Duration, NaiveDate};

impl Database {
    pub async fn user_counts(&self) -> Result<UserCounts> {
        let (total, admins, users, total_points, classes): (i64, i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT COUNT(*), \
                 COALESCE(SUM(role IN ('admin', 'superadmin')), 0), \
                 COALESCE(SUM(role = 'user'), 0), \
                 COALESCE(SUM(points), 0), \
                 COUNT(DISTINCT NULLIF(class, '')) \
                 FROM users",
            )
            .fetch_one(self.pool())
            .await?;

        Ok(UserCounts {
            total,
            admins,
            users,
            total_points,
            classes,
        })
    }

    /// Users with any logged activity on `date`.
    pub async fn active_users_on(&self, date: NaiveDate) -> Result<i64> {
        Ok(sqlx::query_scalar(
            "SELECT COUNT(*) FROM ( \
                 SELECT user_id FROM prayers WHERE date = ?1 \
                 UNION SELECT user_id FROM fastings WHERE date = ?1 \
                 UNION SELECT user_id FROM quran_readings WHERE date = ?1 \
                 UNION SELECT user_id FROM daily_amaliah WHERE date = ?1 \
             )",
        )
        .bind(date)
        .fetch_one(self.pool())
        .await?)
    }

    pub async fn day_activity_stats(&self, date: NaiveDate) -> Result<DayActivityStats> {
        let prayer_sql = format!(
            "SELECT COUNT(*), COALESCE(SUM({}), 0) FROM prayers WHERE date = ?1",
            COMPLETE_PRAYER_SQL
        );
        let (prayer_records, complete_prayer_days): (i64, i64) = sqlx::query_as(&prayer_sql)
            .bind(date)
            .fetch_one(self.pool())
            .await?;

        let (fasting, not_fasting): (i64, i64) = sqlx::query_as(
            "SELECT COALESCE(SUM(status = 'puasa'), 0), COALESCE(SUM(status != 'puasa'), 0) \
             FROM fastings WHERE date = ?1",
        )
        .bind(date)
        .fetch_one(self.pool())
        .await?;

        let (quran_sessions, quran_pages): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(pages), 0) FROM quran_readings WHERE date = ?1",
        )
        .bind(date)
        .fetch_one(self.pool())
        .await?;

        let (amaliah_entries, amaliah_points): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(t.points), 0) FROM daily_amaliah d \
             JOIN amaliah_types t ON t.id = d.amaliah_type_id WHERE d.date = ?1",
        )
        .bind(date)
        .fetch_one(self.pool())
        .await?;

        Ok(DayActivityStats {
            prayer_records,
            complete_prayer_days,
            fasting,
            not_fasting,
            quran_sessions,
            quran_pages,
            amaliah_entries,
            amaliah_points,
        })
    }

    /// Per-day share of complete prayer records for the `days` days
    /// ending at `end`, oldest first. Days without records report 0%.
    pub async fn prayer_completion_series(
        &self,
        end: NaiveDate,
        days: i64,
    ) -> Result<Vec<DailyCompletion>> {
        let start = end - Duration::days(days.max(1) - 1);
        let sql = format!(
            "SELECT date, COUNT(*), COALESCE(SUM({}), 0) FROM prayers \
             WHERE date BETWEEN ?1 AND ?2 GROUP BY date",
            COMPLETE_PRAYER_SQL
        );
        let rows: Vec<(NaiveDate, i64, i64)> = sqlx::query_as(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(self.pool())
            .await?;

        Ok(days_between(start, end)
            .into_iter()
            .map(|date| {
                let (records, complete) = rows
                    .iter()
                    .find(|(d, _, _)| *d == date)
                    .map(|(_, r, c)| (*r, *c))
                    .unwrap_or((0, 0));
                DailyCompletion {
                    date,
                    records,
                    complete,
                    percentage: percentage(complete, records),
                }
            })
            .collect())
    }

    /// One row per student for `date`, optionally limited to a class.
    pub async fn daily_report(
        &self,
        date: NaiveDate,
        class: Option<&str>,
    ) -> Result<Vec<DailyReportRow>> {
        Ok(sqlx::query_as::<_, DailyReportRow>(
            "SELECT u.id AS user_id, u.full_name, u.class, \
             p.subuh, p.dzuhur, p.ashar, p.maghrib, p.isya, \
             f.status AS fasting_status, \
             (SELECT COUNT(*) FROM quran_readings q \
                 WHERE q.user_id = u.id AND q.date = ?1) AS quran_sessions, \
             (SELECT COALESCE(SUM(t.points), 0) FROM daily_amaliah d \
                 JOIN amaliah_types t ON t.id = d.amaliah_type_id \
                 WHERE d.user_id = u.id AND d.date = ?1) AS amaliah_points \
             FROM users u \
             LEFT JOIN prayers p ON p.user_id = u.id AND p.date = ?1 \
             LEFT JOIN fastings f ON f.user_id = u.id AND f.date = ?1 \
             WHERE u.role = 'user' AND (?2 IS NULL OR u.class = ?2) \
             ORDER BY u.class, u.full_name",
        )
        .bind(date)
        .bind(class)
        .fetch_all(self.pool())
        .await?)
    }
}
