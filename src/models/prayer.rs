// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily prayer log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// How a single prayer slot was performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PrayerStatus {
    /// Prayed in congregation
    #[serde(rename = "jamaah")]
    Congregation,
    /// Prayed alone
    #[serde(rename = "sendiri")]
    Alone,
    #[default]
    #[serde(rename = "belum")]
    NotYet,
}

impl PrayerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PrayerStatus::Congregation => "jamaah",
            PrayerStatus::Alone => "sendiri",
            PrayerStatus::NotYet => "belum",
        }
    }

    /// Read a stored value. Anything unrecognized counts as not prayed.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "jamaah" => PrayerStatus::Congregation,
            "sendiri" => PrayerStatus::Alone,
            _ => PrayerStatus::NotYet,
        }
    }

    pub fn is_attended(self) -> bool {
        matches!(self, PrayerStatus::Congregation | PrayerStatus::Alone)
    }
}

/// One user's five prayers for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrayerRecord {
    pub user_id: i64,
    pub date: NaiveDate,
    pub subuh: PrayerStatus,
    pub dzuhur: PrayerStatus,
    pub ashar: PrayerStatus,
    pub maghrib: PrayerStatus,
    pub isya: PrayerStatus,
}

impl PrayerRecord {
    /// A day with nothing logged yet.
    pub fn empty(user_id: i64, date: NaiveDate) -> Self {
        Self {
            user_id,
            date,
            subuh: PrayerStatus::NotYet,
            dzuhur: PrayerStatus::NotYet,
            ashar: PrayerStatus::NotYet,
            maghrib: PrayerStatus::NotYet,
            isya: PrayerStatus::NotYet,
        }
    }

    pub fn slots(&self) -> [PrayerStatus; 5] {
        [self.subuh, self.dzuhur, self.ashar, self.maghrib, self.isya]
    }

    pub fn attended_count(&self) -> usize {
        self.slots().iter().filter(|s| s.is_attended()).count()
    }

    /// All five prayers attended, in congregation or alone.
    pub fn is_complete(&self) -> bool {
        self.slots().iter().all(|s| s.is_attended())
    }
}

/// Raw `prayers` row; statuses are free text in storage.
#[derive(Debug, sqlx::FromRow)]
pub struct PrayerRow {
    pub user_id: i64,
    pub date: NaiveDate,
    pub subuh: String,
    pub dzuhur: String,
    pub ashar: String,
    pub maghrib: String,
    pub isya: String,
}

impl From<PrayerRow> for PrayerRecord {
    fn from(row: PrayerRow) -> Self {
        Self {
            user_id: row.user_id,
            date: row.date,
            subuh: PrayerStatus::from_stored(&row.subuh),
            dzuhur: PrayerStatus::from_stored(&row.dzuhur),
            ashar: PrayerStatus::from_stored(&row.ashar),
            maghrib: PrayerStatus::from_stored(&row.maghrib),
            isya: PrayerStatus::from_stored(&row.isya),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
    }

    #[test]
    fn test_four_of_five_is_not_complete() {
        let mut record = PrayerRecord::empty(1, day());
        record.subuh = PrayerStatus::Congregation;
        record.dzuhur = PrayerStatus::Congregation;
        record.ashar = PrayerStatus::Congregation;
        record.maghrib = PrayerStatus::Congregation;
        record.isya = PrayerStatus::NotYet;

        assert_eq!(record.attended_count(), 4);
        assert!(!record.is_complete());
    }

    #[test]
    fn test_mixed_congregation_and_alone_is_complete() {
        let record = PrayerRecord {
            user_id: 1,
            date: day(),
            subuh: PrayerStatus::Alone,
            dzuhur: PrayerStatus::Congregation,
            ashar: PrayerStatus::Alone,
            maghrib: PrayerStatus::Congregation,
            isya: PrayerStatus::Alone,
        };
        assert!(record.is_complete());
    }

    #[test]
    fn test_unknown_stored_value_is_not_yet() {
        assert_eq!(PrayerStatus::from_stored(""), PrayerStatus::NotYet);
        assert_eq!(PrayerStatus::from_stored("JAMAAH"), PrayerStatus::NotYet);
        assert_eq!(PrayerStatus::from_stored("sendiri"), PrayerStatus::Alone);
    }

    #[test]
    fn test_status_deserializes_from_wire_names() {
        let status: PrayerStatus = serde_json::from_str("\"jamaah\"").unwrap();
        assert_eq!(status, PrayerStatus::Congregation);
        assert!(serde_json::from_str::<PrayerStatus>("\"skipped\"").is_err());
    }
}
