// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quran reading sessions.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Pages in the standard Madani mushaf.
pub const QURAN_TOTAL_PAGES: i64 = 604;
pub const PAGES_PER_JUZ: i64 = 20;

/// One reading session. A user may log several per day.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct QuranReading {
    pub id: i64,
    pub user_id: i64,
    pub date: NaiveDate,
    pub start_surah_id: i64,
    pub start_surah_name: String,
    pub start_ayah: i64,
    pub end_surah_id: i64,
    pub end_surah_name: String,
    pub end_ayah: i64,
    pub pages: i64,
    pub notes: String,
    pub created_at: NaiveDateTime,
}

/// Submitted reading session.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_reading_range"))]
pub struct NewQuranReading {
    #[validate(range(min = 1, max = 114))]
    pub start_surah_id: i64,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub start_surah_name: String,
    #[validate(range(min = 1))]
    pub start_ayah: i64,
    #[validate(range(min = 1, max = 114))]
    pub end_surah_id: i64,
    #[serde(default)]
    #[validate(length(max = 100))]
    pub end_surah_name: String,
    #[validate(range(min = 1))]
    pub end_ayah: i64,
    #[serde(default)]
    #[validate(range(min = 0, max = 604))]
    pub pages: i64,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub notes: String,
}

/// The end of a session must not come before its start.
fn validate_reading_range(reading: &NewQuranReading) -> Result<(), ValidationError> {
    let backwards = reading.start_surah_id > reading.end_surah_id
        || (reading.start_surah_id == reading.end_surah_id
            && reading.start_ayah > reading.end_ayah);
    if backwards {
        let mut err = ValidationError::new("reading_range");
        err.message = Some("end of reading must not precede its start".into());
        return Err(err);
    }
    Ok(())
}

/// Juz completed for a lifetime page count.
pub fn juz_completed(total_pages: i64) -> i64 {
    total_pages.max(0) / PAGES_PER_JUZ
}

/// Pages per day needed to finish the Quran in `target_days`.
pub fn daily_page_target(target_days: i64) -> i64 {
    let days = target_days.max(1);
    (QURAN_TOTAL_PAGES + days - 1) / days
}

/// Khatam progress as a percentage, capped at 100.
pub fn khatam_progress(total_pages: i64) -> f64 {
    let pct = total_pages.max(0) as f64 * 100.0 / QURAN_TOTAL_PAGES as f64;
    pct.min(100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(start: (i64, i64), end: (i64, i64)) -> NewQuranReading {
        NewQuranReading {
            start_surah_id: start.0,
            start_surah_name: String::new(),
            start_ayah: start.1,
            end_surah_id: end.0,
            end_surah_name: String::new(),
            end_ayah: end.1,
            pages: 2,
            notes: String::new(),
        }
    }

    #[test]
    fn test_valid_range() {
        assert!(reading((1, 1), (2, 20)).validate().is_ok());
        assert!(reading((2, 5), (2, 5)).validate().is_ok());
    }

    #[test]
    fn test_backwards_range_rejected() {
        assert!(reading((3, 1), (2, 20)).validate().is_err());
        assert!(reading((2, 30), (2, 10)).validate().is_err());
    }

    #[test]
    fn test_surah_out_of_bounds_rejected() {
        assert!(reading((0, 1), (1, 7)).validate().is_err());
        assert!(reading((1, 1), (115, 1)).validate().is_err());
        assert!(reading((1, 0), (1, 7)).validate().is_err());
    }

    #[test]
    fn test_daily_page_target_rounds_up() {
        assert_eq!(daily_page_target(30), 21);
        assert_eq!(daily_page_target(604), 1);
        assert_eq!(daily_page_target(0), 604);
    }

    #[test]
    fn test_juz_and_progress() {
        assert_eq!(juz_completed(19), 0);
        assert_eq!(juz_completed(40), 2);
        assert_eq!(khatam_progress(302), 50.0);
        assert_eq!(khatam_progress(1000), 100.0);
    }
}
