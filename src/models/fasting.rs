// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily fasting log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FastingStatus {
    #[serde(rename = "puasa")]
    Fasting,
    #[serde(rename = "tidak")]
    NotFasting,
}

impl FastingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            FastingStatus::Fasting => "puasa",
            FastingStatus::NotFasting => "tidak",
        }
    }

    /// Read a stored value. Only an explicit "puasa" counts as fasting.
    pub fn from_stored(value: &str) -> Self {
        if value == "puasa" {
            FastingStatus::Fasting
        } else {
            FastingStatus::NotFasting
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FastingRecord {
    pub user_id: i64,
    pub date: NaiveDate,
    pub status: FastingStatus,
    /// Why the user did not fast (empty when fasting)
    pub reason: String,
}

impl FastingRecord {
    pub fn is_complete(&self) -> bool {
        self.status == FastingStatus::Fasting
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct FastingRow {
    pub user_id: i64,
    pub date: NaiveDate,
    pub status: String,
    pub reason: String,
}

impl From<FastingRow> for FastingRecord {
    fn from(row: FastingRow) -> Self {
        Self {
            user_id: row.user_id,
            date: row.date,
            status: FastingStatus::from_stored(&row.status),
            reason: row.reason,
        }
    }
}
