// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schools and school admin registration requests.

use super::Role;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Lifecycle of a school admin registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// A school. Students join it with `code`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub address: String,
    pub level: String,
    pub admin_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

/// School with its member count, for the superadmin overview.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SchoolSummary {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub members: i64,
}

/// Member row shown to a school's admin.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SchoolMember {
    pub id: i64,
    pub full_name: String,
    pub class: String,
    pub points: i64,
    pub avatar: String,
    pub role: Role,
}

/// Someone asking to run a new school on the tracker.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AdminRequest {
    pub id: i64,
    pub full_name: String,
    pub phone: String,
    pub school_name: String,
    pub school_address: String,
    pub school_level: String,
    pub student_count: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub status: RequestStatus,
    pub created_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_hides_password_hash() {
        let request = AdminRequest {
            id: 1,
            full_name: "Ustadzah Aminah".to_string(),
            phone: "0812".to_string(),
            school_name: "MTs Al-Hikmah".to_string(),
            school_address: String::new(),
            school_level: "SMP".to_string(),
            student_count: 120,
            username: "aminah".to_string(),
            email: "aminah@alhikmah.sch.id".to_string(),
            password_hash: "secret".to_string(),
            status: RequestStatus::Pending,
            created_at: NaiveDateTime::default(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["status"], "pending");
    }
}
