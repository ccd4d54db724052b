// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Schools, membership and school admin registration requests.

use super::Database;
use crate::error::{AppError, Result};
use crate::models::{AdminRequest, School, SchoolMember, SchoolSummary};
use ring::rand::{SecureRandom, SystemRandom};

const SCHOOL_COLUMNS: &str = "id, name, code, address, level, admin_id, created_at";

const REQUEST_COLUMNS: &str = "id, full_name, phone, school_name, school_address, school_level, \
     student_count, username, email, password_hash, status, created_at";

/// Join codes avoid 0/O and 1/I.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LEN: usize = 8;
const CODE_ATTEMPTS: usize = 5;

/// Fields of a school admin registration.
#[derive(Debug, Clone)]
pub struct NewAdminRequest {
    pub full_name: String,
    pub phone: String,
    pub school_name: String,
    pub school_address: String,
    pub school_level: String,
    pub student_count: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Result of approving a registration.
#[derive(Debug, Clone)]
pub struct ApprovedSchool {
    pub school: School,
    pub admin_id: i64,
}

/// Random join code drawn from [`CODE_ALPHABET`].
pub fn generate_school_code(rng: &dyn SecureRandom) -> Result<String> {
    let mut bytes = [0u8; CODE_LEN];
    rng.fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Random number generation failed")))?;
    Ok(bytes
        .iter()
        .map(|b| CODE_ALPHABET[*b as usize % CODE_ALPHABET.len()] as char)
        .collect())
}

impl Database {
    // ─── Registration Requests ───────────────────────────────────

    /// File a pending request. A username or email already taken by an
    /// account, or a username with an open request, is a conflict.
    pub async fn create_admin_request(&self, request: &NewAdminRequest) -> Result<i64> {
        let taken: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ?1 OR email = ?2")
                .bind(&request.username)
                .bind(&request.email)
                .fetch_one(self.pool())
                .await?;
        if taken > 0 {
            return Err(AppError::Conflict(
                "Username or email already registered".to_string(),
            ));
        }

        let result = sqlx::query(
            "INSERT INTO admin_requests (full_name, phone, school_name, school_address, \
             school_level, student_count, username, email, password_hash) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(&request.school_name)
        .bind(&request.school_address)
        .bind(&request.school_level)
        .bind(request.student_count)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .execute(self.pool())
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(
                "A registration for this username is already pending".to_string(),
            ),
            other => other,
        })?;

        let id = result.last_insert_rowid();
        tracing::info!(request_id = id, school = %request.school_name, "School admin registration filed");
        Ok(id)
    }

    /// Open requests, oldest first.
    pub async fn pending_admin_requests(&self) -> Result<Vec<AdminRequest>> {
        let sql = format!(
            "SELECT {} FROM admin_requests WHERE status = 'pending' ORDER BY created_at, id",
            REQUEST_COLUMNS
        );
        Ok(sqlx::query_as::<_, AdminRequest>(&sql)
            .fetch_all(self.pool())
            .await?)
    }

    /// Turn a pending request into a school plus its admin account, all or
    /// nothing. `Ok(None)` if no such pending request exists.
    pub async fn approve_admin_request(&self, id: i64) -> Result<Option<ApprovedSchool>> {
        let mut tx = self.pool().begin().await?;

        let sql = format!(
            "SELECT {} FROM admin_requests WHERE id = ?1 AND status = 'pending'",
            REQUEST_COLUMNS
        );
        let Some(request) = sqlx::query_as::<_, AdminRequest>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            return Ok(None);
        };

        let rng = SystemRandom::new();
        let mut code = None;
        for _ in 0..CODE_ATTEMPTS {
            let candidate = generate_school_code(&rng)?;
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schools WHERE code = ?1")
                .bind(&candidate)
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                code = Some(candidate);
                break;
            }
        }
        let code = code.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!("Could not find a free school code"))
        })?;

        let school_id = sqlx::query(
            "INSERT INTO schools (name, code, address, level) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&request.school_name)
        .bind(&code)
        .bind(&request.school_address)
        .bind(&request.school_level)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let admin_id = sqlx::query(
            "INSERT INTO users (username, email, password_hash, full_name, role, school_id) \
             VALUES (?1, ?2, ?3, ?4, 'admin', ?5)",
        )
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .bind(&request.full_name)
        .bind(school_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Conflict(_) => AppError::Conflict(
                "Username or email was registered after this request was filed".to_string(),
            ),
            other => other,
        })?
        .last_insert_rowid();

        sqlx::query("UPDATE schools SET admin_id = ?1 WHERE id = ?2")
            .bind(admin_id)
            .bind(school_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "UPDATE admin_requests SET status = 'approved', updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?1",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let sql = format!("SELECT {} FROM schools WHERE id = ?1", SCHOOL_COLUMNS);
        let school = sqlx::query_as::<_, School>(&sql)
            .bind(school_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            request_id = id,
            school_id,
            admin_id,
            school = %school.name,
            "School admin registration approved"
        );
        Ok(Some(ApprovedSchool { school, admin_id }))
    }

    /// Returns false if no such pending request exists.
    pub async fn reject_admin_request(&self, id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE admin_requests SET status = 'rejected', updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?1 AND status = 'pending'",
        )
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Schools ─────────────────────────────────────────────────

    pub async fn get_school(&self, id: i64) -> Result<Option<School>> {
        let sql = format!("SELECT {} FROM schools WHERE id = ?1", SCHOOL_COLUMNS);
        Ok(sqlx::query_as::<_, School>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    /// Codes are matched case-insensitively.
    pub async fn school_by_code(&self, code: &str) -> Result<Option<School>> {
        let sql = format!("SELECT {} FROM schools WHERE code = ?1", SCHOOL_COLUMNS);
        Ok(sqlx::query_as::<_, School>(&sql)
            .bind(code.trim().to_uppercase())
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn list_schools(&self) -> Result<Vec<SchoolSummary>> {
        Ok(sqlx::query_as::<_, SchoolSummary>(
            "SELECT s.id, s.name, s.code, COUNT(u.id) AS members \
             FROM schools s LEFT JOIN users u ON u.school_id = s.id \
             GROUP BY s.id ORDER BY s.name",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn rename_school(&self, id: i64, name: &str) -> Result<()> {
        sqlx::query("UPDATE schools SET name = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2")
            .bind(name)
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(())
    }

    /// Admins first, then by name.
    pub async fn school_members(&self, school_id: i64) -> Result<Vec<SchoolMember>> {
        Ok(sqlx::query_as::<_, SchoolMember>(
            "SELECT id, full_name, class, points, avatar, role FROM users \
             WHERE school_id = ?1 \
             ORDER BY CASE role WHEN 'user' THEN 1 ELSE 0 END, full_name",
        )
        .bind(school_id)
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn join_school(&self, user_id: i64, school_id: i64) -> Result<()> {
        sqlx::query(
            "UPDATE users SET school_id = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
        )
        .bind(school_id)
        .bind(user_id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Detach a student from a school. Admin accounts are never detached.
    /// Returns false if `member_id` is not a student of that school.
    pub async fn remove_school_member(&self, school_id: i64, member_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE users SET school_id = NULL, updated_at = CURRENT_TIMESTAMP \
             WHERE id = ?1 AND school_id = ?2 AND role = 'user'",
        )
        .bind(member_id)
        .bind(school_id)
        .execute(self.pool())
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
