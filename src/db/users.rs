// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User, class and leaderboard operations.

use super::Database;
use crate::error::Result;
use crate::models::{ClassInfo, LeaderboardEntry, Role, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, full_name, class, role, points, \
     avatar, bio, theme, target_khatam, province, city, school_id, created_at, updated_at";

/// Fields for a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub class: String,
    pub role: Role,
    pub school_id: Option<i64>,
}

/// Self-service profile fields.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub email: String,
    pub class: String,
    pub bio: String,
    pub avatar: String,
    pub theme: String,
    pub target_khatam: i64,
    pub province: String,
    pub city: String,
}

impl From<&User> for ProfileUpdate {
    fn from(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            class: user.class.clone(),
            bio: user.bio.clone(),
            avatar: user.avatar.clone(),
            theme: user.theme.clone(),
            target_khatam: user.target_khatam,
            province: user.province.clone(),
            city: user.city.clone(),
        }
    }
}

/// Fields an administrator may change on another account.
#[derive(Debug, Clone)]
pub struct AdminUserUpdate {
    pub full_name: String,
    pub email: String,
    pub class: String,
    pub role: Role,
}

impl Database {
    // ─── User Operations ─────────────────────────────────────────

    /// Insert a user and return the new ID. Duplicate username or email
    /// surfaces as a conflict.
    pub async fn create_user(&self, user: &NewUser) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, full_name, class, role, school_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.class)
        .bind(user.role)
        .bind(user.school_id)
        .execute(self.pool())
        .await?;

        let id = result.last_insert_rowid();
        tracing::info!(user_id = id, username = %user.username, role = %user.role, "User created");
        Ok(id)
    }

    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = ?1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(self.pool())
            .await?)
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users ORDER BY class, full_name",
            USER_COLUMNS
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .fetch_all(self.pool())
            .await?)
    }

    /// Substring search over name, username, email and class.
    pub async fn search_users(&self, query: &str) -> Result<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users \
             WHERE full_name LIKE ?1 OR username LIKE ?1 OR email LIKE ?1 OR class LIKE ?1 \
             ORDER BY full_name",
            USER_COLUMNS
        );
        let pattern = format!("%{}%", query.trim());
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(pattern)
            .fetch_all(self.pool())
            .await?)
    }

    pub async fn update_profile(&self, id: i64, update: &ProfileUpdate) -> Result<()> {
        sqlx::query(
            "UPDATE users SET full_name = ?1, email = ?2, class = ?3, bio = ?4, avatar = ?5, \
             theme = ?6, target_khatam = ?7, province = ?8, city = ?9, \
             updated_at = CURRENT_TIMESTAMP WHERE id = ?10",
        )
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(&update.class)
        .bind(&update.bio)
        .bind(&update.avatar)
        .bind(&update.theme)
        .bind(update.target_khatam)
        .bind(&update.province)
        .bind(&update.city)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn admin_update_user(&self, id: i64, update: &AdminUserUpdate) -> Result<()> {
        sqlx::query(
            "UPDATE users SET full_name = ?1, email = ?2, class = ?3, role = ?4, \
             updated_at = CURRENT_TIMESTAMP WHERE id = ?5",
        )
        .bind(&update.full_name)
        .bind(&update.email)
        .bind(&update.class)
        .bind(update.role)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        sqlx::query(
            "UPDATE users SET password_hash = ?1, updated_at = CURRENT_TIMESTAMP WHERE id = ?2",
        )
        .bind(password_hash)
        .bind(id)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    /// Delete a user and (via cascade) their activity. Returns false if
    /// no such user existed.
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether any admin or superadmin account exists.
    pub async fn admin_exists(&self) -> Result<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role IN ('admin', 'superadmin')")
                .fetch_one(self.pool())
                .await?;
        Ok(count > 0)
    }

    /// Top students by points.
    pub async fn leaderboard(&self, limit: i64) -> Result<Vec<LeaderboardEntry>> {
        Ok(sqlx::query_as::<_, LeaderboardEntry>(
            "WITH activity AS ( \
                 SELECT user_id, date FROM prayers \
                 UNION SELECT user_id, date FROM fastings \
                 UNION SELECT user_id, date FROM quran_readings \
                 UNION SELECT user_id, date FROM daily_amaliah \
             ), active AS ( \
                 SELECT user_id, COUNT(*) AS days FROM activity GROUP BY user_id \
             ) \
             SELECT u.id, u.full_name, u.class, u.avatar, u.points, \
                 COALESCE(a.days, 0) AS active_days \
             FROM users u LEFT JOIN active a ON a.user_id = u.id \
             WHERE u.role = 'user' \
             ORDER BY u.points DESC, active_days DESC, u.full_name \
             LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(self.pool())
        .await?)
    }

    // ─── Class Operations ────────────────────────────────────────

    pub async fn list_classes(&self) -> Result<Vec<ClassInfo>> {
        Ok(sqlx::query_as::<_, ClassInfo>(
            "SELECT id, name, level, description FROM classes ORDER BY level, name",
        )
        .fetch_all(self.pool())
        .await?)
    }

    pub async fn create_class(&self, name: &str, level: &str, description: &str) -> Result<i64> {
        let result =
            sqlx::query("INSERT INTO classes (name, level, description) VALUES (?1, ?2, ?3)")
                .bind(name)
                .bind(level)
                .bind(description)
                .execute(self.pool())
                .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn delete_class(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM classes WHERE id = ?1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
