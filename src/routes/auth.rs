// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Username/password session routes.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::db::users::NewUser;
use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_session_cookie, create_jwt, session_cookie};
use crate::models::{Role, User};
use crate::routes::api::UserResponse;
use crate::services::password::{hash_password, verify_password};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
}

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    username: String,
    #[validate(length(min = 1, max = 200))]
    password: String,
}

#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 6, max = 200))]
    password: String,
    #[validate(length(min = 1, max = 100))]
    full_name: String,
    #[serde(default)]
    #[validate(length(max = 50))]
    class: String,
    /// Join code of the student's school, if any
    #[serde(default)]
    #[validate(length(max = 20))]
    school_code: Option<String>,
}

/// Session response; the token is also set as an HttpOnly cookie.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Log in with username and password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    let user = state.db.get_user_by_username(req.username.trim()).await?;
    let verified = match &user {
        Some(user) => verify_password(&req.password, &user.password_hash).unwrap_or_else(|e| {
            tracing::error!(user_id = user.id, error = %e, "Stored password hash is unreadable");
            false
        }),
        None => false,
    };

    let user = match user {
        Some(user) if verified => user,
        _ => {
            tracing::info!(username = %req.username, "Failed login");
            return Err(AppError::Unauthorized);
        }
    };

    tracing::info!(user_id = user.id, role = %user.role, "User logged in");
    start_session(&state, jar, user)
}

/// Self-registration for students, optionally into a school by code.
async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    req.validate()?;

    let school_id = match req.school_code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(
            state
                .db
                .school_by_code(code)
                .await?
                .ok_or_else(|| AppError::BadRequest("Invalid school code".to_string()))?
                .id,
        ),
        None => None,
    };

    let new_user = NewUser {
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        password_hash: hash_password(&req.password)?,
        full_name: req.full_name.trim().to_string(),
        class: req.class.trim().to_string(),
        role: Role::User,
        school_id,
    };

    let id = state.db.create_user(&new_user).await.map_err(|e| match e {
        AppError::Conflict(_) => AppError::Conflict("Username or email already registered".to_string()),
        other => other,
    })?;

    let user = state
        .db
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("User {} vanished after insert", id)))?;

    start_session(&state, jar, user)
}

/// Clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    (
        jar.add(clear_session_cookie(state.config.secure_cookies)),
        StatusCode::NO_CONTENT,
    )
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: User,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let token = create_jwt(user.id, user.role, &state.config.jwt_signing_key)?;
    let jar = jar.add(session_cookie(token.clone(), state.config.secure_cookies));

    Ok((
        jar,
        Json(SessionResponse {
            token,
            user: UserResponse::from(user),
        }),
    ))
}
