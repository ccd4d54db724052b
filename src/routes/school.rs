// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Multi-school routes: joining a school, running one as its admin, and
//! superadmin review of school admin registrations.

use crate::db::schools::NewAdminRequest;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    AdminRequest, RequestStatus, Role, School, SchoolMember, SchoolSummary, User,
};
use crate::routes::api::load_user;
use crate::services::password::hash_password;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

/// Registration form for prospective school admins. No auth.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/register-admin", post(register_admin))
}

/// Member and school admin routes. Mounted behind `require_auth`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/school", get(my_school).put(update_school))
        .route("/api/school/join", post(join_school))
        .route("/api/school/members", get(list_members))
        .route("/api/school/members/{id}", delete(remove_member))
}

/// Mounted behind `require_auth` and `require_superadmin`.
pub fn superadmin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/schools", get(list_schools))
        .route("/admin/school-requests", get(list_requests))
        .route("/admin/school-requests/{id}/approve", post(approve_request))
        .route("/admin/school-requests/{id}/reject", post(reject_request))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdminRegisterRequest {
    #[validate(length(min = 1, max = 100))]
    full_name: String,
    #[validate(length(min = 6, max = 20))]
    phone: String,
    #[validate(length(min = 1, max = 150))]
    school_name: String,
    #[serde(default)]
    #[validate(length(max = 300))]
    school_address: String,
    #[validate(length(min = 1, max = 20))]
    school_level: String,
    #[serde(default)]
    #[validate(range(min = 0, max = 100_000))]
    student_count: i64,
    #[validate(length(min = 3, max = 50))]
    username: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 6, max = 200))]
    password: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationReceipt {
    pub id: i64,
    pub status: RequestStatus,
}

/// File a request to run a new school. A superadmin must approve it
/// before any account exists.
async fn register_admin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminRegisterRequest>,
) -> Result<(StatusCode, Json<RegistrationReceipt>)> {
    req.validate()?;

    let request = NewAdminRequest {
        full_name: req.full_name.trim().to_string(),
        phone: req.phone.trim().to_string(),
        school_name: req.school_name.trim().to_string(),
        school_address: req.school_address.trim().to_string(),
        school_level: req.school_level.trim().to_string(),
        student_count: req.student_count,
        username: req.username.trim().to_string(),
        email: req.email.trim().to_string(),
        password_hash: hash_password(&req.password)?,
    };
    let id = state.db.create_admin_request(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationReceipt {
            id,
            status: RequestStatus::Pending,
        }),
    ))
}

async fn member_school(state: &AppState, user: &User) -> Result<School> {
    let school_id = user
        .school_id
        .ok_or_else(|| AppError::NotFound("Not a member of any school".to_string()))?;
    state
        .db
        .get_school(school_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("School {} not found", school_id)))
}

/// The school the caller administers. Only school admins qualify;
/// superadmins manage schools through the admin panel.
async fn administered_school(state: &AppState, auth: &AuthUser) -> Result<(User, School)> {
    let user = load_user(state, auth.user_id).await?;
    if user.role != Role::Admin {
        return Err(AppError::Forbidden);
    }
    let school = member_school(state, &user).await?;
    Ok((user, school))
}

async fn my_school(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<School>> {
    let user = load_user(&state, auth.user_id).await?;
    Ok(Json(member_school(&state, &user).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinRequest {
    #[validate(length(min = 1, max = 20))]
    code: String,
}

/// Join a school by its code. Accounts already in a school must leave
/// (be removed) first.
async fn join_school(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<School>> {
    req.validate()?;
    let user = load_user(&state, auth.user_id).await?;
    if user.school_id.is_some() {
        return Err(AppError::Conflict("Already a member of a school".to_string()));
    }

    let school = state
        .db
        .school_by_code(&req.code)
        .await?
        .ok_or_else(|| AppError::BadRequest("Invalid school code".to_string()))?;
    state.db.join_school(user.id, school.id).await?;

    tracing::info!(user_id = user.id, school_id = school.id, "User joined school");
    Ok(Json(school))
}

async fn list_members(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<SchoolMember>>> {
    let (_, school) = administered_school(&state, &auth).await?;
    Ok(Json(state.db.school_members(school.id).await?))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SchoolUpdateRequest {
    #[validate(length(min = 1, max = 150))]
    name: String,
}

async fn update_school(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(req): Json<SchoolUpdateRequest>,
) -> Result<Json<School>> {
    req.validate()?;
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("School name cannot be empty".to_string()));
    }

    let (user, school) = administered_school(&state, &auth).await?;
    state.db.rename_school(school.id, name).await?;
    tracing::info!(admin_id = user.id, school_id = school.id, name, "School renamed");

    member_school(&state, &user).await.map(Json)
}

async fn remove_member(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(member_id): Path<i64>,
) -> Result<StatusCode> {
    let (user, school) = administered_school(&state, &auth).await?;
    if member_id == user.id {
        return Err(AppError::BadRequest(
            "A school admin cannot remove themselves".to_string(),
        ));
    }

    if !state.db.remove_school_member(school.id, member_id).await? {
        return Err(AppError::NotFound(format!(
            "Student {} is not in this school",
            member_id
        )));
    }
    tracing::info!(admin_id = user.id, school_id = school.id, member_id, "Member removed from school");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_schools(State(state): State<Arc<AppState>>) -> Result<Json<Vec<SchoolSummary>>> {
    Ok(Json(state.db.list_schools().await?))
}

async fn list_requests(State(state): State<Arc<AppState>>) -> Result<Json<Vec<AdminRequest>>> {
    Ok(Json(state.db.pending_admin_requests().await?))
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponse {
    pub school: School,
    pub admin_id: i64,
}

async fn approve_request(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ApprovalResponse>)> {
    let approved = state
        .db
        .approve_admin_request(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No pending request {}", id)))?;

    tracing::info!(
        superadmin_id = actor.user_id,
        request_id = id,
        school_id = approved.school.id,
        "Superadmin approved school"
    );
    Ok((
        StatusCode::CREATED,
        Json(ApprovalResponse {
            school: approved.school,
            admin_id: approved.admin_id,
        }),
    ))
}

async fn reject_request(
    State(state): State<Arc<AppState>>,
    Extension(actor): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    if !state.db.reject_admin_request(id).await? {
        return Err(AppError::NotFound(format!("No pending request {}", id)));
    }
    tracing::info!(superadmin_id = actor.user_id, request_id = id, "Superadmin rejected school");
    Ok(StatusCode::NO_CONTENT)
}
