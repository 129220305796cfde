use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;

use radlink_core::{presence, users};
use radlink_types::api::{
    CreateUserRequest, ResetPasswordRequest, StatsResponse, UpdateProfileRequest, UserResponse,
};
use radlink_types::error::CoreError;
use radlink_types::models::Principal;

use crate::auth::{self, AppState, MIN_PASSWORD_LEN};
use crate::error::{ApiError, ApiResult};
use crate::run_blocking;

fn check_password_length(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError(CoreError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        ))));
    }
    Ok(())
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let views = run_blocking(state, move |db| users::list_users(db, &principal)).await?;
    let now = Utc::now();
    Ok(Json(
        views
            .into_iter()
            .map(|u| UserResponse {
                id: u.id,
                username: u.username,
                role: u.role,
                is_online: presence::is_online(u.last_seen, now),
                last_seen: u.last_seen.to_rfc3339(),
            })
            .collect::<Vec<_>>(),
    ))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<impl IntoResponse> {
    check_password_length(&req.password)?;
    let user = run_blocking(state, move |db| {
        let hash = auth::hash_password(&req.password).map_err(CoreError::Storage)?;
        users::create_user(db, &principal, &req.username, req.role, &hash)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
            role: user.role,
            is_online: true,
            last_seen: user.last_seen.to_rfc3339(),
        }),
    ))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<ResetPasswordRequest>,
) -> ApiResult<impl IntoResponse> {
    check_password_length(&req.new_password)?;
    run_blocking(state, move |db| {
        let hash = auth::hash_password(&req.new_password).map_err(CoreError::Storage)?;
        users::reset_password(db, &principal, user_id, &hash)
    })
    .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    if let Some(password) = &req.password {
        check_password_length(password)?;
    }
    run_blocking(state, move |db| {
        let hash = req
            .password
            .as_deref()
            .map(auth::hash_password)
            .transpose()
            .map_err(CoreError::Storage)?;
        users::update_profile(db, &principal, req.username.as_deref(), hash.as_deref())
    })
    .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    run_blocking(state, move |db| users::delete_user(db, &principal, user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> ApiResult<impl IntoResponse> {
    let s = run_blocking(state, move |db| users::stats(db, &principal)).await?;
    Ok(Json(StatsResponse {
        total_users: s.total_users,
        total_tasks: s.total_tasks,
        total_messages: s.total_messages,
        active_chats: s.active_chats,
        active_users_today: s.active_users_today,
    }))
}
