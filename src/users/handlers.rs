use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::validate::*;
use crate::auth::handlers::UserSummary;
use crate::auth::{hash_password, MaybeAuthUser};
use crate::db::{DbError, NewUser, Role, UserRepo};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn create_user(
    State(state): State<AppState>,
    MaybeAuthUser(caller): MaybeAuthUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserSummary>)> {
    let Json(req) = payload?;
    let username = req.username.trim();
    let email = req.email.trim();

    validate_username(username).map_err(ApiError::bad_request)?;
    validate_email(email).map_err(ApiError::bad_request)?;
    validate_password(&req.password).map_err(ApiError::bad_request)?;
    let role = parse_role(req.role.as_deref()).map_err(ApiError::bad_request)?;

    if role == Role::Admin && !caller.as_ref().is_some_and(|c| c.is_admin()) {
        warn!("Refused admin account creation for {}", email);
        return Err(ApiError::forbidden("admin access required"));
    }

    let new_user = NewUser {
        username: username.to_string(),
        email: email.to_string(),
        password_hash: hash_password(&req.password).await?,
        role,
    };

    let user = state.db.create_user(&new_user).await.map_err(|e| match e {
        DbError::AlreadyExists(_) => {
            ApiError::conflict("user with this email or username already exists")
        }
        other => other.into(),
    })?;

    info!("User created: {} (ID: {}, role: {})", user.email, user.id, user.role);
    Ok((StatusCode::CREATED, Json(UserSummary::from(&user))))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let id: i64 = id.parse().map_err(|_| ApiError::bad_request("invalid id"))?;
    let user = state
        .db
        .get_user_by_id(id)
        .await
        .map_err(|e| ApiError::from_db(e, "user not found"))?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        avatar_url: user.avatar_url,
        role: user.role,
        created_at: user.created_at,
        updated_at: user.updated_at,
    }))
}
