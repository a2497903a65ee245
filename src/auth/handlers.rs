use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::middleware::AuthUser;
use super::password::verify_password;
use crate::db::{DbError, Role, User, UserRepo};
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub avatar_url: String,
    pub role: Role,
}

/// Checks email and password; every failure is the same 401.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> ApiResult<User> {
    let user = match state.db.get_user_by_email(email).await {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => {
            warn!("Login failed: unknown email {}", email);
            return Err(ApiError::unauthorized("invalid credentials"));
        }
        Err(e) => return Err(e.into()),
    };

    let ok = verify_password(password, &user.password_hash).await?;
    if !ok {
        warn!("Login failed: wrong password for {}", email);
        return Err(ApiError::unauthorized("invalid credentials"));
    }
    Ok(user)
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(req) = payload?;
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("email and password are required"));
    }

    let user = authenticate(&state, email, &req.password).await?;
    let token = state.jwt.issue(&user)?;

    info!("User logged in: {} (ID: {})", user.email, user.id);
    Ok(Json(LoginResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

pub async fn me(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> ApiResult<Json<MeResponse>> {
    let user = state
        .db
        .get_user_by_id(claims.user_id)
        .await
        .map_err(|e| ApiError::from_db(e, "user not found"))?;

    Ok(Json(MeResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        avatar_url: user.avatar_url,
        role: user.role,
    }))
}
