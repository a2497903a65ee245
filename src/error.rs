use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use tracing::error;

use crate::auth::AuthError;
use crate::db::DbError;
use crate::tmdb::{ImportError, TmdbError};

pub type ApiResult<T> = Result<T, ApiError>;

/// Error returned by the JSON endpoints as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub movie_id: Option<i64>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            movie_id: None,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn movie_exists(movie_id: i64) -> Self {
        Self {
            movie_id: Some(movie_id),
            ..Self::conflict("movie already exists")
        }
    }

    /// Maps a repository error, using `not_found` as the 404 message.
    pub fn from_db(e: DbError, not_found: &str) -> Self {
        match e {
            DbError::NotFound(_) => Self::not_found(not_found),
            other => other.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.movie_id {
            Some(id) => json!({ "error": self.message, "movie_id": id }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound(what) => Self::not_found(what),
            DbError::AlreadyExists(what) => Self::conflict(format!("{} already exists", what)),
            DbError::Sqlx(e) => {
                error!("Database error: {}", e);
                Self::internal("database error")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::bad_request(e.body_text())
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        error!("Auth error: {}", e);
        Self::internal("authentication error")
    }
}

impl From<TmdbError> for ApiError {
    fn from(e: TmdbError) -> Self {
        match e {
            TmdbError::NotConfigured => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "TMDb API key not configured")
            }
            other => {
                error!("TMDb error: {}", other);
                Self::new(StatusCode::BAD_GATEWAY, other.to_string())
            }
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Tmdb(e) => e.into(),
            ImportError::AlreadyImported(id) => Self::movie_exists(id),
            ImportError::Db(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(e: ApiError) -> (StatusCode, serde_json::Value) {
        let response = e.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_movie_exists_body() {
        let (status, body) = body_json(ApiError::movie_exists(7)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "movie already exists");
        assert_eq!(body["movie_id"], 7);
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let e: ApiError = DbError::AlreadyExists("user x".to_string()).into();
        assert_eq!(e.status, StatusCode::CONFLICT);
        let e = ApiError::from_db(DbError::NotFound("Movie not found: 3".to_string()), "movie not found");
        assert_eq!(e.message, "movie not found");
        let e: ApiError = TmdbError::NotConfigured.into();
        assert_eq!(e.status, StatusCode::SERVICE_UNAVAILABLE);
        let e: ApiError = TmdbError::Status(401).into();
        assert_eq!(e.status, StatusCode::BAD_GATEWAY);

        let (_, body) = body_json(ApiError::bad_request("invalid id")).await;
        assert_eq!(body, serde_json::json!({ "error": "invalid id" }));
    }
}
