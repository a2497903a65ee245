pub mod genres;
pub mod html;
pub mod movies;
pub mod people;
pub mod session;
pub mod tmdb;
pub mod users;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{from_fn_with_state, Next},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use std::fmt;
use tracing::error;

use crate::auth::middleware::{session_claims, AuthUser};
use crate::db::DbError;
use crate::server::AppState;

pub type AdminResult<T> = Result<T, AdminError>;

/// Error rendered as the admin error page.
#[derive(Debug)]
pub struct AdminError {
    pub status: StatusCode,
    pub message: String,
}

impl AdminError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
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

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Like the `From<DbError>` mapping, with custom 404 and 409 messages.
    pub fn from_db(e: DbError, not_found: &str, conflict: &str) -> Self {
        match e {
            DbError::NotFound(_) => Self::not_found(not_found),
            DbError::AlreadyExists(_) => Self::conflict(conflict),
            other => other.into(),
        }
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let page = html::error_page(self.status.as_u16(), &self.message);
        (self.status, Html(page)).into_response()
    }
}

impl From<DbError> for AdminError {
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

impl From<crate::auth::AuthError> for AdminError {
    fn from(e: crate::auth::AuthError) -> Self {
        error!("Auth error: {}", e);
        Self::internal("authentication error")
    }
}

pub fn parse_id(id: &str) -> AdminResult<i64> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| AdminError::bad_request("invalid id"))
}

/// 302 to `location`, the answer to every successful admin write.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

/// Admin pages need an admin token. Without any valid token the browser
/// is sent to the login form.
pub async fn require_admin_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(claims) = session_claims(&state, req.headers()) else {
        return Redirect::to("/admin/login").into_response();
    };
    if !claims.is_admin() {
        return AdminError::forbidden("admin access required").into_response();
    }
    req.extensions_mut().insert(AuthUser(claims));
    next.run(req).await
}

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/admin", get(session::dashboard))
        .route("/admin/movies", get(movies::list).post(movies::create))
        .route("/admin/movies/new", get(movies::new_form))
        .route("/admin/movies/:id", post(movies::update))
        .route("/admin/movies/:id/edit", get(movies::edit_form))
        .route("/admin/movies/:id/delete", post(movies::delete))
        .route(
            "/admin/movies/:id/cast",
            get(movies::cast_page).post(movies::add_cast),
        )
        .route(
            "/admin/movies/:id/cast/:person_id/:role/delete",
            post(movies::remove_cast),
        )
        .route("/admin/genres", get(genres::list).post(genres::create))
        .route("/admin/genres/new", get(genres::new_form))
        .route("/admin/genres/:id", post(genres::update))
        .route("/admin/genres/:id/edit", get(genres::edit_form))
        .route("/admin/genres/:id/delete", post(genres::delete))
        .route("/admin/people", get(people::list).post(people::create))
        .route("/admin/people/:id/delete", post(people::delete))
        .route("/admin/users", get(users::list).post(users::create))
        .route("/admin/users/new", get(users::new_form))
        .route("/admin/users/:id", post(users::update))
        .route("/admin/users/:id/edit", get(users::edit_form))
        .route("/admin/users/:id/delete", post(users::delete))
        .route("/admin/tmdb/search", get(tmdb::search_page))
        .route("/admin/tmdb/api/search", get(tmdb::api_search))
        .route("/admin/tmdb/prefill", get(tmdb::prefill))
        .route("/admin/tmdb/import", post(tmdb::import))
        .route_layer(from_fn_with_state(state, require_admin_session));

    Router::new()
        .route(
            "/admin/login",
            get(session::login_form).post(session::login),
        )
        .route("/admin/logout", post(session::logout))
        .merge(protected)
}
