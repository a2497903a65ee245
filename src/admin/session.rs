use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use tracing::{info, warn};

use super::html::{self, link, login_page};
use super::AdminResult;
use crate::auth::handlers::authenticate;
use crate::auth::TOKEN_COOKIE;
use crate::db::CatalogRepo;
use crate::server::AppState;
use crate::util::QueryParams;

fn session_cookie(token: &str, max_age: i64) -> String {
    format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        TOKEN_COOKIE, token, max_age
    )
}

fn login_error(status: StatusCode, message: &str, email: &str) -> Response {
    (status, Html(login_page(Some(message), email))).into_response()
}

pub async fn login_form() -> Html<String> {
    Html(login_page(None, ""))
}

pub async fn login(State(state): State<AppState>, Form(form): Form<QueryParams>) -> Response {
    let email = form.text("email");
    let password = form.get("password").unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return login_error(StatusCode::BAD_REQUEST, "Email and password required", &email);
    }

    let user = match authenticate(&state, &email, password).await {
        Ok(user) => user,
        Err(e) if e.status == StatusCode::UNAUTHORIZED => {
            return login_error(StatusCode::UNAUTHORIZED, "Invalid credentials", &email);
        }
        Err(e) => return login_error(e.status, &e.message, &email),
    };

    if !user.is_admin() {
        warn!("Non-admin {} tried to log into the admin panel", user.email);
        return login_error(StatusCode::FORBIDDEN, "Admin access required", &email);
    }

    let token = match state.jwt.issue(&user) {
        Ok(token) => token,
        Err(e) => {
            warn!("Failed to issue token for {}: {}", user.email, e);
            return login_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate token",
                &email,
            );
        }
    };

    info!("Admin logged in: {} (ID: {})", user.email, user.id);
    (
        StatusCode::FOUND,
        [
            (header::SET_COOKIE, session_cookie(&token, state.jwt.lifetime_secs())),
            (header::LOCATION, "/admin".to_string()),
        ],
    )
        .into_response()
}

pub async fn logout() -> Response {
    (
        StatusCode::FOUND,
        [
            (header::SET_COOKIE, session_cookie("", 0)),
            (header::LOCATION, "/admin/login".to_string()),
        ],
    )
        .into_response()
}

pub async fn dashboard(State(state): State<AppState>) -> AdminResult<Html<String>> {
    let stats = state.db.stats().await?;

    let card = |label: &str, count: i64, href: &str| {
        format!(
            "<div class=\"card\"><div class=\"count\">{}</div>{}</div>",
            count,
            link(href, label)
        )
    };
    let body = format!(
        "<div class=\"cards\">{}{}{}</div>\n<p>{} | {} | {}</p>",
        card("Movies", stats.total_movies, "/admin/movies"),
        card("Genres", stats.total_genres, "/admin/genres"),
        card("People", stats.total_people, "/admin/people"),
        link("/admin/movies/new", "Add movie"),
        link("/admin/tmdb/search", "Import from TMDb"),
        link("/admin/users", "Manage users"),
    );
    Ok(html::page("Admin Dashboard", &body))
}
