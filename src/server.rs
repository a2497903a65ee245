use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::auth::middleware::require_auth;
use crate::auth::JwtKeys;
use crate::config::Config;
use crate::db::SqliteRepository;
use crate::tmdb::TmdbClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: Arc<SqliteRepository>,
    pub jwt: Arc<JwtKeys>,
    pub tmdb: Option<Arc<TmdbClient>>,
}

impl AppState {
    pub fn new(config: Config, db: Arc<SqliteRepository>, tmdb: Option<TmdbClient>) -> Self {
        let jwt = JwtKeys::from_config(&config.auth);
        Self {
            config: Arc::new(config),
            db,
            jwt: Arc::new(jwt),
            tmdb: tmdb.map(Arc::new),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors
        .allowed_origins
        .iter()
        .filter(|origin| {
            if origin.trim() == "*" {
                warn!("Ignoring wildcard CORS origin; credentials require explicit origins");
                return false;
            }
            true
        })
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ])
        .expose_headers([header::CONTENT_LENGTH])
        .allow_credentials(true)
        .max_age(Duration::from_secs(12 * 3600))
}

pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/api/public/movies", get(crate::api::handlers::list_movies))
        .route("/api/public/movies/:id", get(crate::api::handlers::get_movie))
        .route("/api/public/genres", get(crate::api::handlers::list_genres))
        .route("/api/public/genres/:id", get(crate::api::handlers::get_genre))
        .route("/api/public/people", get(crate::api::handlers::list_people))
        .route("/api/public/people/:id", get(crate::api::handlers::get_person))
        .route("/api/public/search", get(crate::api::handlers::search))
        .route("/api/public/stats", get(crate::api::handlers::stats))
        .route("/api/public/docs", get(crate::api::docs::docs));

    let account_routes = Router::new()
        .route("/login", post(crate::auth::handlers::login))
        .route("/users", post(crate::users::handlers::create_user))
        .route("/users/:id", get(crate::users::handlers::get_user))
        .route(
            "/me",
            get(crate::auth::handlers::me)
                .route_layer(from_fn_with_state(state.clone(), require_auth)),
        );

    let router = Router::new()
        .route("/", get(crate::api::docs::docs))
        .route("/health", get(crate::api::handlers::health))
        .merge(public_routes)
        .merge(account_routes)
        .merge(crate::admin::routes(state.clone()))
        .fallback(fallback_handler)
        .layer(from_fn(crate::middleware::log_request))
        .layer(cors_layer(&state.config))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Rewriting the path has to happen before routing.
    Router::new()
        .fallback_service(router)
        .layer(from_fn(crate::middleware::normalize_path))
}

async fn fallback_handler() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}
