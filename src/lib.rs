pub mod admin;
pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod server;
pub mod tmdb;
pub mod users;
pub mod util;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use db::{DbError, NewUser, Role, UserRepo};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] db::DbError),
    #[error("Auth error: {0}")]
    Auth(#[from] auth::AuthError),
    #[error("TMDb error: {0}")]
    Tmdb(#[from] tmdb::TmdbError),
    #[error("Server error: {0}")]
    Server(String),
}

/// Creates the configured administrator unless that email is taken.
pub async fn seed_admin<R: UserRepo + ?Sized>(
    repo: &R,
    seed: &config::SeedAdminConfig,
) -> Result<(), ServerError> {
    match repo.get_user_by_email(&seed.email).await {
        Ok(_) => {
            info!("Seed admin {} already exists", seed.email);
            return Ok(());
        }
        Err(DbError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let user = NewUser {
        username: seed.username.clone(),
        email: seed.email.clone(),
        password_hash: auth::hash_password(&seed.password).await?,
        role: Role::Admin,
    };
    let user = repo.create_user(&user).await?;
    info!("Created seed admin {} (ID: {})", user.email, user.id);
    Ok(())
}

pub async fn run(config_path: &str, debug_logs: bool) -> Result<(), ServerError> {
    let mut config = config::Config::load(config_path)?;
    config.debug_logs = debug_logs;

    info!("Using config file: {}", config_path);
    if debug_logs {
        info!("Debug logging enabled");
    }

    let db_path = config.get_database_path();
    info!("Opening database at {}", db_path);
    let db = Arc::new(db::SqliteRepository::new(&db_path).await?);

    if let Some(ref seed) = config.seed_admin {
        seed_admin(db.as_ref(), seed).await?;
    }

    let tmdb = if config.tmdb_api_key().is_some() {
        Some(tmdb::TmdbClient::new(&config.tmdb)?)
    } else {
        warn!("TMDB_API_KEY not set, TMDb import is disabled");
        None
    };

    let address = config.listen.address.as_deref().unwrap_or("[::]");
    let port = &config.listen.port;
    let addr: SocketAddr = format!("{}:{}", address, port)
        .parse()
        .map_err(|e| ServerError::Server(format!("Invalid address: {}", e)))?;

    let tls = match (&config.listen.tlscert, &config.listen.tlskey) {
        (Some(cert), Some(key)) => Some((cert.clone(), key.clone())),
        _ => None,
    };

    info!("API docs at {}/api/public/docs", config.base_url());
    let state = server::AppState::new(config, db, tmdb);
    let app = server::build_router(state);

    if let Some((cert_path, key_path)) = tls {
        info!("Loading TLS certificate from {}", cert_path);
        info!("Loading TLS key from {}", key_path);

        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(&cert_path, &key_path)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to load TLS config: {}", e)))?;

        info!("Serving HTTPS on {}", addr);

        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    } else {
        info!("Serving HTTP on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Server(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(format!("Server error: {}", e)))?;
    }

    Ok(())
}
