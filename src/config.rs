use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub dbdir: Option<String>,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub seed_admin: Option<SeedAdminConfig>,
    #[serde(skip)]
    pub debug_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub sqlite: Option<SqliteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_jwt_expires_hours")]
    pub jwt_expires_hours: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            jwt_expires_hours: default_jwt_expires_hours(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,
    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,
    #[serde(default = "default_tmdb_timeout")]
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            timeout_secs: default_tmdb_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

/// Administrator account created at startup when no user with this
/// email exists yet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SeedAdminConfig {
    pub username: String,
    pub email: String,
    pub password: String,
}

fn default_port() -> String {
    "8080".to_string()
}

fn default_jwt_expires_hours() -> u32 {
    24
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p/".to_string()
}

fn default_tmdb_timeout() -> u64 {
    10
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://localhost:3001".to_string(),
    ]
}

pub const DEFAULT_CONFIG_FILE: &str = "cinemesh-server.yaml";

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        Self::from_yaml(&content).map_err(|e| ConfigError::ParseError(path.to_string(), e))
    }

    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Loads the config file and applies environment overrides. The default
    /// config file is optional; an explicitly named one is not.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut config = if path == DEFAULT_CONFIG_FILE && !Path::new(path).exists() {
            Config::default()
        } else {
            Self::from_file(path)?
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("TMDB_API_KEY").filter(|v| !v.is_empty()) {
            self.tmdb.api_key = Some(key);
        }
        if let Some(secret) = lookup("JWT_SECRET").filter(|v| !v.is_empty()) {
            self.auth.jwt_secret = secret;
        }
        if let Some(hours) = lookup("JWT_EXPIRES_HOURS")
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|h| *h > 0)
        {
            self.auth.jwt_expires_hours = hours;
        }
        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.listen.port = port;
        }
        if let Some(url) = lookup("BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = Some(url);
        }
        if let Some(filename) = lookup("DATABASE_PATH").filter(|v| !v.is_empty()) {
            self.database.sqlite = Some(SqliteConfig { filename });
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Invalid(
                "auth.jwt_secret (or JWT_SECRET) must be set".to_string(),
            ));
        }
        if self.auth.jwt_expires_hours == 0 {
            return Err(ConfigError::Invalid(
                "auth.jwt_expires_hours must be positive".to_string(),
            ));
        }
        // Credentialed CORS cannot use a wildcard origin.
        if self.cors.allowed_origins.iter().any(|o| o.trim() == "*") {
            return Err(ConfigError::Invalid(
                "cors.allowed_origins must list explicit origins, not \"*\"".to_string(),
            ));
        }
        Ok(())
    }

    pub fn get_database_path(&self) -> String {
        if let Some(ref sqlite) = self.database.sqlite {
            return sqlite.filename.clone();
        }

        if let Some(ref dbdir) = self.dbdir {
            let path = PathBuf::from(dbdir).join("cinemesh.db");
            return path.to_string_lossy().to_string();
        }

        "cinemesh.db".to_string()
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or("http://localhost:8080")
    }

    pub fn tmdb_api_key(&self) -> Option<&str> {
        self.tmdb.api_key.as_deref().filter(|k| !k.is_empty())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config = Config::from_yaml("{}").unwrap();
        assert_eq!(config.listen.port, "8080");
        assert_eq!(config.auth.jwt_expires_hours, 24);
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.cors.allowed_origins.len(), 2);
        assert_eq!(config.get_database_path(), "cinemesh.db");
        assert_eq!(config.base_url(), "http://localhost:8080");
        assert!(config.tmdb_api_key().is_none());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
listen:
  address: 127.0.0.1
  port: "9000"
dbdir: /var/lib/cinemesh
auth:
  jwt_secret: sekrit
  jwt_expires_hours: 2
tmdb:
  api_key: abcdefgh12345678
seed_admin:
  username: admin
  email: admin@example.com
  password: changeme
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.listen.address.as_deref(), Some("127.0.0.1"));
        assert_eq!(config.listen.port, "9000");
        assert_eq!(config.get_database_path(), "/var/lib/cinemesh/cinemesh.db");
        assert_eq!(config.auth.jwt_expires_hours, 2);
        assert_eq!(config.tmdb_api_key(), Some("abcdefgh12345678"));
        assert_eq!(config.seed_admin.as_ref().unwrap().email, "admin@example.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("TMDB_API_KEY", "key"),
            ("JWT_SECRET", "from-env"),
            ("JWT_EXPIRES_HOURS", "0"),
            ("PORT", "3030"),
            ("DATABASE_PATH", "/tmp/x.db"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.tmdb_api_key(), Some("key"));
        assert_eq!(config.auth.jwt_secret, "from-env");
        // zero is ignored
        assert_eq!(config.auth.jwt_expires_hours, 24);
        assert_eq!(config.listen.port, "3030");
        assert_eq!(config.get_database_path(), "/tmp/x.db");
    }

    #[test]
    fn test_wildcard_origin_is_rejected() {
        let mut config = Config::default();
        config.auth.jwt_secret = "sekrit".to_string();
        config.cors.allowed_origins = vec!["*".to_string()];
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_secret_is_rejected() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
