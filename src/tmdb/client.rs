use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info};

use super::types::*;
use crate::config::TmdbConfig;

const POSTER_SIZE: &str = "w500";
const BACKDROP_SIZE: &str = "w1280";
const PROFILE_SIZE: &str = "w500";

#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("TMDb request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TMDb API error: status {0}")]
    Status(u16),
    #[error("Failed to decode TMDb response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("TMDb API key not configured")]
    NotConfigured,
}

/// Builds full image URLs from the relative paths TMDb returns.
#[derive(Debug, Clone)]
pub struct ImageUrls {
    base: String,
}

impl ImageUrls {
    pub fn new(base: &str) -> Self {
        let mut base = base.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        Self { base }
    }

    fn build(&self, size: &str, path: Option<&str>) -> String {
        match path.filter(|p| !p.is_empty()) {
            Some(path) => format!("{}{}{}", self.base, size, path),
            None => String::new(),
        }
    }

    pub fn poster(&self, path: Option<&str>) -> String {
        self.build(POSTER_SIZE, path)
    }

    pub fn backdrop(&self, path: Option<&str>) -> String {
        self.build(BACKDROP_SIZE, path)
    }

    pub fn profile(&self, path: Option<&str>) -> String {
        self.build(PROFILE_SIZE, path)
    }
}

impl Default for ImageUrls {
    fn default() -> Self {
        Self::new("https://image.tmdb.org/t/p/")
    }
}

pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    images: ImageUrls,
}

/// Shows the first and last four characters of a key, for logs.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return format!("*** (length {})", chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{} (length {})", head, tail, chars.len())
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> Result<Self, TmdbError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or(TmdbError::NotConfigured)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        info!("TMDb client initialized with API key {}", mask_key(&api_key));

        Ok(Self {
            http,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            images: ImageUrls::new(&config.image_base_url),
        })
    }

    pub fn images(&self) -> &ImageUrls {
        &self.images
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, TmdbError> {
        let url = format!("{}{}", self.base_url, endpoint);
        let shown: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        debug!("TMDb API request: {}?api_key=***&{}", url, shown.join("&"));

        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                error!("TMDb request to {} failed: {}", endpoint, e);
                TmdbError::Http(e)
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| TmdbError::Http(e.without_url()))?;

        if status != StatusCode::OK {
            error!(
                "TMDb API error: status {}, body: {}",
                status.as_u16(),
                String::from_utf8_lossy(&body)
            );
            return Err(TmdbError::Status(status.as_u16()));
        }

        debug!("TMDb API response: {} bytes", body.len());
        serde_json::from_slice(&body).map_err(|e| {
            error!("Failed to decode TMDb response from {}: {}", endpoint, e);
            TmdbError::Decode(e)
        })
    }

    pub async fn search_movies(&self, query: &str) -> Result<MovieSearchResponse, TmdbError> {
        self.get("/search/movie", &[("query", query), ("include_adult", "false")])
            .await
    }

    pub async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, TmdbError> {
        let endpoint = format!("/movie/{}", tmdb_id);
        self.get(&endpoint, &[("append_to_response", "release_dates")])
            .await
    }

    pub async fn movie_credits(&self, tmdb_id: i64) -> Result<Credits, TmdbError> {
        let endpoint = format!("/movie/{}/credits", tmdb_id);
        self.get(&endpoint, &[]).await
    }

    pub async fn person_details(&self, tmdb_id: i64) -> Result<PersonDetail, TmdbError> {
        let endpoint = format!("/person/{}", tmdb_id);
        self.get(&endpoint, &[]).await
    }

    pub async fn genres(&self) -> Result<Vec<TmdbGenre>, TmdbError> {
        let list: GenreListResponse = self.get("/genre/movie/list", &[]).await?;
        Ok(list.genres)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query};
    use axum::http::StatusCode as AxumStatus;
    use axum::response::{IntoResponse, Response};
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    const TEST_KEY: &str = "test-key-0123456789";

    type Params = Query<HashMap<String, String>>;

    fn key_ok(params: &HashMap<String, String>) -> bool {
        params.get("api_key").map(String::as_str) == Some(TEST_KEY)
    }

    async fn movie(Path(id): Path<i64>, Query(params): Params) -> Response {
        if !key_ok(&params) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        match id {
            500 => AxumStatus::INTERNAL_SERVER_ERROR.into_response(),
            999 => "this is not json".into_response(),
            _ => Json(json!({
                "id": id,
                "title": "The Matrix",
                "runtime": 136,
                "tagline": params.get("append_to_response").cloned().unwrap_or_default(),
                "release_dates": {"results": [
                    {"iso_3166_1": "US", "release_dates": [{"certification": "R", "type": 3}]}
                ]}
            }))
            .into_response(),
        }
    }

    async fn credits(Path(_id): Path<i64>, Query(params): Params) -> Response {
        if !key_ok(&params) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        Json(json!({
            "cast": [{"id": 6384, "name": "Keanu Reeves", "character": "Neo", "order": 0}],
            "crew": [{"id": 9340, "name": "Lana Wachowski", "job": "Director"}]
        }))
        .into_response()
    }

    async fn search(Query(params): Params) -> Response {
        if !key_ok(&params) || params.get("include_adult").map(String::as_str) != Some("false") {
            return AxumStatus::BAD_REQUEST.into_response();
        }
        let query = params.get("query").cloned().unwrap_or_default();
        Json(json!({
            "page": 1,
            "results": [{"id": 603, "title": query}],
            "total_pages": 1,
            "total_results": 1
        }))
        .into_response()
    }

    async fn person(Path(id): Path<i64>, Query(params): Params) -> Response {
        if !key_ok(&params) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        Json(json!({"id": id, "name": "Carrie-Anne Moss", "birthday": "1967-08-21"})).into_response()
    }

    async fn genre_list(Query(params): Params) -> Response {
        if !key_ok(&params) {
            return AxumStatus::UNAUTHORIZED.into_response();
        }
        Json(json!({"genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}]}))
            .into_response()
    }

    async fn fake_tmdb() -> String {
        let app = Router::new()
            .route("/movie/:id", get(movie))
            .route("/movie/:id/credits", get(credits))
            .route("/search/movie", get(search))
            .route("/person/:id", get(person))
            .route("/genre/movie/list", get(genre_list));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn client(base_url: String, key: &str) -> TmdbClient {
        TmdbClient::new(&TmdbConfig {
            api_key: Some(key.to_string()),
            base_url,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_client_calls() {
        let tmdb = client(fake_tmdb().await, TEST_KEY);

        let details = tmdb.movie_details(603).await.unwrap();
        assert_eq!(details.title, "The Matrix");
        assert_eq!(details.runtime, Some(136));
        assert_eq!(details.tagline, "release_dates");
        assert_eq!(details.release_dates.results[0].release_dates[0].certification, "R");

        let credits = tmdb.movie_credits(603).await.unwrap();
        assert_eq!(credits.cast[0].character, "Neo");
        assert_eq!(credits.crew[0].job, "Director");

        let results = tmdb.search_movies("matrix reloaded").await.unwrap();
        assert_eq!(results.results[0].title, "matrix reloaded");

        let person = tmdb.person_details(530).await.unwrap();
        assert_eq!(person.id, 530);
        assert_eq!(person.birthday.as_deref(), Some("1967-08-21"));

        let genres = tmdb.genres().await.unwrap();
        assert_eq!(genres.len(), 2);
        assert_eq!(genres[1].name, "Science Fiction");
    }

    #[tokio::test]
    async fn test_client_error_mapping() {
        let base = fake_tmdb().await;
        let tmdb = client(base.clone(), TEST_KEY);

        assert!(matches!(
            tmdb.movie_details(500).await,
            Err(TmdbError::Status(500))
        ));
        assert!(matches!(
            tmdb.movie_details(999).await,
            Err(TmdbError::Decode(_))
        ));

        let wrong_key = client(base, "wrong-key");
        assert!(matches!(
            wrong_key.movie_details(603).await,
            Err(TmdbError::Status(401))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_http_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let tmdb = client(format!("http://{}", addr), TEST_KEY);
        assert!(matches!(tmdb.genres().await, Err(TmdbError::Http(_))));
    }

    #[test]
    fn test_image_urls() {
        let images = ImageUrls::new("https://image.tmdb.org/t/p");
        assert_eq!(
            images.poster(Some("/abc.jpg")),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(
            images.backdrop(Some("/bg.jpg")),
            "https://image.tmdb.org/t/p/w1280/bg.jpg"
        );
        assert_eq!(images.profile(Some("")), "");
        assert_eq!(images.profile(None), "");
    }

    #[test]
    fn test_mask_key() {
        assert_eq!(mask_key("abcd1234efgh5678"), "abcd...5678 (length 16)");
        assert_eq!(mask_key("short"), "*** (length 5)");
    }

    #[test]
    fn test_client_requires_key() {
        let config = TmdbConfig::default();
        assert!(matches!(
            TmdbClient::new(&config),
            Err(TmdbError::NotConfigured)
        ));
    }
}
