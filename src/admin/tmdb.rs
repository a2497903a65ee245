use axum::{
    extract::{rejection::JsonRejection, Query, State},
    response::Html,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::html;
use crate::db::MovieDetail;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::tmdb::types::MovieSearchResponse;
use crate::tmdb::{convert_movie, import_movie, ConvertedMovie, TmdbClient, TmdbError};
use crate::util::QueryParams;

#[derive(Debug, Deserialize)]
pub struct ImportRequest {
    pub tmdb_id: i64,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: &'static str,
    pub movie: MovieDetail,
}

fn client(state: &AppState) -> ApiResult<Arc<TmdbClient>> {
    state
        .tmdb
        .clone()
        .ok_or_else(|| TmdbError::NotConfigured.into())
}

pub async fn search_page() -> Html<String> {
    html::tmdb_search_page()
}

pub async fn api_search(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<MovieSearchResponse>> {
    let q = params
        .get_trimmed("q")
        .ok_or_else(|| ApiError::bad_request("query parameter required"))?;
    let tmdb = client(&state)?;
    Ok(Json(tmdb.search_movies(q).await?))
}

pub async fn prefill(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<ConvertedMovie>> {
    let tmdb_id = params
        .get_trimmed("tmdb_id")
        .ok_or_else(|| ApiError::bad_request("tmdb_id required"))?
        .parse::<i64>()
        .map_err(|_| ApiError::bad_request("invalid tmdb_id"))?;
    let tmdb = client(&state)?;
    let details = tmdb.movie_details(tmdb_id).await?;
    Ok(Json(convert_movie(&details, tmdb.images())))
}

pub async fn import(
    State(state): State<AppState>,
    payload: Result<Json<ImportRequest>, JsonRejection>,
) -> ApiResult<Json<ImportResponse>> {
    let Json(req) = payload?;
    let tmdb = client(&state)?;
    let movie = import_movie(state.db.as_ref(), tmdb.as_ref(), req.tmdb_id).await?;
    Ok(Json(ImportResponse {
        message: "movie imported successfully with cast",
        movie,
    }))
}
