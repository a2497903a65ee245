use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::pagination::{Paginated, Pagination};
use crate::db::*;
use crate::error::{ApiError, ApiResult};
use crate::server::AppState;
use crate::util::QueryParams;

const SEARCH_MOVIE_LIMIT: i64 = 10;
const SEARCH_PEOPLE_LIMIT: i64 = 10;
const SEARCH_GENRE_LIMIT: i64 = 5;

#[derive(Debug, Serialize)]
pub struct Data<T: Serialize> {
    pub data: T,
}

fn data<T: Serialize>(data: T) -> Json<Data<T>> {
    Json(Data { data })
}

#[derive(Debug, Serialize)]
pub struct MovieWithGenres {
    #[serde(flatten)]
    pub movie: Movie,
    pub genres: Vec<Genre>,
}

#[derive(Debug, Serialize)]
pub struct GenreWithMovies {
    pub genre: Genre,
    pub movies: Vec<Movie>,
}

#[derive(Debug, Serialize)]
pub struct PersonWithMovies {
    pub person: Person,
    pub movies: Vec<PersonCredit>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub movies: Vec<MovieWithGenres>,
    pub people: Vec<Person>,
    pub genres: Vec<Genre>,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn load_details(state: &AppState, movies: Vec<Movie>) -> DbResult<Vec<MovieDetail>> {
    let mut out = Vec::with_capacity(movies.len());
    for movie in movies {
        out.push(state.db.movie_detail(movie).await?);
    }
    Ok(out)
}

pub async fn list_movies(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Paginated<MovieDetail>>> {
    let pagination = Pagination::from_params(&params);
    let filter = MovieFilter {
        search: params.get_trimmed("search").map(str::to_string),
        genre: params.get_trimmed("genre").map(str::to_string),
    };

    let (movies, total) = state.db.list_movies(&filter, pagination.page()).await?;
    let data = load_details(&state, movies).await?;

    Ok(Json(Paginated {
        data,
        pagination: pagination.meta(total),
    }))
}

pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Data<MovieDetail>>> {
    let movie = match id.parse::<i64>() {
        Ok(id) => state.db.get_movie(id).await,
        Err(_) => state.db.get_movie_by_slug(&id).await,
    }
    .map_err(|e| ApiError::from_db(e, "movie not found"))?;

    Ok(data(state.db.movie_detail(movie).await?))
}

pub async fn list_genres(State(state): State<AppState>) -> ApiResult<Json<Data<Vec<Genre>>>> {
    Ok(data(state.db.list_genres().await?))
}

pub async fn get_genre(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Data<GenreWithMovies>>> {
    let genre = match id.parse::<i64>() {
        Ok(id) => state.db.get_genre(id).await,
        Err(_) => state.db.get_genre_by_name(&id).await,
    }
    .map_err(|e| ApiError::from_db(e, "genre not found"))?;

    let movies = state.db.list_movies_for_genre(genre.id).await?;
    Ok(data(GenreWithMovies { genre, movies }))
}

pub async fn list_people(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Paginated<Person>>> {
    let pagination = Pagination::from_params(&params);
    let (people, total) = state
        .db
        .list_people(params.get_trimmed("search"), pagination.page())
        .await?;

    Ok(Json(Paginated {
        data: people,
        pagination: pagination.meta(total),
    }))
}

pub async fn get_person(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Data<PersonWithMovies>>> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::bad_request("invalid person id"))?;
    let person = state
        .db
        .get_person(id)
        .await
        .map_err(|e| ApiError::from_db(e, "person not found"))?;

    let movies = state.db.person_credits(person.id).await?;
    Ok(data(PersonWithMovies { person, movies }))
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> ApiResult<Json<Data<SearchResults>>> {
    let q = params
        .get_trimmed("q")
        .ok_or_else(|| ApiError::bad_request("query parameter 'q' required"))?;

    let mut movies = Vec::new();
    for movie in state.db.search_movies(q, SEARCH_MOVIE_LIMIT).await? {
        let genres = state.db.genres_for_movie(movie.id).await?;
        movies.push(MovieWithGenres { movie, genres });
    }
    let people = state.db.search_people(q, SEARCH_PEOPLE_LIMIT).await?;
    let genres = state.db.search_genres(q, SEARCH_GENRE_LIMIT).await?;

    Ok(data(SearchResults {
        movies,
        people,
        genres,
    }))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Data<CatalogStats>>> {
    Ok(data(state.db.stats().await?))
}
