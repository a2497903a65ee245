//! Wire types for the TMDb v3 endpoints we call. TMDb sends `null` for
//! missing image paths and dates, so those are all optional.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieSearchResponse {
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub results: Vec<MovieResult>,
    #[serde(default)]
    pub total_pages: i64,
    #[serde(default)]
    pub total_results: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieResult {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovieDetails {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub overview: String,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub runtime: Option<i32>,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub tagline: String,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
    #[serde(default)]
    pub release_dates: ReleaseDatesResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TmdbGenre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseDatesResponse {
    #[serde(default)]
    pub results: Vec<ReleaseDateCountry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDateCountry {
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseDate {
    #[serde(default)]
    pub certification: String,
    pub release_date: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenreListResponse {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub order: i32,
    pub profile_path: Option<String>,
    #[serde(default)]
    pub known_for_department: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrewMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub job: String,
    #[serde(default)]
    pub department: String,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub crew: Vec<CrewMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetail {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub biography: String,
    pub birthday: Option<String>,
    pub profile_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_with_nulls() {
        let json = r#"{
            "id": 603,
            "title": "The Matrix",
            "overview": "A hacker learns the truth.",
            "poster_path": null,
            "backdrop_path": "/bg.jpg",
            "release_date": "1999-03-30",
            "runtime": 136,
            "vote_average": 8.2,
            "genres": [{"id": 28, "name": "Action"}],
            "release_dates": {"results": [
                {"iso_3166_1": "US", "release_dates": [
                    {"certification": "R", "release_date": "1999-03-30T00:00:00.000Z", "type": 3}
                ]}
            ]}
        }"#;
        let details: MovieDetails = serde_json::from_str(json).unwrap();
        assert!(details.poster_path.is_none());
        assert_eq!(details.runtime, Some(136));
        assert_eq!(details.release_dates.results[0].release_dates[0].kind, 3);
    }
}
