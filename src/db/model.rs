use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ROLE_ACTOR: &str = "Actor";
pub const ROLE_DIRECTOR: &str = "Director";
pub const ROLE_WRITER: &str = "Writer";
pub const ROLE_PRODUCER: &str = "Producer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub avatar_url: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub role: Role,
    /// `None` keeps the stored hash.
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub synopsis: String,
    pub poster_url: String,
    pub backdrop_url: String,
    pub average_rating: f64,
    pub mpaa_rating: String,
    pub tmdb_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A movie together with its genres and credits, the shape every public
/// endpoint returns.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDetail {
    #[serde(flatten)]
    pub movie: Movie,
    pub genres: Vec<Genre>,
    pub cast: Vec<Credit>,
}

/// Editable movie fields, shared by the admin forms and the TMDb import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MovieInput {
    pub title: String,
    pub slug: String,
    pub release_date: Option<NaiveDate>,
    pub duration_minutes: Option<i32>,
    pub synopsis: String,
    pub poster_url: String,
    pub backdrop_url: String,
    pub average_rating: f64,
    pub mpaa_rating: String,
    pub tmdb_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
    pub tmdb_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub biography: String,
    pub birth_date: Option<NaiveDate>,
    pub profile_image_url: String,
    pub tmdb_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPerson {
    pub name: String,
    pub biography: String,
    pub birth_date: Option<NaiveDate>,
    pub profile_image_url: String,
    pub tmdb_id: Option<i64>,
}

/// One (movie, person, role) link.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Credit {
    pub movie_id: i64,
    pub person_id: i64,
    pub role: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub character_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast_order: Option<i32>,
    #[sqlx(flatten)]
    pub person: Person,
}

#[derive(Debug, Clone)]
pub struct NewCredit {
    pub person_id: i64,
    pub role: String,
    pub character_name: String,
    pub cast_order: Option<i32>,
}

/// A movie as seen from a person's filmography.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PersonCredit {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub movie: Movie,
    pub role: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub character_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cast_order: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct CatalogStats {
    pub total_movies: i64,
    pub total_genres: i64,
    pub total_people: i64,
}

#[derive(Debug, Clone, Default)]
pub struct MovieFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MovieSort {
    #[default]
    Id,
    Title,
    ReleaseDate,
    AverageRating,
}

impl MovieSort {
    /// Unknown values fall back to sorting by id.
    pub fn parse(s: &str) -> Self {
        match s {
            "title" => MovieSort::Title,
            "release_date" => MovieSort::ReleaseDate,
            "average_rating" => MovieSort::AverageRating,
            _ => MovieSort::Id,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            MovieSort::Id => "id",
            MovieSort::Title => "title",
            MovieSort::ReleaseDate => "release_date",
            MovieSort::AverageRating => "average_rating",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(s: &str) -> Self {
        match s {
            "asc" => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportGenre {
    pub tmdb_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportPerson {
    pub tmdb_id: i64,
    pub name: String,
    pub profile_image_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportCredit {
    pub person: ImportPerson,
    pub role: String,
    pub character_name: String,
    pub cast_order: Option<i32>,
}

/// Everything needed to write one imported movie in a single transaction.
#[derive(Debug, Clone, Serialize)]
pub struct ImportPlan {
    pub movie: MovieInput,
    pub genres: Vec<ImportGenre>,
    pub credits: Vec<ImportCredit>,
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Maps unique-constraint violations to `AlreadyExists` and dangling
    /// foreign keys to `NotFound`.
    pub fn from_write(e: sqlx::Error, what: impl Into<String>) -> Self {
        match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                DbError::AlreadyExists(what.into())
            }
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                DbError::NotFound(format!("referenced row for {}", what.into()))
            }
            other => DbError::Sqlx(other),
        }
    }

    pub fn from_read(e: sqlx::Error, what: impl Into<String>) -> Self {
        match e {
            sqlx::Error::RowNotFound => DbError::NotFound(what.into()),
            other => DbError::Sqlx(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(MovieSort::parse("title").column(), "title");
        assert_eq!(MovieSort::parse("id; DROP TABLE movies").column(), "id");
        assert_eq!(SortOrder::parse("asc").as_sql(), "ASC");
        assert_eq!(SortOrder::parse("sideways").as_sql(), "DESC");
    }

    #[test]
    fn test_user_serialization_hides_password() {
        let now = Utc::now();
        let user = User {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            avatar_url: String::new(),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "admin");
    }
}
