use async_trait::async_trait;
use tracing::{info, warn};

use super::client::{ImageUrls, TmdbClient, TmdbError};
use super::convert::{convert_credits, convert_movie, ConvertedMovie};
use super::types::{Credits, MovieDetails};
use crate::db::{DbError, ImportPlan, MovieDetail, Repository};

/// Where imported movie data comes from.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, TmdbError>;
    async fn movie_credits(&self, tmdb_id: i64) -> Result<Credits, TmdbError>;
    fn images(&self) -> &ImageUrls;
}

#[async_trait]
impl MovieSource for TmdbClient {
    async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, TmdbError> {
        TmdbClient::movie_details(self, tmdb_id).await
    }

    async fn movie_credits(&self, tmdb_id: i64) -> Result<Credits, TmdbError> {
        TmdbClient::movie_credits(self, tmdb_id).await
    }

    fn images(&self) -> &ImageUrls {
        TmdbClient::images(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error(transparent)]
    Tmdb(#[from] TmdbError),
    #[error("movie already exists (id {0})")]
    AlreadyImported(i64),
    #[error(transparent)]
    Db(#[from] DbError),
}

pub fn build_import_plan(converted: ConvertedMovie, credits: &Credits, images: &ImageUrls) -> ImportPlan {
    ImportPlan {
        movie: converted.movie,
        genres: converted.genres,
        credits: convert_credits(credits, images),
    }
}

/// Imports one TMDb movie with its genres and credits. Nothing is written
/// unless the whole import succeeds.
pub async fn import_movie<R, S>(repo: &R, source: &S, tmdb_id: i64) -> Result<MovieDetail, ImportError>
where
    R: Repository + ?Sized,
    S: MovieSource + ?Sized,
{
    info!("Importing movie with TMDb ID: {}", tmdb_id);

    let details = source.movie_details(tmdb_id).await?;
    let converted = convert_movie(&details, source.images());

    if let Some(existing) = repo
        .find_existing_movie(&converted.movie.slug, converted.movie.tmdb_id)
        .await?
    {
        warn!(
            "Movie already exists: {} (ID: {})",
            existing.title, existing.id
        );
        return Err(ImportError::AlreadyImported(existing.id));
    }

    let credits = source.movie_credits(tmdb_id).await?;
    let plan = build_import_plan(converted, &credits, source.images());
    info!(
        "Fetched credits: {} cast, {} crew, {} to link",
        credits.cast.len(),
        credits.crew.len(),
        plan.credits.len()
    );

    let movie_id = repo.import_movie(&plan).await?;
    let movie = repo.get_movie(movie_id).await?;
    let detail = repo.movie_detail(movie).await?;

    info!(
        "Movie imported successfully: {} (ID: {}) with {} credits",
        detail.movie.title,
        movie_id,
        detail.cast.len()
    );
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        CatalogRepo, GenreRepo, MovieInput, MovieRepo, SqliteRepository, ROLE_ACTOR,
        ROLE_DIRECTOR,
    };
    use crate::tmdb::types::*;

    struct FakeSource {
        details: MovieDetails,
        credits: Credits,
        images: ImageUrls,
    }

    #[async_trait]
    impl MovieSource for FakeSource {
        async fn movie_details(&self, tmdb_id: i64) -> Result<MovieDetails, TmdbError> {
            if tmdb_id == self.details.id {
                Ok(self.details.clone())
            } else {
                Err(TmdbError::Status(404))
            }
        }

        async fn movie_credits(&self, _tmdb_id: i64) -> Result<Credits, TmdbError> {
            Ok(self.credits.clone())
        }

        fn images(&self) -> &ImageUrls {
            &self.images
        }
    }

    fn source() -> FakeSource {
        FakeSource {
            details: MovieDetails {
                id: 27205,
                title: "Inception".to_string(),
                overview: "Dreams within dreams.".to_string(),
                release_date: Some("2010-07-15".to_string()),
                runtime: Some(148),
                vote_average: 8.4,
                genres: vec![
                    TmdbGenre {
                        id: 28,
                        name: "Action".to_string(),
                    },
                    TmdbGenre {
                        id: 878,
                        name: "Science Fiction".to_string(),
                    },
                ],
                ..Default::default()
            },
            credits: Credits {
                cast: vec![CastMember {
                    id: 6193,
                    name: "Leonardo DiCaprio".to_string(),
                    character: "Cobb".to_string(),
                    order: 0,
                    profile_path: Some("/leo.jpg".to_string()),
                    known_for_department: "Acting".to_string(),
                }],
                crew: vec![CrewMember {
                    id: 525,
                    name: "Christopher Nolan".to_string(),
                    job: "Director".to_string(),
                    department: "Directing".to_string(),
                    profile_path: None,
                }],
            },
            images: ImageUrls::default(),
        }
    }

    #[tokio::test]
    async fn test_import_writes_movie_genres_and_cast() {
        let repo = SqliteRepository::new("sqlite::memory:").await.unwrap();
        let detail = import_movie(&repo, &source(), 27205).await.unwrap();

        assert_eq!(detail.movie.slug, "inception");
        assert_eq!(detail.movie.tmdb_id, Some(27205));
        assert_eq!(detail.genres.len(), 2);
        assert_eq!(detail.cast.len(), 2);
        assert_eq!(detail.cast[0].role, ROLE_ACTOR);
        assert_eq!(detail.cast[0].character_name, "Cobb");
        assert_eq!(
            detail.cast[0].person.profile_image_url,
            "https://image.tmdb.org/t/p/w500/leo.jpg"
        );
        assert_eq!(detail.cast[1].role, ROLE_DIRECTOR);
    }

    #[tokio::test]
    async fn test_second_import_conflicts() {
        let repo = SqliteRepository::new("sqlite::memory:").await.unwrap();
        let first = import_movie(&repo, &source(), 27205).await.unwrap();
        let err = import_movie(&repo, &source(), 27205).await.unwrap_err();
        assert!(matches!(err, ImportError::AlreadyImported(id) if id == first.movie.id));
        assert_eq!(repo.stats().await.unwrap().total_movies, 1);
    }

    #[tokio::test]
    async fn test_existing_slug_conflicts() {
        let repo = SqliteRepository::new("sqlite::memory:").await.unwrap();
        let manual = repo
            .create_movie(
                &MovieInput {
                    title: "Inception".to_string(),
                    slug: "inception".to_string(),
                    ..Default::default()
                },
                &[],
            )
            .await
            .unwrap();
        let err = import_movie(&repo, &source(), 27205).await.unwrap_err();
        assert!(matches!(err, ImportError::AlreadyImported(id) if id == manual.id));
        assert!(repo.list_genres().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_symbol_titles_import_as_distinct_movies() {
        let repo = SqliteRepository::new("sqlite::memory:").await.unwrap();

        let mut first = source();
        first.details.id = 1001;
        first.details.title = "???".to_string();
        let one = import_movie(&repo, &first, 1001).await.unwrap();
        assert_eq!(one.movie.slug, "tmdb-1001");

        let mut second = source();
        second.details.id = 1002;
        second.details.title = "!!!".to_string();
        let two = import_movie(&repo, &second, 1002).await.unwrap();
        assert_eq!(two.movie.slug, "tmdb-1002");
        assert_ne!(one.movie.id, two.movie.id);
    }

    #[tokio::test]
    async fn test_upstream_failure_writes_nothing() {
        let repo = SqliteRepository::new("sqlite::memory:").await.unwrap();
        let err = import_movie(&repo, &source(), 1).await.unwrap_err();
        assert!(matches!(err, ImportError::Tmdb(TmdbError::Status(404))));
        assert_eq!(repo.stats().await.unwrap().total_movies, 0);
    }
}
