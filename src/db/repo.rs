use async_trait::async_trait;

use super::model::*;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn create_user(&self, user: &NewUser) -> DbResult<User>;
    async fn get_user_by_id(&self, id: i64) -> DbResult<User>;
    async fn get_user_by_email(&self, email: &str) -> DbResult<User>;
    async fn list_users(&self) -> DbResult<Vec<User>>;
    async fn update_user(&self, id: i64, update: &UserUpdate) -> DbResult<User>;
    async fn delete_user(&self, id: i64) -> DbResult<()>;
}

#[async_trait]
pub trait MovieRepo: Send + Sync {
    async fn create_movie(&self, movie: &MovieInput, genre_ids: &[i64]) -> DbResult<Movie>;
    async fn update_movie(&self, id: i64, movie: &MovieInput, genre_ids: &[i64]) -> DbResult<Movie>;
    async fn delete_movie(&self, id: i64) -> DbResult<()>;
    async fn get_movie(&self, id: i64) -> DbResult<Movie>;
    async fn get_movie_by_slug(&self, slug: &str) -> DbResult<Movie>;
    async fn find_existing_movie(&self, slug: &str, tmdb_id: Option<i64>) -> DbResult<Option<Movie>>;
    async fn list_movies(&self, filter: &MovieFilter, page: Page) -> DbResult<(Vec<Movie>, i64)>;
    async fn list_movies_sorted(&self, sort: MovieSort, order: SortOrder) -> DbResult<Vec<Movie>>;
    async fn list_movies_for_genre(&self, genre_id: i64) -> DbResult<Vec<Movie>>;
    async fn search_movies(&self, query: &str, limit: i64) -> DbResult<Vec<Movie>>;
    async fn movie_detail(&self, movie: Movie) -> DbResult<MovieDetail>;
}

#[async_trait]
pub trait GenreRepo: Send + Sync {
    async fn create_genre(&self, name: &str) -> DbResult<Genre>;
    async fn update_genre(&self, id: i64, name: &str) -> DbResult<Genre>;
    async fn delete_genre(&self, id: i64) -> DbResult<()>;
    async fn get_genre(&self, id: i64) -> DbResult<Genre>;
    async fn get_genre_by_name(&self, name: &str) -> DbResult<Genre>;
    async fn list_genres(&self) -> DbResult<Vec<Genre>>;
    async fn genres_for_movie(&self, movie_id: i64) -> DbResult<Vec<Genre>>;
    async fn search_genres(&self, query: &str, limit: i64) -> DbResult<Vec<Genre>>;
}

#[async_trait]
pub trait PersonRepo: Send + Sync {
    async fn create_person(&self, person: &NewPerson) -> DbResult<Person>;
    async fn get_person(&self, id: i64) -> DbResult<Person>;
    async fn list_people(&self, search: Option<&str>, page: Page) -> DbResult<(Vec<Person>, i64)>;
    async fn list_all_people(&self) -> DbResult<Vec<Person>>;
    async fn search_people(&self, query: &str, limit: i64) -> DbResult<Vec<Person>>;
    async fn soft_delete_person(&self, id: i64) -> DbResult<()>;
    async fn person_credits(&self, person_id: i64) -> DbResult<Vec<PersonCredit>>;
}

#[async_trait]
pub trait CreditRepo: Send + Sync {
    async fn credits_for_movie(&self, movie_id: i64) -> DbResult<Vec<Credit>>;
    async fn add_credit(&self, movie_id: i64, credit: &NewCredit) -> DbResult<()>;
    async fn remove_credit(&self, movie_id: i64, person_id: i64, role: &str) -> DbResult<()>;
}

#[async_trait]
pub trait CatalogRepo: Send + Sync {
    async fn stats(&self) -> DbResult<CatalogStats>;
    /// Writes the movie, its genres, people and credits atomically and
    /// returns the new movie id.
    async fn import_movie(&self, plan: &ImportPlan) -> DbResult<i64>;
}

pub trait Repository:
    UserRepo + MovieRepo + GenreRepo + PersonRepo + CreditRepo + CatalogRepo + Send + Sync
{
}

impl<T> Repository for T where
    T: UserRepo + MovieRepo + GenreRepo + PersonRepo + CreditRepo + CatalogRepo + Send + Sync
{
}
