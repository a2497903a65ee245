use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::{debug, info};

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens (creating if needed) the database and applies the schema.
    /// `sqlite::memory:` gives a private in-memory database.
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let in_memory = db_path.contains(":memory:");

        let options = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")?
        } else {
            SqliteConnectOptions::new()
                .filename(db_path)
                .create_if_missing(true)
        }
        .foreign_keys(true);

        // Every in-memory connection is its own database, so keep exactly one.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::raw_sql(schema).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

async fn insert_movie(conn: &mut SqliteConnection, movie: &MovieInput) -> DbResult<i64> {
    let result = sqlx::query(
        "INSERT INTO movies
        (title, slug, release_date, duration_minutes, synopsis, poster_url, backdrop_url,
         average_rating, mpaa_rating, tmdb_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&movie.title)
    .bind(&movie.slug)
    .bind(movie.release_date)
    .bind(movie.duration_minutes)
    .bind(&movie.synopsis)
    .bind(&movie.poster_url)
    .bind(&movie.backdrop_url)
    .bind(movie.average_rating)
    .bind(&movie.mpaa_rating)
    .bind(movie.tmdb_id)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await
    .map_err(|e| DbError::from_write(e, format!("movie with slug {}", movie.slug)))?;

    Ok(result.last_insert_rowid())
}

async fn replace_movie_genres(
    conn: &mut SqliteConnection,
    movie_id: i64,
    genre_ids: &[i64],
) -> DbResult<()> {
    sqlx::query("DELETE FROM movie_genres WHERE movie_id = ?")
        .bind(movie_id)
        .execute(&mut *conn)
        .await?;

    for genre_id in genre_ids {
        sqlx::query("INSERT OR IGNORE INTO movie_genres (movie_id, genre_id) VALUES (?, ?)")
            .bind(movie_id)
            .bind(genre_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::from_write(e, format!("genre {}", genre_id)))?;
    }
    Ok(())
}

async fn find_genre_by_name(conn: &mut SqliteConnection, name: &str) -> DbResult<Option<Genre>> {
    let genre = sqlx::query_as::<_, Genre>(
        "SELECT id, name, tmdb_id FROM genres WHERE LOWER(name) = LOWER(?)",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;
    Ok(genre)
}

async fn get_or_create_genre(conn: &mut SqliteConnection, wanted: &ImportGenre) -> DbResult<Genre> {
    if let Some(genre) = find_genre_by_name(conn, &wanted.name).await? {
        debug!("Found existing genre: {} (ID: {})", genre.name, genre.id);
        return Ok(genre);
    }

    // Another writer may have created it in the meantime; ignore the
    // conflict and read back whatever row won.
    sqlx::query("INSERT OR IGNORE INTO genres (name, tmdb_id) VALUES (?, ?)")
        .bind(&wanted.name)
        .bind(wanted.tmdb_id)
        .execute(&mut *conn)
        .await?;

    if let Some(genre) = find_genre_by_name(conn, &wanted.name).await? {
        debug!("Created/found genre: {} (ID: {})", genre.name, genre.id);
        return Ok(genre);
    }

    // The TMDb id is taken by a genre stored under a different name.
    sqlx::query_as::<_, Genre>("SELECT id, name, tmdb_id FROM genres WHERE tmdb_id = ?")
        .bind(wanted.tmdb_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DbError::NotFound(format!("genre {}", wanted.name)))
}

async fn find_person_by_tmdb_id(
    conn: &mut SqliteConnection,
    tmdb_id: i64,
) -> DbResult<Option<Person>> {
    // Includes soft-deleted rows.
    let person = sqlx::query_as::<_, Person>("SELECT * FROM people WHERE tmdb_id = ?")
        .bind(tmdb_id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(person)
}

async fn restore_if_deleted(conn: &mut SqliteConnection, mut person: Person) -> DbResult<Person> {
    if person.deleted_at.is_some() {
        info!(
            "Restoring soft-deleted person: {} (ID: {}, TMDb ID: {:?})",
            person.name, person.id, person.tmdb_id
        );
        let now = Utc::now();
        sqlx::query("UPDATE people SET deleted_at = NULL, updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(person.id)
            .execute(&mut *conn)
            .await?;
        person.deleted_at = None;
        person.updated_at = now;
    }
    Ok(person)
}

async fn get_or_create_person(
    conn: &mut SqliteConnection,
    wanted: &ImportPerson,
) -> DbResult<Person> {
    if let Some(person) = find_person_by_tmdb_id(conn, wanted.tmdb_id).await? {
        debug!(
            "Found existing person: {} (ID: {}, TMDb ID: {})",
            person.name, person.id, wanted.tmdb_id
        );
        return restore_if_deleted(conn, person).await;
    }

    let now = Utc::now();
    sqlx::query(
        "INSERT OR IGNORE INTO people
        (name, biography, profile_image_url, tmdb_id, created_at, updated_at)
        VALUES (?, '', ?, ?, ?, ?)",
    )
    .bind(&wanted.name)
    .bind(&wanted.profile_image_url)
    .bind(wanted.tmdb_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    let person = find_person_by_tmdb_id(conn, wanted.tmdb_id)
        .await?
        .ok_or_else(|| {
            DbError::NotFound(format!("person {} (tmdb_id={})", wanted.name, wanted.tmdb_id))
        })?;
    debug!(
        "Created person: {} (ID: {}, TMDb ID: {})",
        person.name, person.id, wanted.tmdb_id
    );
    restore_if_deleted(conn, person).await
}

async fn link_credit(
    conn: &mut SqliteConnection,
    movie_id: i64,
    person_id: i64,
    credit: &ImportCredit,
) -> DbResult<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO movie_people
        (movie_id, person_id, role, character_name, cast_order)
        VALUES (?, ?, ?, ?, ?)",
    )
    .bind(movie_id)
    .bind(person_id)
    .bind(&credit.role)
    .bind(&credit.character_name)
    .bind(credit.cast_order)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

fn like_pattern(query: &str) -> String {
    format!("%{}%", query)
}

fn push_movie_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &MovieFilter) {
    if filter.genre.is_some() {
        qb.push(
            " JOIN movie_genres mg ON mg.movie_id = m.id
              JOIN genres g ON g.id = mg.genre_id",
        );
    }
    qb.push(" WHERE 1 = 1");
    if let Some(ref search) = filter.search {
        qb.push(" AND m.title LIKE ").push_bind(like_pattern(search));
    }
    if let Some(ref genre) = filter.genre {
        qb.push(" AND LOWER(g.name) = LOWER(")
            .push_bind(genre.clone())
            .push(")");
    }
}

fn push_people_filter(qb: &mut QueryBuilder<'_, Sqlite>, search: Option<&str>) {
    qb.push(" WHERE p.deleted_at IS NULL");
    if let Some(search) = search {
        qb.push(" AND p.name LIKE ").push_bind(like_pattern(search));
    }
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn create_user(&self, user: &NewUser) -> DbResult<User> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (username, email, password_hash, avatar_url, role, created_at, updated_at)
            VALUES (?, ?, ?, '', ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, format!("user {}", user.email)))?;

        self.get_user_by_id(result.last_insert_rowid()).await
    }

    async fn get_user_by_id(&self, id: i64) -> DbResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_read(e, format!("User not found: {}", id)))
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_read(e, format!("User not found: {}", email)))
    }

    async fn list_users(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn update_user(&self, id: i64, update: &UserUpdate) -> DbResult<User> {
        let result = sqlx::query(
            "UPDATE users SET username = ?, email = ?, role = ?,
                password_hash = COALESCE(?, password_hash), updated_at = ?
            WHERE id = ?",
        )
        .bind(&update.username)
        .bind(&update.email)
        .bind(update.role)
        .bind(update.password_hash.as_deref())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, format!("user {}", update.email)))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }
        self.get_user_by_id(id).await
    }

    async fn delete_user(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("User not found: {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl MovieRepo for SqliteRepository {
    async fn create_movie(&self, movie: &MovieInput, genre_ids: &[i64]) -> DbResult<Movie> {
        let mut tx = self.pool.begin().await?;
        let id = insert_movie(&mut tx, movie).await?;
        replace_movie_genres(&mut tx, id, genre_ids).await?;
        tx.commit().await?;

        self.get_movie(id).await
    }

    async fn update_movie(&self, id: i64, movie: &MovieInput, genre_ids: &[i64]) -> DbResult<Movie> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE movies SET title = ?, slug = ?, release_date = ?, duration_minutes = ?,
                synopsis = ?, poster_url = ?, backdrop_url = ?, mpaa_rating = ?
            WHERE id = ?",
        )
        .bind(&movie.title)
        .bind(&movie.slug)
        .bind(movie.release_date)
        .bind(movie.duration_minutes)
        .bind(&movie.synopsis)
        .bind(&movie.poster_url)
        .bind(&movie.backdrop_url)
        .bind(&movie.mpaa_rating)
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| DbError::from_write(e, format!("movie with slug {}", movie.slug)))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Movie not found: {}", id)));
        }
        replace_movie_genres(&mut tx, id, genre_ids).await?;
        tx.commit().await?;

        self.get_movie(id).await
    }

    async fn delete_movie(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM movies WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Movie not found: {}", id)));
        }
        Ok(())
    }

    async fn get_movie(&self, id: i64) -> DbResult<Movie> {
        sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_read(e, format!("Movie not found: {}", id)))
    }

    async fn get_movie_by_slug(&self, slug: &str) -> DbResult<Movie> {
        sqlx::query_as::<_, Movie>("SELECT * FROM movies WHERE slug = ?")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_read(e, format!("Movie not found: {}", slug)))
    }

    async fn find_existing_movie(&self, slug: &str, tmdb_id: Option<i64>) -> DbResult<Option<Movie>> {
        let movie = sqlx::query_as::<_, Movie>(
            "SELECT * FROM movies WHERE slug = ? OR (? IS NOT NULL AND tmdb_id = ?) LIMIT 1",
        )
        .bind(slug)
        .bind(tmdb_id)
        .bind(tmdb_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(movie)
    }

    async fn list_movies(&self, filter: &MovieFilter, page: Page) -> DbResult<(Vec<Movie>, i64)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM movies m");
        push_movie_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT m.* FROM movies m");
        push_movie_filter(&mut select, filter);
        select
            .push(" ORDER BY m.created_at DESC, m.id DESC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        let movies = select.build_query_as::<Movie>().fetch_all(&self.pool).await?;

        Ok((movies, total))
    }

    async fn list_movies_sorted(&self, sort: MovieSort, order: SortOrder) -> DbResult<Vec<Movie>> {
        // Both parts come from closed enums, never from user text.
        let query = format!(
            "SELECT * FROM movies ORDER BY {} {}, id {}",
            sort.column(),
            order.as_sql(),
            order.as_sql()
        );
        let movies = sqlx::query_as::<_, Movie>(&query).fetch_all(&self.pool).await?;
        Ok(movies)
    }

    async fn list_movies_for_genre(&self, genre_id: i64) -> DbResult<Vec<Movie>> {
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT m.* FROM movies m
             JOIN movie_genres mg ON mg.movie_id = m.id
             WHERE mg.genre_id = ?
             ORDER BY m.title ASC",
        )
        .bind(genre_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn search_movies(&self, query: &str, limit: i64) -> DbResult<Vec<Movie>> {
        let pattern = like_pattern(query);
        let movies = sqlx::query_as::<_, Movie>(
            "SELECT * FROM movies WHERE title LIKE ? OR synopsis LIKE ? ORDER BY title ASC LIMIT ?",
        )
        .bind(&pattern)
        .bind(&pattern)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(movies)
    }

    async fn movie_detail(&self, movie: Movie) -> DbResult<MovieDetail> {
        let genres = self.genres_for_movie(movie.id).await?;
        let cast = self.credits_for_movie(movie.id).await?;
        Ok(MovieDetail { movie, genres, cast })
    }
}

#[async_trait]
impl GenreRepo for SqliteRepository {
    async fn create_genre(&self, name: &str) -> DbResult<Genre> {
        let result = sqlx::query("INSERT INTO genres (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, format!("genre {}", name)))?;
        self.get_genre(result.last_insert_rowid()).await
    }

    async fn update_genre(&self, id: i64, name: &str) -> DbResult<Genre> {
        let result = sqlx::query("UPDATE genres SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DbError::from_write(e, format!("genre {}", name)))?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Genre not found: {}", id)));
        }
        self.get_genre(id).await
    }

    async fn delete_genre(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM genres WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Genre not found: {}", id)));
        }
        Ok(())
    }

    async fn get_genre(&self, id: i64) -> DbResult<Genre> {
        sqlx::query_as::<_, Genre>("SELECT id, name, tmdb_id FROM genres WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_read(e, format!("Genre not found: {}", id)))
    }

    async fn get_genre_by_name(&self, name: &str) -> DbResult<Genre> {
        let mut conn = self.pool.acquire().await?;
        find_genre_by_name(&mut conn, name)
            .await?
            .ok_or_else(|| DbError::NotFound(format!("Genre not found: {}", name)))
    }

    async fn list_genres(&self) -> DbResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name, tmdb_id FROM genres ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn genres_for_movie(&self, movie_id: i64) -> DbResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT g.id, g.name, g.tmdb_id FROM genres g
             JOIN movie_genres mg ON mg.genre_id = g.id
             WHERE mg.movie_id = ?
             ORDER BY g.name ASC",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn search_genres(&self, query: &str, limit: i64) -> DbResult<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT id, name, tmdb_id FROM genres WHERE name LIKE ? ORDER BY name ASC LIMIT ?",
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }
}

#[async_trait]
impl PersonRepo for SqliteRepository {
    async fn create_person(&self, person: &NewPerson) -> DbResult<Person> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO people
            (name, biography, birth_date, profile_image_url, tmdb_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&person.name)
        .bind(&person.biography)
        .bind(person.birth_date)
        .bind(&person.profile_image_url)
        .bind(person.tmdb_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_write(e, format!("person {}", person.name)))?;

        self.get_person(result.last_insert_rowid()).await
    }

    async fn get_person(&self, id: i64) -> DbResult<Person> {
        sqlx::query_as::<_, Person>("SELECT * FROM people WHERE id = ? AND deleted_at IS NULL")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DbError::from_read(e, format!("Person not found: {}", id)))
    }

    async fn list_people(&self, search: Option<&str>, page: Page) -> DbResult<(Vec<Person>, i64)> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM people p");
        push_people_filter(&mut count, search);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT p.* FROM people p");
        push_people_filter(&mut select, search);
        select
            .push(" ORDER BY p.name ASC, p.id ASC LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset);
        let people = select.build_query_as::<Person>().fetch_all(&self.pool).await?;

        Ok((people, total))
    }

    async fn list_all_people(&self) -> DbResult<Vec<Person>> {
        let people = sqlx::query_as::<_, Person>(
            "SELECT * FROM people WHERE deleted_at IS NULL ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(people)
    }

    async fn search_people(&self, query: &str, limit: i64) -> DbResult<Vec<Person>> {
        let people = sqlx::query_as::<_, Person>(
            "SELECT * FROM people WHERE deleted_at IS NULL AND name LIKE ? ORDER BY name ASC LIMIT ?",
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(people)
    }

    async fn soft_delete_person(&self, id: i64) -> DbResult<()> {
        let now = Utc::now();
        let result = sqlx::query(
            "UPDATE people SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        )
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Person not found: {}", id)));
        }
        Ok(())
    }

    async fn person_credits(&self, person_id: i64) -> DbResult<Vec<PersonCredit>> {
        let credits = sqlx::query_as::<_, PersonCredit>(
            "SELECT m.*, mp.role, mp.character_name, mp.cast_order
             FROM movies m
             JOIN movie_people mp ON mp.movie_id = m.id
             WHERE mp.person_id = ?
             ORDER BY m.release_date DESC, m.id DESC",
        )
        .bind(person_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(credits)
    }
}

#[async_trait]
impl CreditRepo for SqliteRepository {
    async fn credits_for_movie(&self, movie_id: i64) -> DbResult<Vec<Credit>> {
        let credits = sqlx::query_as::<_, Credit>(
            "SELECT mp.movie_id, mp.person_id, mp.role, mp.character_name, mp.cast_order,
                    p.id, p.name, p.biography, p.birth_date, p.profile_image_url, p.tmdb_id,
                    p.created_at, p.updated_at, p.deleted_at
             FROM movie_people mp
             JOIN people p ON p.id = mp.person_id
             WHERE mp.movie_id = ? AND p.deleted_at IS NULL
             ORDER BY mp.cast_order IS NULL, mp.cast_order ASC, mp.role ASC, p.name ASC",
        )
        .bind(movie_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(credits)
    }

    async fn add_credit(&self, movie_id: i64, credit: &NewCredit) -> DbResult<()> {
        // Soft-deleted people cannot be credited.
        self.get_person(credit.person_id).await?;

        sqlx::query(
            "INSERT INTO movie_people (movie_id, person_id, role, character_name, cast_order)
            VALUES (?, ?, ?, ?, ?)",
        )
        .bind(movie_id)
        .bind(credit.person_id)
        .bind(&credit.role)
        .bind(&credit.character_name)
        .bind(credit.cast_order)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DbError::from_write(
                e,
                format!("credit {} as {} on movie {}", credit.person_id, credit.role, movie_id),
            )
        })?;
        Ok(())
    }

    async fn remove_credit(&self, movie_id: i64, person_id: i64, role: &str) -> DbResult<()> {
        let result = sqlx::query(
            "DELETE FROM movie_people WHERE movie_id = ? AND person_id = ? AND role = ?",
        )
        .bind(movie_id)
        .bind(person_id)
        .bind(role)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!(
                "Credit not found: {}/{}/{}",
                movie_id, person_id, role
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogRepo for SqliteRepository {
    async fn stats(&self) -> DbResult<CatalogStats> {
        let total_movies: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
            .fetch_one(&self.pool)
            .await?;
        let total_genres: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM genres")
            .fetch_one(&self.pool)
            .await?;
        let total_people: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM people WHERE deleted_at IS NULL")
                .fetch_one(&self.pool)
                .await?;
        Ok(CatalogStats {
            total_movies,
            total_genres,
            total_people,
        })
    }

    async fn import_movie(&self, plan: &ImportPlan) -> DbResult<i64> {
        // Dropping `tx` on any early return rolls everything back.
        let mut tx = self.pool.begin().await?;

        let mut genre_ids = Vec::with_capacity(plan.genres.len());
        for wanted in &plan.genres {
            let genre = get_or_create_genre(&mut tx, wanted).await?;
            genre_ids.push(genre.id);
        }

        let movie_id = insert_movie(&mut tx, &plan.movie).await?;
        replace_movie_genres(&mut tx, movie_id, &genre_ids).await?;
        info!("Movie created with ID: {}", movie_id);

        for credit in &plan.credits {
            let person = get_or_create_person(&mut tx, &credit.person).await?;
            link_credit(&mut tx, movie_id, person.id, credit).await?;
            debug!("Added credit: {} as {}", person.name, credit.role);
        }

        tx.commit().await?;
        Ok(movie_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    async fn repo() -> SqliteRepository {
        SqliteRepository::new("sqlite::memory:").await.unwrap()
    }

    fn movie_input(title: &str, slug: &str) -> MovieInput {
        MovieInput {
            title: title.to_string(),
            slug: slug.to_string(),
            ..Default::default()
        }
    }

    fn import_credit(tmdb_id: i64, name: &str, role: &str, order: Option<i32>) -> ImportCredit {
        ImportCredit {
            person: ImportPerson {
                tmdb_id,
                name: name.to_string(),
                profile_image_url: String::new(),
            },
            role: role.to_string(),
            character_name: String::new(),
            cast_order: order,
        }
    }

    #[tokio::test]
    async fn test_movie_with_genres_roundtrip() {
        let repo = repo().await;
        let drama = repo.create_genre("Drama").await.unwrap();
        let crime = repo.create_genre("Crime").await.unwrap();

        let mut input = movie_input("Heat", "heat");
        input.release_date = NaiveDate::from_ymd_opt(1995, 12, 15);
        input.duration_minutes = Some(170);
        let movie = repo.create_movie(&input, &[drama.id, crime.id]).await.unwrap();
        assert_eq!(movie.release_date, input.release_date);

        let detail = repo.movie_detail(movie.clone()).await.unwrap();
        let names: Vec<_> = detail.genres.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Crime", "Drama"]);

        let updated = repo
            .update_movie(movie.id, &movie_input("Heat (1995)", "heat-1995"), &[drama.id])
            .await
            .unwrap();
        assert_eq!(updated.slug, "heat-1995");
        assert_eq!(repo.genres_for_movie(movie.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_already_exists() {
        let repo = repo().await;
        repo.create_movie(&movie_input("Alien", "alien"), &[]).await.unwrap();
        let err = repo
            .create_movie(&movie_input("Alien again", "alien"), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_list_movies_filters_and_paginates() {
        let repo = repo().await;
        let scifi = repo.create_genre("Science Fiction").await.unwrap();
        for i in 0..5 {
            let genres = if i % 2 == 0 { vec![scifi.id] } else { vec![] };
            repo.create_movie(&movie_input(&format!("Star {}", i), &format!("star-{}", i)), &genres)
                .await
                .unwrap();
        }
        repo.create_movie(&movie_input("Moon", "moon"), &[]).await.unwrap();

        let (page, total) = repo
            .list_movies(&MovieFilter::default(), Page { limit: 4, offset: 4 })
            .await
            .unwrap();
        assert_eq!(total, 6);
        assert_eq!(page.len(), 2);

        let filter = MovieFilter {
            search: Some("star".to_string()),
            genre: Some("science fiction".to_string()),
        };
        let (movies, total) = repo
            .list_movies(&filter, Page { limit: 20, offset: 0 })
            .await
            .unwrap();
        assert_eq!(total, 3);
        assert!(movies.iter().all(|m| m.title.starts_with("Star")));
    }

    #[tokio::test]
    async fn test_delete_movie_cascades_links() {
        let repo = repo().await;
        let genre = repo.create_genre("Horror").await.unwrap();
        let movie = repo.create_movie(&movie_input("It", "it"), &[genre.id]).await.unwrap();
        let person = repo
            .create_person(&NewPerson {
                name: "Bill Skarsgard".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        repo.add_credit(
            movie.id,
            &NewCredit {
                person_id: person.id,
                role: ROLE_ACTOR.to_string(),
                character_name: "Pennywise".to_string(),
                cast_order: Some(0),
            },
        )
        .await
        .unwrap();

        repo.delete_movie(movie.id).await.unwrap();
        assert!(repo.person_credits(person.id).await.unwrap().is_empty());
        assert!(repo.list_movies_for_genre(genre.id).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete_movie(movie.id).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_credit_rules() {
        let repo = repo().await;
        let movie = repo.create_movie(&movie_input("Up", "up"), &[]).await.unwrap();
        let person = repo
            .create_person(&NewPerson {
                name: "Pete Docter".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let credit = NewCredit {
            person_id: person.id,
            role: ROLE_DIRECTOR.to_string(),
            character_name: String::new(),
            cast_order: None,
        };
        repo.add_credit(movie.id, &credit).await.unwrap();
        assert!(matches!(
            repo.add_credit(movie.id, &credit).await,
            Err(DbError::AlreadyExists(_))
        ));

        repo.soft_delete_person(person.id).await.unwrap();
        assert!(repo.credits_for_movie(movie.id).await.unwrap().is_empty());
        assert_eq!(repo.stats().await.unwrap().total_people, 0);

        let writer = NewCredit {
            role: ROLE_WRITER.to_string(),
            ..credit
        };
        assert!(matches!(
            repo.add_credit(movie.id, &writer).await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_import_reuses_genres_and_restores_people() {
        let repo = repo().await;
        let existing = repo.create_genre("ACTION").await.unwrap();
        let person = repo
            .create_person(&NewPerson {
                name: "Keanu Reeves".to_string(),
                tmdb_id: Some(6384),
                ..Default::default()
            })
            .await
            .unwrap();
        repo.soft_delete_person(person.id).await.unwrap();

        let mut movie = movie_input("The Matrix", "the-matrix");
        movie.tmdb_id = Some(603);
        let plan = ImportPlan {
            movie,
            genres: vec![
                ImportGenre {
                    tmdb_id: 28,
                    name: "Action".to_string(),
                },
                ImportGenre {
                    tmdb_id: 878,
                    name: "Science Fiction".to_string(),
                },
            ],
            credits: vec![
                import_credit(6384, "Keanu Reeves", ROLE_ACTOR, Some(0)),
                import_credit(2975, "Laurence Fishburne", ROLE_ACTOR, Some(1)),
                import_credit(9339, "Lana Wachowski", ROLE_DIRECTOR, None),
            ],
        };

        let movie_id = repo.import_movie(&plan).await.unwrap();

        let genres = repo.genres_for_movie(movie_id).await.unwrap();
        assert_eq!(genres.len(), 2);
        assert!(genres.iter().any(|g| g.id == existing.id));
        assert_eq!(repo.list_genres().await.unwrap().len(), 2);

        let restored = repo.get_person(person.id).await.unwrap();
        assert!(restored.deleted_at.is_none());

        let cast = repo.credits_for_movie(movie_id).await.unwrap();
        assert_eq!(cast.len(), 3);
        assert_eq!(cast[0].person.name, "Keanu Reeves");
        assert_eq!(cast[2].role, ROLE_DIRECTOR);
    }

    #[tokio::test]
    async fn test_import_rolls_back_on_failure() {
        let repo = repo().await;
        repo.create_movie(&movie_input("Solaris", "solaris"), &[]).await.unwrap();

        let plan = ImportPlan {
            movie: movie_input("Solaris", "solaris"),
            genres: vec![ImportGenre {
                tmdb_id: 18,
                name: "Drama".to_string(),
            }],
            credits: vec![import_credit(1, "Donatas Banionis", ROLE_ACTOR, Some(0))],
        };

        let err = repo.import_movie(&plan).await.unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));
        assert!(repo.list_genres().await.unwrap().is_empty());
        assert_eq!(repo.stats().await.unwrap().total_movies, 1);
    }
}
