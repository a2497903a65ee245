use axum::{
    extract::{Path, Query, State},
    response::{Html, Response},
    Form,
};
use chrono::NaiveDate;
use tracing::info;

use super::html::{self, escape, form, input, link, post_button, select, table, textarea};
use super::{found, parse_id, AdminError, AdminResult};
use crate::db::*;
use crate::server::AppState;
use crate::util::{slugify, QueryParams};

const ROLES: &[&str] = &[ROLE_ACTOR, ROLE_DIRECTOR, ROLE_WRITER, ROLE_PRODUCER];

/// Reads the movie form. Fields the form does not carry (rating, TMDb id)
/// are left at their defaults.
pub fn parse_movie_form(params: &QueryParams) -> AdminResult<(MovieInput, Vec<i64>)> {
    let title = params.text("title");
    if title.is_empty() {
        return Err(AdminError::bad_request("title is required"));
    }

    let slug = match params.get_trimmed("slug") {
        Some(slug) => slug.to_string(),
        None => slugify(&title),
    };
    if slug.is_empty() {
        return Err(AdminError::bad_request("slug is required"));
    }

    let release_date = params
        .get_trimmed("release_date")
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AdminError::bad_request("invalid release date"))?;

    let duration_minutes = params
        .get_trimmed("duration_minutes")
        .map(|d| d.parse::<i32>().ok().filter(|m| *m >= 0))
        .map(|d| d.ok_or_else(|| AdminError::bad_request("invalid duration")))
        .transpose()?;

    let genre_ids = params
        .get_all("genres")
        .into_iter()
        .map(|g| g.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| AdminError::bad_request("invalid genre id"))?;

    let movie = MovieInput {
        title,
        slug,
        release_date,
        duration_minutes,
        synopsis: params.text("synopsis"),
        poster_url: params.text("poster_url"),
        backdrop_url: params.text("backdrop_url"),
        mpaa_rating: params.text("mpaa_rating"),
        ..Default::default()
    };
    Ok((movie, genre_ids))
}

fn movie_form(action: &str, movie: &MovieInput, all_genres: &[Genre], selected: &[i64], submit: &str) -> String {
    let mut fields = String::new();
    fields.push_str(&input("Title", "text", "title", &movie.title));
    fields.push_str(&input("Slug (blank: derived from title)", "text", "slug", &movie.slug));
    let date = movie
        .release_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    fields.push_str(&input("Release date", "date", "release_date", &date));
    let duration = movie
        .duration_minutes
        .map(|d| d.to_string())
        .unwrap_or_default();
    fields.push_str(&input("Duration (minutes)", "number", "duration_minutes", &duration));
    fields.push_str(&input("MPAA rating", "text", "mpaa_rating", &movie.mpaa_rating));
    fields.push_str(&textarea("Synopsis", "synopsis", &movie.synopsis));
    fields.push_str(&input("Poster URL", "text", "poster_url", &movie.poster_url));
    fields.push_str(&input("Backdrop URL", "text", "backdrop_url", &movie.backdrop_url));

    fields.push_str("<label>Genres</label><div class=\"genres\">\n");
    for genre in all_genres {
        let checked = if selected.contains(&genre.id) { " checked" } else { "" };
        fields.push_str(&format!(
            "<label><input type=\"checkbox\" name=\"genres\" value=\"{}\"{}> {}</label>\n",
            genre.id,
            checked,
            escape(&genre.name)
        ));
    }
    fields.push_str("</div>\n");

    form(action, &fields, submit)
}

fn input_from_movie(movie: &Movie) -> MovieInput {
    MovieInput {
        title: movie.title.clone(),
        slug: movie.slug.clone(),
        release_date: movie.release_date,
        duration_minutes: movie.duration_minutes,
        synopsis: movie.synopsis.clone(),
        poster_url: movie.poster_url.clone(),
        backdrop_url: movie.backdrop_url.clone(),
        average_rating: movie.average_rating,
        mpaa_rating: movie.mpaa_rating.clone(),
        tmdb_id: movie.tmdb_id,
    }
}

async fn load_movie(state: &AppState, id: &str) -> AdminResult<Movie> {
    let id = parse_id(id)?;
    state
        .db
        .get_movie(id)
        .await
        .map_err(|e| AdminError::from_db(e, "movie not found", "movie already exists"))
}

async fn check_genres(state: &AppState, genre_ids: &[i64]) -> AdminResult<()> {
    for id in genre_ids {
        state
            .db
            .get_genre(*id)
            .await
            .map_err(|e| match e {
                DbError::NotFound(_) => AdminError::bad_request("invalid genre id"),
                other => other.into(),
            })?;
    }
    Ok(())
}

fn slug_conflict(e: DbError) -> AdminError {
    AdminError::from_db(e, "movie not found", "a movie with this slug already exists")
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> AdminResult<Html<String>> {
    let sort = MovieSort::parse(params.get("sort").unwrap_or_default());
    let order = SortOrder::parse(params.get("order").unwrap_or_default());
    let movies = state.db.list_movies_sorted(sort, order).await?;

    let sort_link = |column: &str, label: &str| {
        let next = if sort.column() == column && order == SortOrder::Desc {
            "asc"
        } else {
            "desc"
        };
        link(&format!("/admin/movies?sort={}&order={}", column, next), label)
    };

    let rows: Vec<Vec<String>> = movies
        .iter()
        .map(|m| {
            vec![
                m.id.to_string(),
                escape(&m.title),
                m.release_date.map(|d| d.to_string()).unwrap_or_default(),
                format!("{:.1}", m.average_rating),
                format!(
                    "{} {} {}",
                    link(&format!("/admin/movies/{}/edit", m.id), "Edit"),
                    link(&format!("/admin/movies/{}/cast", m.id), "Cast"),
                    post_button(
                        &format!("/admin/movies/{}/delete", m.id),
                        "Delete",
                        "Delete this movie?"
                    )
                ),
            ]
        })
        .collect();

    let headers = [
        sort_link("id", "ID"),
        sort_link("title", "Title"),
        sort_link("release_date", "Released"),
        sort_link("average_rating", "Rating"),
        String::new(),
    ];
    let mut body = format!(
        "<p>{} | {}</p>\n",
        link("/admin/movies/new", "Add movie"),
        link("/admin/tmdb/search", "Import from TMDb")
    );
    body.push_str(&table(&headers, &rows));
    Ok(html::page("Movies", &body))
}

pub async fn new_form(State(state): State<AppState>) -> AdminResult<Html<String>> {
    let genres = state.db.list_genres().await?;
    let body = movie_form("/admin/movies", &MovieInput::default(), &genres, &[], "Create");
    Ok(html::page("New Movie", &body))
}

pub async fn create(
    State(state): State<AppState>,
    Form(params): Form<QueryParams>,
) -> AdminResult<Response> {
    let (movie, genre_ids) = parse_movie_form(&params)?;
    check_genres(&state, &genre_ids).await?;
    let movie = state
        .db
        .create_movie(&movie, &genre_ids)
        .await
        .map_err(slug_conflict)?;
    info!("Movie created: {} (ID: {})", movie.title, movie.id);
    Ok(found("/admin/movies"))
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AdminResult<Html<String>> {
    let movie = load_movie(&state, &id).await?;
    let genres = state.db.list_genres().await?;
    let selected: Vec<i64> = state
        .db
        .genres_for_movie(movie.id)
        .await?
        .iter()
        .map(|g| g.id)
        .collect();

    let mut body = format!(
        "<p>{}</p>\n",
        link(&format!("/admin/movies/{}/cast", movie.id), "Manage cast")
    );
    body.push_str(&movie_form(
        &format!("/admin/movies/{}", movie.id),
        &input_from_movie(&movie),
        &genres,
        &selected,
        "Save",
    ));
    Ok(html::page(&format!("Edit {}", movie.title), &body))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(params): Form<QueryParams>,
) -> AdminResult<Response> {
    let id = parse_id(&id)?;
    let (movie, genre_ids) = parse_movie_form(&params)?;
    check_genres(&state, &genre_ids).await?;
    let movie = state
        .db
        .update_movie(id, &movie, &genre_ids)
        .await
        .map_err(slug_conflict)?;
    info!("Movie updated: {} (ID: {})", movie.title, movie.id);
    Ok(found("/admin/movies"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> AdminResult<Response> {
    let id = parse_id(&id)?;
    state
        .db
        .delete_movie(id)
        .await
        .map_err(|e| AdminError::from_db(e, "movie not found", "movie already exists"))?;
    info!("Movie deleted: {}", id);
    Ok(found("/admin/movies"))
}

pub async fn cast_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AdminResult<Html<String>> {
    let movie = load_movie(&state, &id).await?;
    let credits = state.db.credits_for_movie(movie.id).await?;
    let people = state.db.list_all_people().await?;

    let rows: Vec<Vec<String>> = credits
        .iter()
        .map(|c| {
            vec![
                c.cast_order.map(|o| o.to_string()).unwrap_or_default(),
                escape(&c.person.name),
                escape(&c.role),
                escape(&c.character_name),
                post_button(
                    &format!(
                        "/admin/movies/{}/cast/{}/{}/delete",
                        movie.id, c.person_id, c.role
                    ),
                    "Remove",
                    "Remove this credit?",
                ),
            ]
        })
        .collect();

    let person_options: Vec<(String, String)> = people
        .iter()
        .map(|p| (p.id.to_string(), p.name.clone()))
        .collect();
    let role_options: Vec<(String, String)> = ROLES
        .iter()
        .map(|r| (r.to_string(), r.to_string()))
        .collect();

    let mut fields = select("Person", "person_id", &person_options, "");
    fields.push_str(&select("Role", "role", &role_options, ROLE_ACTOR));
    fields.push_str(&input("Character", "text", "character_name", ""));
    fields.push_str(&input("Cast order", "number", "cast_order", ""));

    let mut body = format!(
        "<p>{}</p>\n",
        link(&format!("/admin/movies/{}/edit", movie.id), "Back to movie")
    );
    body.push_str(&table(&["Order", "Name", "Role", "Character", ""], &rows));
    body.push_str("<h2>Add credit</h2>\n");
    body.push_str(&form(&format!("/admin/movies/{}/cast", movie.id), &fields, "Add"));
    Ok(html::page(&format!("Cast of {}", movie.title), &body))
}

pub fn parse_credit_form(params: &QueryParams) -> AdminResult<NewCredit> {
    let person_id = params
        .get_trimmed("person_id")
        .and_then(|p| p.parse::<i64>().ok())
        .ok_or_else(|| AdminError::bad_request("invalid person id"))?;

    let role = params.text("role");
    if role.is_empty() {
        return Err(AdminError::bad_request("role is required"));
    }
    if !ROLES.contains(&role.as_str()) {
        return Err(AdminError::bad_request("invalid role"));
    }

    let cast_order = params
        .get_trimmed("cast_order")
        .map(|o| o.parse::<i32>())
        .transpose()
        .map_err(|_| AdminError::bad_request("invalid cast order"))?;

    Ok(NewCredit {
        person_id,
        role,
        character_name: params.text("character_name"),
        cast_order,
    })
}

pub async fn add_cast(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(params): Form<QueryParams>,
) -> AdminResult<Response> {
    let movie = load_movie(&state, &id).await?;
    let credit = parse_credit_form(&params)?;

    state
        .db
        .add_credit(movie.id, &credit)
        .await
        .map_err(|e| {
            AdminError::from_db(e, "person not found", "this person already has that role in the movie")
        })?;
    info!(
        "Credit added: person {} as {} in movie {}",
        credit.person_id, credit.role, movie.id
    );
    Ok(found(&format!("/admin/movies/{}/cast", movie.id)))
}

pub async fn remove_cast(
    State(state): State<AppState>,
    Path((id, person_id, role)): Path<(String, String, String)>,
) -> AdminResult<Response> {
    let id = parse_id(&id)?;
    let person_id = parse_id(&person_id)?;
    state
        .db
        .remove_credit(id, person_id, &role)
        .await
        .map_err(|e| AdminError::from_db(e, "credit not found", "credit already exists"))?;
    info!("Credit removed: person {} as {} in movie {}", person_id, role, id);
    Ok(found(&format!("/admin/movies/{}/cast", id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_parse_movie_form() {
        let (movie, genres) = parse_movie_form(&params(&[
            ("title", " The Thing "),
            ("slug", ""),
            ("release_date", "1982-06-25"),
            ("duration_minutes", "109"),
            ("genres", "2"),
            ("genres", "5"),
        ]))
        .unwrap();
        assert_eq!(movie.title, "The Thing");
        assert_eq!(movie.slug, "the-thing");
        assert_eq!(movie.release_date, NaiveDate::from_ymd_opt(1982, 6, 25));
        assert_eq!(movie.duration_minutes, Some(109));
        assert_eq!(genres, vec![2, 5]);
    }

    #[test]
    fn test_movie_form_errors() {
        let err = parse_movie_form(&params(&[("title", "  ")])).unwrap_err();
        assert_eq!(err.message, "title is required");

        let err = parse_movie_form(&params(&[("title", "X"), ("release_date", "June 1982")]))
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "invalid release date");

        let err = parse_movie_form(&params(&[("title", "X"), ("duration_minutes", "long")]))
            .unwrap_err();
        assert_eq!(err.message, "invalid duration");

        let (movie, _) = parse_movie_form(&params(&[
            ("title", "X"),
            ("release_date", ""),
            ("duration_minutes", ""),
        ]))
        .unwrap();
        assert!(movie.release_date.is_none());
        assert!(movie.duration_minutes.is_none());
    }

    #[test]
    fn test_parse_credit_form() {
        let credit = parse_credit_form(&params(&[
            ("person_id", "4"),
            ("role", "Actor"),
            ("character_name", "MacReady"),
            ("cast_order", "0"),
        ]))
        .unwrap();
        assert_eq!(credit.person_id, 4);
        assert_eq!(credit.cast_order, Some(0));

        let err = parse_credit_form(&params(&[("person_id", "4"), ("role", "")])).unwrap_err();
        assert_eq!(err.message, "role is required");
        let err = parse_credit_form(&params(&[("person_id", "4"), ("role", "Key Grip/2nd")]))
            .unwrap_err();
        assert_eq!(err.message, "invalid role");
        let err = parse_credit_form(&params(&[("role", "Actor")])).unwrap_err();
        assert_eq!(err.message, "invalid person id");
    }
}
