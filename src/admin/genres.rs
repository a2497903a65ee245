use axum::{
    extract::{Path, State},
    response::{Html, Response},
    Form,
};
use tracing::info;

use super::html::{self, escape, form, input, link, post_button, table};
use super::{found, parse_id, AdminError, AdminResult};
use crate::db::{DbError, GenreRepo};
use crate::server::AppState;
use crate::util::QueryParams;

fn genre_name(params: &QueryParams) -> AdminResult<String> {
    let name = params.text("name");
    if name.is_empty() {
        return Err(AdminError::bad_request("name is required"));
    }
    Ok(name)
}

fn genre_error(e: DbError) -> AdminError {
    AdminError::from_db(e, "genre not found", "a genre with this name already exists")
}

pub async fn list(State(state): State<AppState>) -> AdminResult<Html<String>> {
    let genres = state.db.list_genres().await?;
    let rows: Vec<Vec<String>> = genres
        .iter()
        .map(|g| {
            vec![
                g.id.to_string(),
                escape(&g.name),
                g.tmdb_id.map(|t| t.to_string()).unwrap_or_default(),
                format!(
                    "{} {}",
                    link(&format!("/admin/genres/{}/edit", g.id), "Edit"),
                    post_button(
                        &format!("/admin/genres/{}/delete", g.id),
                        "Delete",
                        "Delete this genre?"
                    )
                ),
            ]
        })
        .collect();

    let mut body = format!("<p>{}</p>\n", link("/admin/genres/new", "Add genre"));
    body.push_str(&table(&["ID", "Name", "TMDb ID", ""], &rows));
    Ok(html::page("Genres", &body))
}

pub async fn new_form() -> Html<String> {
    let body = form("/admin/genres", &input("Name", "text", "name", ""), "Create");
    html::page("New Genre", &body)
}

pub async fn create(
    State(state): State<AppState>,
    Form(params): Form<QueryParams>,
) -> AdminResult<Response> {
    let name = genre_name(&params)?;
    let genre = state.db.create_genre(&name).await.map_err(genre_error)?;
    info!("Genre created: {} (ID: {})", genre.name, genre.id);
    Ok(found("/admin/genres"))
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AdminResult<Html<String>> {
    let id = parse_id(&id)?;
    let genre = state.db.get_genre(id).await.map_err(genre_error)?;
    let body = form(
        &format!("/admin/genres/{}", genre.id),
        &input("Name", "text", "name", &genre.name),
        "Save",
    );
    Ok(html::page(&format!("Edit {}", genre.name), &body))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(params): Form<QueryParams>,
) -> AdminResult<Response> {
    let id = parse_id(&id)?;
    let name = genre_name(&params)?;
    let genre = state.db.update_genre(id, &name).await.map_err(genre_error)?;
    info!("Genre updated: {} (ID: {})", genre.name, genre.id);
    Ok(found("/admin/genres"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> AdminResult<Response> {
    let id = parse_id(&id)?;
    state.db.delete_genre(id).await.map_err(genre_error)?;
    info!("Genre deleted: {}", id);
    Ok(found("/admin/genres"))
}
