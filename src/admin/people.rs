use axum::{
    extract::{Path, State},
    response::{Html, Response},
    Form,
};
use chrono::NaiveDate;
use tracing::info;

use super::html::{self, escape, form, input, post_button, table, textarea};
use super::{found, parse_id, AdminError, AdminResult};
use crate::db::{NewPerson, PersonRepo};
use crate::server::AppState;
use crate::util::QueryParams;

pub fn parse_person_form(params: &QueryParams) -> AdminResult<NewPerson> {
    let name = params.text("name");
    if name.is_empty() {
        return Err(AdminError::bad_request("name is required"));
    }
    let birth_date = params
        .get_trimmed("birth_date")
        .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
        .transpose()
        .map_err(|_| AdminError::bad_request("invalid birth date"))?;

    Ok(NewPerson {
        name,
        biography: params.text("biography"),
        birth_date,
        profile_image_url: params.text("profile_image_url"),
        tmdb_id: None,
    })
}

pub async fn list(State(state): State<AppState>) -> AdminResult<Html<String>> {
    let people = state.db.list_all_people().await?;
    let rows: Vec<Vec<String>> = people
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                escape(&p.name),
                p.birth_date.map(|d| d.to_string()).unwrap_or_default(),
                p.tmdb_id.map(|t| t.to_string()).unwrap_or_default(),
                post_button(
                    &format!("/admin/people/{}/delete", p.id),
                    "Delete",
                    "Delete this person?",
                ),
            ]
        })
        .collect();

    let mut fields = input("Name", "text", "name", "");
    fields.push_str(&input("Birth date", "date", "birth_date", ""));
    fields.push_str(&input("Profile image URL", "text", "profile_image_url", ""));
    fields.push_str(&textarea("Biography", "biography", ""));

    let mut body = table(&["ID", "Name", "Born", "TMDb ID", ""], &rows);
    body.push_str("<h2>Add person</h2>\n");
    body.push_str(&form("/admin/people", &fields, "Create"));
    Ok(html::page("People", &body))
}

pub async fn create(
    State(state): State<AppState>,
    Form(params): Form<QueryParams>,
) -> AdminResult<Response> {
    let person = parse_person_form(&params)?;
    let person = state.db.create_person(&person).await.map_err(|e| {
        AdminError::from_db(e, "person not found", "this person already exists")
    })?;
    info!("Person created: {} (ID: {})", person.name, person.id);
    Ok(found("/admin/people"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> AdminResult<Response> {
    let id = parse_id(&id)?;
    state.db.soft_delete_person(id).await.map_err(|e| {
        AdminError::from_db(e, "person not found", "person already exists")
    })?;
    info!("Person soft-deleted: {}", id);
    Ok(found("/admin/people"))
}
