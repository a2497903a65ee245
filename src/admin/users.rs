use axum::{
    extract::{Path, State},
    response::{Html, Response},
    Form,
};
use tracing::info;

use super::html::{self, escape, form, input, link, post_button, select, table};
use super::{found, parse_id, AdminError, AdminResult};
use crate::auth::hash_password;
use crate::db::{DbError, NewUser, Role, UserRepo, UserUpdate};
use crate::server::AppState;
use crate::users::validate::*;
use crate::util::QueryParams;

struct UserForm {
    username: String,
    email: String,
    role: Role,
    password: Option<String>,
}

/// A blank password is only allowed when editing.
fn parse_user_form(params: &QueryParams, password_required: bool) -> AdminResult<UserForm> {
    let username = params.text("username");
    let email = params.text("email");
    validate_username(&username).map_err(AdminError::bad_request)?;
    validate_email(&email).map_err(AdminError::bad_request)?;
    let role = parse_role(params.get("role")).map_err(AdminError::bad_request)?;

    let password = params
        .get("password")
        .filter(|p| !p.is_empty())
        .map(str::to_string);
    match password {
        Some(ref p) => validate_password(p).map_err(AdminError::bad_request)?,
        None if password_required => {
            return Err(AdminError::bad_request("password is required"));
        }
        None => {}
    }

    Ok(UserForm {
        username,
        email,
        role,
        password,
    })
}

fn user_error(e: DbError) -> AdminError {
    AdminError::from_db(
        e,
        "user not found",
        "user with this email or username already exists",
    )
}

fn user_fields(username: &str, email: &str, role: Role, password_hint: &str) -> String {
    let roles = vec![
        ("user".to_string(), "User".to_string()),
        ("admin".to_string(), "Admin".to_string()),
    ];
    let mut fields = input("Username", "text", "username", username);
    fields.push_str(&input("Email", "email", "email", email));
    fields.push_str(&input(password_hint, "password", "password", ""));
    fields.push_str(&select("Role", "role", &roles, role.as_str()));
    fields
}

pub async fn list(State(state): State<AppState>) -> AdminResult<Html<String>> {
    let users = state.db.list_users().await?;
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.id.to_string(),
                escape(&u.username),
                escape(&u.email),
                u.role.to_string(),
                u.created_at.format("%Y-%m-%d").to_string(),
                format!(
                    "{} {}",
                    link(&format!("/admin/users/{}/edit", u.id), "Edit"),
                    post_button(
                        &format!("/admin/users/{}/delete", u.id),
                        "Delete",
                        "Delete this user?"
                    )
                ),
            ]
        })
        .collect();

    let mut body = format!("<p>{}</p>\n", link("/admin/users/new", "Add user"));
    body.push_str(&table(
        &["ID", "Username", "Email", "Role", "Created", ""],
        &rows,
    ));
    Ok(html::page("Users", &body))
}

pub async fn new_form() -> Html<String> {
    let body = form(
        "/admin/users",
        &user_fields("", "", Role::User, "Password"),
        "Create",
    );
    html::page("New User", &body)
}

pub async fn create(
    State(state): State<AppState>,
    Form(params): Form<QueryParams>,
) -> AdminResult<Response> {
    let submitted = parse_user_form(&params, true)?;
    let password = submitted.password.unwrap_or_default();
    let new_user = NewUser {
        username: submitted.username,
        email: submitted.email,
        password_hash: hash_password(&password).await?,
        role: submitted.role,
    };
    let user = state.db.create_user(&new_user).await.map_err(user_error)?;
    info!("User created by admin: {} (ID: {})", user.email, user.id);
    Ok(found("/admin/users"))
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AdminResult<Html<String>> {
    let id = parse_id(&id)?;
    let user = state.db.get_user_by_id(id).await.map_err(user_error)?;
    let body = form(
        &format!("/admin/users/{}", user.id),
        &user_fields(
            &user.username,
            &user.email,
            user.role,
            "Password (blank keeps current)",
        ),
        "Save",
    );
    Ok(html::page(&format!("Edit {}", user.username), &body))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(params): Form<QueryParams>,
) -> AdminResult<Response> {
    let id = parse_id(&id)?;
    let submitted = parse_user_form(&params, false)?;
    let password_hash = match submitted.password {
        Some(ref p) => Some(hash_password(p).await?),
        None => None,
    };
    let update = UserUpdate {
        username: submitted.username,
        email: submitted.email,
        role: submitted.role,
        password_hash,
    };
    let user = state.db.update_user(id, &update).await.map_err(user_error)?;
    info!("User updated: {} (ID: {})", user.email, user.id);
    Ok(found("/admin/users"))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> AdminResult<Response> {
    let id = parse_id(&id)?;
    state.db.delete_user(id).await.map_err(user_error)?;
    info!("User deleted: {}", id);
    Ok(found("/admin/users"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_rules() {
        let params = QueryParams::from_pairs([
            ("username", "dave"),
            ("email", "dave@example.com"),
            ("password", ""),
            ("role", "admin"),
        ]);
        assert_eq!(
            parse_user_form(&params, true).err().map(|e| e.message),
            Some("password is required".to_string())
        );
        let form = parse_user_form(&params, false).unwrap();
        assert!(form.password.is_none());
        assert_eq!(form.role, Role::Admin);

        let params = QueryParams::from_pairs([
            ("username", "dave"),
            ("email", "dave@example.com"),
            ("password", "123"),
        ]);
        assert!(parse_user_form(&params, false).is_err());
    }
}
