use axum::{extract::State, response::Html};

use crate::admin::html::escape;
use crate::server::AppState;

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Service health"),
    ("GET", "/api/public/movies?page=1&limit=20&search=&genre=", "Paginated movies, newest first"),
    ("GET", "/api/public/movies/:id", "Movie by id or slug, with genres and cast"),
    ("GET", "/api/public/genres", "All genres"),
    ("GET", "/api/public/genres/:id", "Genre by id or name, with its movies"),
    ("GET", "/api/public/people?page=1&limit=20&search=", "Paginated people"),
    ("GET", "/api/public/people/:id", "Person with filmography"),
    ("GET", "/api/public/search?q=", "Search movies, people and genres"),
    ("GET", "/api/public/stats", "Catalog counts"),
    ("POST", "/login", "Exchange email and password for a token"),
    ("GET", "/me", "Current user (Bearer token)"),
    ("POST", "/users", "Register a user"),
    ("GET", "/users/:id", "User by id"),
];

const DOCS_STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; color: #222; }
table { border-collapse: collapse; width: 100%; }
td, th { border-bottom: 1px solid #ddd; padding: .5rem; text-align: left; }
code { background: #f4f4f4; padding: .1rem .3rem; border-radius: 3px; }
.method { font-weight: bold; color: #0a6; }
"#;

pub fn render_docs(base_url: &str) -> String {
    let base = escape(base_url.trim_end_matches('/'));
    let mut rows = String::new();
    for (method, path, description) in ENDPOINTS {
        rows.push_str(&format!(
            "<tr><td class=\"method\">{}</td><td><code>{}{}</code></td><td>{}</td></tr>\n",
            method,
            base,
            escape(path),
            escape(description)
        ));
    }

    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>Cinemesh API</title>\
         <style>{}</style></head><body>\n<h1>Cinemesh API</h1>\n\
         <p>Public endpoints need no authentication. Responses are JSON; list endpoints \
         wrap results in <code>data</code> with a <code>pagination</code> block.</p>\n\
         <table><tr><th>Method</th><th>URL</th><th>Description</th></tr>\n{}</table>\n\
         <p><a href=\"{}/admin\">Admin panel</a></p>\n</body></html>\n",
        DOCS_STYLE, rows, base
    )
}

pub async fn docs(State(state): State<AppState>) -> Html<String> {
    Html(render_docs(state.config.base_url()))
}
