//! Hand-built HTML for the admin panel. Every dynamic value goes through
//! `escape`.

use axum::response::Html;

const ADMIN_STYLE: &str = r#"
* { box-sizing: border-box; }
body { font-family: system-ui, sans-serif; margin: 0; color: #222; background: #fafafa; }
nav { background: #1f2933; padding: .75rem 1.5rem; display: flex; gap: 1rem; align-items: center; }
nav a { color: #e4e7eb; text-decoration: none; }
nav form { margin-left: auto; }
main { max-width: 1100px; margin: 1.5rem auto; padding: 0 1.5rem; }
table { border-collapse: collapse; width: 100%; background: #fff; }
th, td { border-bottom: 1px solid #e4e7eb; padding: .5rem; text-align: left; vertical-align: top; }
form.inline { display: inline; }
label { display: block; margin-top: .75rem; font-weight: 600; }
input[type=text], input[type=email], input[type=password], input[type=date], input[type=number], textarea, select { width: 100%; padding: .4rem; }
textarea { min-height: 6rem; }
button, .button { margin-top: .75rem; padding: .4rem .9rem; background: #2563eb; color: #fff; border: 0; border-radius: 3px; cursor: pointer; text-decoration: none; display: inline-block; }
button.danger { background: #dc2626; }
.error { background: #fee2e2; border: 1px solid #fca5a5; padding: .75rem; margin-bottom: 1rem; }
.cards { display: flex; gap: 1rem; }
.card { background: #fff; border: 1px solid #e4e7eb; padding: 1rem 1.5rem; }
.card .count { font-size: 2rem; font-weight: bold; }
.genres label { display: inline-block; font-weight: normal; margin-right: 1rem; }
"#;

const TMDB_SCRIPT: &str = r#"
async function tmdbSearch(ev) {
  ev.preventDefault();
  const q = document.getElementById('q').value.trim();
  const out = document.getElementById('results');
  if (!q) { return; }
  out.textContent = 'Searching...';
  const res = await fetch('/admin/tmdb/api/search?q=' + encodeURIComponent(q));
  const body = await res.json();
  if (!res.ok) { out.textContent = body.error || 'Search failed'; return; }
  out.innerHTML = '';
  for (const m of body.results) {
    const row = document.createElement('tr');
    const title = document.createElement('td');
    title.textContent = m.title + (m.release_date ? ' (' + m.release_date.slice(0, 4) + ')' : '');
    const overview = document.createElement('td');
    overview.textContent = m.overview;
    const action = document.createElement('td');
    const btn = document.createElement('button');
    btn.textContent = 'Import';
    btn.onclick = () => tmdbImport(m.id, btn);
    action.appendChild(btn);
    row.append(title, overview, action);
    out.appendChild(row);
  }
}

async function tmdbImport(id, btn) {
  btn.disabled = true;
  const res = await fetch('/admin/tmdb/import', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ tmdb_id: id }),
  });
  const body = await res.json();
  if (res.ok) {
    btn.textContent = 'Imported';
    window.location = '/admin/movies/' + body.movie.id + '/edit';
  } else if (res.status === 409 && body.movie_id) {
    btn.textContent = 'Already in catalog';
  } else {
    btn.textContent = body.error || 'Import failed';
    btn.disabled = false;
  }
}
"#;

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn document(title: &str, nav: &str, body: &str, script: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{} - Cinemesh Admin</title>\
         <style>{}</style></head><body>\n{}<main>\n<h1>{}</h1>\n{}\n</main>{}</body></html>\n",
        escape(title),
        ADMIN_STYLE,
        nav,
        escape(title),
        body,
        script
    )
}

const NAV: &str = "<nav><a href=\"/admin\"><strong>Cinemesh</strong></a>\
    <a href=\"/admin/movies\">Movies</a><a href=\"/admin/genres\">Genres</a>\
    <a href=\"/admin/people\">People</a><a href=\"/admin/users\">Users</a>\
    <a href=\"/admin/tmdb/search\">TMDb import</a>\
    <form method=\"post\" action=\"/admin/logout\"><button type=\"submit\">Log out</button></form></nav>\n";

/// A page inside the signed-in admin layout.
pub fn page(title: &str, body: &str) -> Html<String> {
    Html(document(title, NAV, body, ""))
}

pub fn error_page(status: u16, message: &str) -> String {
    let body = format!(
        "<div class=\"error\">{}</div>\n<p><a href=\"javascript:history.back()\">Back</a> | \
         <a href=\"/admin\">Dashboard</a></p>",
        escape(message)
    );
    document(&format!("Error {}", status), NAV, &body, "")
}

pub fn login_page(error: Option<&str>, email: &str) -> String {
    let error = error
        .map(|e| format!("<div class=\"error\">{}</div>\n", escape(e)))
        .unwrap_or_default();
    let body = format!(
        "{}<form method=\"post\" action=\"/admin/login\">\n\
         <label>Email <input type=\"email\" name=\"email\" value=\"{}\" required></label>\n\
         <label>Password <input type=\"password\" name=\"password\" required></label>\n\
         <button type=\"submit\">Log in</button>\n</form>",
        error,
        escape(email)
    );
    document("Admin Login", "", &body, "")
}

pub fn tmdb_search_page() -> Html<String> {
    let body = "<form onsubmit=\"tmdbSearch(event)\">\n\
        <label>Title <input type=\"text\" id=\"q\" autofocus></label>\n\
        <button type=\"submit\">Search TMDb</button>\n</form>\n\
        <table><thead><tr><th>Title</th><th>Overview</th><th></th></tr></thead>\
        <tbody id=\"results\"></tbody></table>";
    let script = format!("<script>{}</script>", TMDB_SCRIPT);
    Html(document("Import from TMDb", NAV, body, &script))
}

pub fn input(label: &str, kind: &str, name: &str, value: &str) -> String {
    format!(
        "<label>{} <input type=\"{}\" name=\"{}\" value=\"{}\"></label>\n",
        escape(label),
        kind,
        name,
        escape(value)
    )
}

pub fn textarea(label: &str, name: &str, value: &str) -> String {
    format!(
        "<label>{} <textarea name=\"{}\">{}</textarea></label>\n",
        escape(label),
        name,
        escape(value)
    )
}

/// `options` are (value, label) pairs.
pub fn select(label: &str, name: &str, options: &[(String, String)], selected: &str) -> String {
    let mut out = format!("<label>{} <select name=\"{}\">\n", escape(label), name);
    for (value, text) in options {
        let sel = if value == selected { " selected" } else { "" };
        out.push_str(&format!(
            "<option value=\"{}\"{}>{}</option>\n",
            escape(value),
            sel,
            escape(text)
        ));
    }
    out.push_str("</select></label>\n");
    out
}

pub fn form(action: &str, fields: &str, submit: &str) -> String {
    format!(
        "<form method=\"post\" action=\"{}\">\n{}<button type=\"submit\">{}</button>\n</form>\n",
        escape(action),
        fields,
        escape(submit)
    )
}

/// A single-button POST form, for deletes.
pub fn post_button(action: &str, label: &str, confirm: &str) -> String {
    format!(
        "<form class=\"inline\" method=\"post\" action=\"{}\" onsubmit=\"return confirm('{}')\">\
         <button class=\"danger\" type=\"submit\">{}</button></form>",
        escape(action),
        escape(confirm),
        escape(label)
    )
}

/// Header and row cells are inserted as-is; escape text before passing it.
pub fn table<H: AsRef<str>>(headers: &[H], rows: &[Vec<String>]) -> String {
    let mut out = String::from("<table><thead><tr>");
    for h in headers {
        out.push_str(&format!("<th>{}</th>", h.as_ref()));
    }
    out.push_str("</tr></thead><tbody>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&format!("<td>{}</td>", cell));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</tbody></table>\n");
    out
}

pub fn link(href: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", escape(href), escape(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_select_marks_selected() {
        let options = vec![
            ("user".to_string(), "User".to_string()),
            ("admin".to_string(), "Admin".to_string()),
        ];
        let html = select("Role", "role", &options, "admin");
        assert!(html.contains("<option value=\"admin\" selected>Admin</option>"));
        assert!(html.contains("<option value=\"user\">User</option>"));
    }

    #[test]
    fn test_login_page_escapes_error() {
        let html = login_page(Some("<b>nope</b>"), "a@b.c");
        assert!(html.contains("&lt;b&gt;nope&lt;/b&gt;"));
        assert!(!html.contains("Log out"));
    }
}
