use regex::Regex;
use std::sync::OnceLock;

use crate::db::Role;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MAX_USERNAME_LEN: usize = 50;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MIN_PASSWORD_LEN: usize = 6;

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("bad email regex: {}", e))
    })
}

pub fn validate_username(username: &str) -> Result<(), String> {
    let len = username.chars().count();
    if len < MIN_USERNAME_LEN {
        return Err(format!("username must be at least {} characters", MIN_USERNAME_LEN));
    }
    if len > MAX_USERNAME_LEN {
        return Err(format!("username must be at most {} characters", MAX_USERNAME_LEN));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.chars().count() > MAX_EMAIL_LEN || !email_regex().is_match(email) {
        return Err("invalid email address".to_string());
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!("password must be at least {} characters", MIN_PASSWORD_LEN));
    }
    Ok(())
}

/// Blank means the default role.
pub fn parse_role(role: Option<&str>) -> Result<Role, String> {
    match role.map(str::trim).filter(|r| !r.is_empty()) {
        None => Ok(Role::default()),
        Some(r) => r
            .parse::<Role>()
            .map_err(|_| "role must be 'user' or 'admin'".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username() {
        assert!(validate_username("al").is_err());
        assert!(validate_username("alice").is_ok());
        assert!(validate_username(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("alice@localhost").is_err());
        assert!(validate_email("not an email").is_err());
        assert!(validate_email("").is_err());
    }

    #[test]
    fn test_password_and_role() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
        assert_eq!(parse_role(None), Ok(Role::User));
        assert_eq!(parse_role(Some("")), Ok(Role::User));
        assert_eq!(parse_role(Some("admin")), Ok(Role::Admin));
        assert!(parse_role(Some("owner")).is_err());
    }
}
