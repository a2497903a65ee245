use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AuthError;
use crate::config::AuthConfig;
use crate::db::{Role, User};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub user_id: i64,
    pub email: String,
    pub role: Role,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Signing and verification keys for session tokens (HS256).
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, lifetime_hours: u32) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime: Duration::hours(i64::from(lifetime_hours)),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_expires_hours)
    }

    /// Token lifetime in seconds, also used as the cookie Max-Age.
    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime.num_seconds()
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id,
            email: user.email.clone(),
            role: user.role,
            sub: user.id.to_string(),
            iat: now.timestamp(),
            exp: (now + self.lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> User {
        let now = Utc::now();
        User {
            id: 42,
            username: "carol".to_string(),
            email: "carol@example.com".to_string(),
            password_hash: String::new(),
            avatar_url: String::new(),
            role,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = JwtKeys::new("test-secret", 24);
        let token = keys.issue(&user(Role::Admin)).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "42");
        assert!(claims.is_admin());
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
        assert_eq!(keys.lifetime_secs(), 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtKeys::new("one", 1).issue(&user(Role::User)).unwrap();
        assert!(JwtKeys::new("two", 1).verify(&token).is_err());
        assert!(JwtKeys::new("one", 1).verify("not-a-token").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = JwtKeys::new("secret", 1);
        let past = Utc::now() - Duration::hours(2);
        let claims = Claims {
            user_id: 1,
            email: "old@example.com".to_string(),
            role: Role::User,
            sub: "1".to_string(),
            iat: past.timestamp(),
            exp: (past + Duration::hours(1)).timestamp(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
