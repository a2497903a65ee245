pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use jwt::{Claims, JwtKeys};
pub use middleware::{AuthUser, MaybeAuthUser, TOKEN_COOKIE};
pub use password::{hash_password, verify_password};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
