pub mod handlers;
pub mod validate;
