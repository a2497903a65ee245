pub mod docs;
pub mod handlers;
pub mod pagination;
