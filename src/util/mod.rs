mod query;
mod slug;

pub use query::QueryParams;
pub use slug::slugify;
