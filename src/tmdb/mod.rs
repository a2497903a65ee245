pub mod client;
pub mod convert;
pub mod import;
pub mod types;

pub use client::{ImageUrls, TmdbClient, TmdbError};
pub use convert::{convert_movie, ConvertedMovie};
pub use import::{import_movie, ImportError, MovieSource};
