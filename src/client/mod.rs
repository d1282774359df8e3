//! Typed client for the book service

mod error;
mod http;
mod traits;

pub use error::{ApiError, ApiResult};
pub use http::HttpBookService;
pub use traits::BookService;
