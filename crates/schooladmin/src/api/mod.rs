//! Data-access layer for the remote school administration API.

mod cache;
mod client;
mod error;
mod types;

pub use cache::{CacheStats, SessionKey};
pub use client::{ApiClient, AuthorizedClient};
pub use error::ApiError;
pub use types::ClassInfo;
