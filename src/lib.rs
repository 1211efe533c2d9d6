//! Content layer of the laboratory website: fetches entries from the content
//! API, resolves links between them, renders rich text to HTML and caches the
//! normalized result for an hour.

pub mod cache;
pub mod config;
pub mod content;
pub mod envelope;
pub mod fetch;
pub mod resolve;
pub mod rich_text;

pub use content::Content;
pub use fetch::FetchError;

/// Errors raised while setting up the content layer. Requests made through
/// [`Content`] fail only with [`FetchError`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to load config: {0}")]
    Config(config::Error),
    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("Failed to open cache store: {0}")]
    CacheStore(sqlx::Error),
}
