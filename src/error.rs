//! Error types for catalog fetching and parsing

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to fetch {url}: {status}")]
    UpstreamStatus { url: String, status: StatusCode },

    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Unknown charset: {0}")]
    UnknownCharset(String),
}

impl CatalogError {
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
