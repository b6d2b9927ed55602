use thiserror::Error;

/// Common error type for Cistern dashboard components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Query failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode query response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(String),
}

impl Error {
    /// Create a URL error.
    pub fn url(msg: impl Into<String>) -> Self {
        Self::Url(msg.into())
    }
}

/// Result type alias using Cistern's Error.
pub type Result<T> = std::result::Result<T, Error>;
