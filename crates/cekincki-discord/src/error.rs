//! Error types for cekincki-discord

use thiserror::Error;

/// Discord adapter errors
#[derive(Debug, Error)]
pub enum DiscordError {
    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success API response
    #[error("Discord API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Still rate limited after every retry
    #[error("Rate limited on {0}")]
    RateLimited(String),

    /// Interaction request failed verification
    #[error("Invalid interaction signature: {0}")]
    InvalidSignature(String),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DiscordError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscordError::Api { status: 404, .. })
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, DiscordError::Api { status: 403, .. })
    }
}

/// Result type for Discord operations
pub type DiscordResult<T> = Result<T, DiscordError>;
