//! Error types for cekincki-sheets

use std::path::PathBuf;
use thiserror::Error;

/// Spreadsheet access errors
#[derive(Debug, Error)]
pub enum SheetsError {
    /// No credential source configured
    #[error(
        "No Google credentials configured. Set GCP_CREDENTIALS_PATH \
         (or GOOGLE_APPLICATION_CREDENTIALS) to a Service Account key JSON, \
         or set GCP_CREDENTIALS_JSON."
    )]
    NoCredentials,

    /// Configured key file does not exist
    #[error("Google credentials file not found at {}", .0.display())]
    CredentialsNotFound(PathBuf),

    /// Key JSON is not a usable service account key
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Token exchange failed
    #[error("Google auth failed: {0}")]
    Auth(String),

    /// JWT signing failed
    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the Sheets API
    #[error("Sheets API error: {status} - {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body
        message: String,
    },

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for spreadsheet operations
pub type SheetsResult<T> = Result<T, SheetsError>;
