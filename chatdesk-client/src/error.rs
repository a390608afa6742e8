//! Error type for client operations

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(String),

    /// Bearer strategy with nothing in the token store; the request was not sent
    #[error("No credential stored, redirected to login")]
    MissingCredential,

    /// The backend answered 401
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    /// `success: false` inside a successful response
    #[error("{0}")]
    Backend(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] chatdesk_core::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
