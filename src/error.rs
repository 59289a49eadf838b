//! Error types shared by the store, views and server

use thiserror::Error;

/// Errors raised by blog operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Whether this error means the caller asked for something absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::InvalidFilter(_))
    }
}
