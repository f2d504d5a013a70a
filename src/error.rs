//! Error types for gigboard
//!
//! Handlers and queries return [`Result`]; the router turns the error into
//! the matching status page.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Row or route that does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database connection, query or constraint errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Template missing or unreadable
    #[error("Template error: {0}")]
    Template(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP server error: {0}")]
    Http(String),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// HTTP status this error is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            _ => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
