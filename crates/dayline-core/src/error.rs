//! Error types for dayline-core

use thiserror::Error;

/// Main error type for dayline-core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Login already taken: {0}")]
    LoginTaken(String),

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("{0}")]
    Other(String),
}

/// Rejections raised when user input is checked before it reaches the planner
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Date must use the YYYY-MM-DD format (e.g. 2025-09-20): {0}")]
    InvalidDate(String),

    #[error("Task title is required")]
    MissingTitle,

    #[error("Time must use the HH:MM format: {0}")]
    InvalidTime(String),

    #[error("End time must be later than start time")]
    EndNotAfterStart,

    #[error("Weekly tasks need a weekday (mon, tue, wed, thu, fri, sat, sun): {0}")]
    InvalidWeekday(String),

    #[error("A task is either weekly or on a date, not both")]
    DatedWeekly,

    #[error("Login and password are required")]
    MissingCredentials,
}

/// Result type alias for dayline-core
pub type Result<T> = std::result::Result<T, Error>;

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::Other(format!("Store lock poisoned: {}", e))
    }
}
