//! Application errors and their HTTP mapping.
//!
//! | variant | status |
//! |---------|--------|
//! | `NotFound`, `TableInUse`, `MissingField`, `InsufficientStock` | 404 |
//! | `Conflict` | 409 |
//! | `Validation` | 400 |
//! | `Internal` | 500 |
//!
//! `TableInUse`, `MissingField` and `InsufficientStock` answer 404 to keep the status
//! codes existing clients already handle.

use rocket::http::Status;

use crate::repository::RepoError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Table is in use: {0}")]
    TableInUse(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Missing field: {0}")]
    MissingField(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers that do not care about wire details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Validation,
    InsufficientStock,
    Internal,
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::NotFound(_)
            | AppError::TableInUse(_)
            | AppError::MissingField(_)
            | AppError::InsufficientStock(_) => Status::NotFound,
            AppError::Conflict(_) => Status::Conflict,
            AppError::Validation(_) => Status::BadRequest,
            AppError::Internal(_) => Status::InternalServerError,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) | AppError::TableInUse(_) => ErrorKind::Conflict,
            AppError::Validation(_) | AppError::MissingField(_) => ErrorKind::Validation,
            AppError::InsufficientStock(_) => ErrorKind::InsufficientStock,
            AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wraps a failure that happened after earlier writes of the same operation
    /// were already applied. Nothing is undone; the message names what was kept.
    pub fn partial(applied: &str, err: impl std::fmt::Display) -> Self {
        AppError::Internal(format!("{} but the operation stopped: {}", applied, err))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Duplicate(msg) => AppError::Conflict(msg),
            RepoError::Database(msg) => AppError::Internal(msg),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
