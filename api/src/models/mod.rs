pub mod bill;
pub mod bill_info;
pub mod category;
pub mod food;
pub mod table;
pub mod user;

use mongodb::bson::oid::ObjectId;

use crate::error::{AppError, AppResult};

/// Parses a hex document id coming from a path segment or a request body.
pub fn parse_id(raw: &str, what: &str) -> AppResult<ObjectId> {
    let trimmed = normalize_string(raw);
    ObjectId::parse_str(&trimmed)
        .map_err(|_| AppError::Validation(format!("Invalid {} id: {}", what, raw)))
}

/// Same as [`parse_id`] for optional body fields that are required by the operation.
pub fn require_id(raw: Option<&str>, what: &str) -> AppResult<ObjectId> {
    match raw {
        Some(value) if !value.trim().is_empty() => parse_id(value, what),
        _ => Err(AppError::Validation(format!("Missing {}", what))),
    }
}

/// Strips quote characters and surrounding whitespace from user supplied names.
pub fn normalize_string(raw: &str) -> String {
    raw.replace(['\'', '"'], "").trim().to_string()
}
