//! The JSON envelope every endpoint answers with:
//! `{ message, status: "Success" | "Failed", error, [count], <key>: entity | [entities] }`.

use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, ErrorKind};

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    One(Value),
    Many(Vec<Value>),
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: Status,
    message: String,
    error: String,
    key: &'static str,
    payload: Payload,
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize response payload");
        Value::Null
    })
}

impl ApiResponse {
    pub fn ok<T: Serialize>(message: impl Into<String>, key: &'static str, value: &T) -> Self {
        ApiResponse {
            status: Status::Ok,
            message: message.into(),
            error: String::new(),
            key,
            payload: Payload::One(to_value(value)),
        }
    }

    pub fn created<T: Serialize>(message: impl Into<String>, key: &'static str, value: &T) -> Self {
        ApiResponse {
            status: Status::Created,
            ..ApiResponse::ok(message, key, value)
        }
    }

    pub fn list<T: Serialize>(message: impl Into<String>, key: &'static str, items: &[T]) -> Self {
        ApiResponse {
            status: Status::Ok,
            message: message.into(),
            error: String::new(),
            key,
            payload: Payload::Many(items.iter().map(to_value).collect()),
        }
    }

    pub fn failed(message: impl Into<String>, key: &'static str, err: &AppError) -> Self {
        Self::log_failure(err);
        ApiResponse {
            status: err.status(),
            message: message.into(),
            error: err.to_string(),
            key,
            payload: Payload::One(Value::Object(Map::new())),
        }
    }

    pub fn failed_list(message: impl Into<String>, key: &'static str, err: &AppError) -> Self {
        Self::log_failure(err);
        ApiResponse {
            status: err.status(),
            message: message.into(),
            error: err.to_string(),
            key,
            payload: Payload::Many(Vec::new()),
        }
    }

    /// Envelope without an entity, used by the catchers.
    pub fn bare(status: Status, message: impl Into<String>, error: impl Into<String>) -> Self {
        ApiResponse {
            status,
            message: message.into(),
            error: error.into(),
            key: "result",
            payload: Payload::One(Value::Object(Map::new())),
        }
    }

    fn log_failure(err: &AppError) {
        match err.kind() {
            ErrorKind::Internal => tracing::error!(error = %err, "request failed"),
            kind => tracing::debug!(error = %err, ?kind, "request rejected"),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn body(&self) -> Value {
        let mut body = Map::new();
        body.insert("message".into(), Value::String(self.message.clone()));
        let tag = if self.status.class().is_success() { "Success" } else { "Failed" };
        body.insert("status".into(), Value::String(tag.into()));
        body.insert("error".into(), Value::String(self.error.clone()));
        match &self.payload {
            Payload::One(value) => {
                body.insert(self.key.into(), value.clone());
            }
            Payload::Many(values) => {
                body.insert("count".into(), Value::from(values.len()));
                body.insert(self.key.into(), Value::Array(values.clone()));
            }
        }
        Value::Object(body)
    }
}

impl<'r> Responder<'r, 'static> for ApiResponse {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status;
        (status, Json(self.body())).respond_to(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_envelope() {
        let response = ApiResponse::created("Create bill successfully", "bill", &json!({ "_id": "1" }));
        assert_eq!(response.status(), Status::Created);
        assert_eq!(
            response.body(),
            json!({
                "message": "Create bill successfully",
                "status": "Success",
                "error": "",
                "bill": { "_id": "1" }
            })
        );
    }

    #[test]
    fn failed_list_degrades_to_empty() {
        let err = AppError::Internal("connection reset".into());
        let body = ApiResponse::failed_list("Get list bill failed", "bills", &err).body();
        assert_eq!(body["status"], "Failed");
        assert_eq!(body["count"], 0);
        assert_eq!(body["bills"], json!([]));
        assert_eq!(body["error"], "Internal server error: connection reset");
    }

    #[test]
    fn failed_entity_is_empty_object() {
        let err = AppError::NotFound("bill".into());
        let response = ApiResponse::failed("Bill not found", "bill", &err);
        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(response.body()["bill"], json!({}));
    }
}
