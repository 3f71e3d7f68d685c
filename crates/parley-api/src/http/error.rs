//! Application error type mapping to HTTP status codes and envelope format.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use parley_types::error::{ChatError, RepositoryError, UserError};
use serde_json::json;

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    Chat(ChatError),
    User(UserError),
    /// Missing or unknown API key.
    Unauthorized(String),
    /// Malformed request input caught before reaching a service.
    Validation(String),
    Internal(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<UserError> for AppError {
    fn from(e: UserError) -> Self {
        AppError::User(e)
    }
}

impl AppError {
    /// Status, machine code, message and optional details for the envelope.
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::Chat(ChatError::NotFound(what)) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", format!("{what} not found"), None)
            }
            AppError::Chat(ChatError::Forbidden) => (
                StatusCode::FORBIDDEN,
                "FORBIDDEN",
                "Conversation belongs to another user".to_string(),
                None,
            ),
            AppError::Chat(ChatError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Chat(ChatError::Gateway(e)) => (
                StatusCode::BAD_GATEWAY,
                "GATEWAY_ERROR",
                format!("Reply generation failed: {e}"),
                Some(json!({ "content_changed": false })),
            ),
            AppError::Chat(ChatError::PartialFailure { message, source }) => {
                let details = Some(json!({ "content_changed": true, "message": message }));
                match source.gateway_error() {
                    Some(cause) => (
                        StatusCode::BAD_GATEWAY,
                        "PARTIAL_FAILURE",
                        format!("Message saved but reply generation failed: {cause}"),
                        details,
                    ),
                    None => {
                        tracing::error!(error = %source, "Failure after message was saved");
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "PARTIAL_FAILURE",
                            "Message saved but the reply could not be stored".to_string(),
                            details,
                        )
                    }
                }
            }
            AppError::Chat(ChatError::Repository(RepositoryError::Conflict(msg))) => {
                (StatusCode::CONFLICT, "CONFLICT", msg.clone(), None)
            }
            AppError::Chat(ChatError::Repository(e)) => {
                tracing::error!(error = %e, "Storage failure while serving request");
                internal("Internal storage error")
            }
            AppError::User(UserError::NotFound) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", "User not found".to_string(), None)
            }
            AppError::User(UserError::InvalidEmail(email)) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                format!("Invalid email: '{email}'"),
                None,
            ),
            AppError::User(UserError::EmailTaken(email)) => (
                StatusCode::CONFLICT,
                "CONFLICT",
                format!("Email '{email}' is already registered"),
                None,
            ),
            AppError::User(UserError::StorageError(e)) => {
                tracing::error!(error = %e, "Storage failure while serving request");
                internal("Internal storage error")
            }
            AppError::Unauthorized(msg) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone(), None)
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error while serving request");
                internal("Internal server error")
            }
        }
    }
}

fn internal(message: &str) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        message.to_string(),
        None,
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = self.parts();
        (status, Json(ApiResponse::error(code, &message, details))).into_response()
    }
}
