pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use validator::ValidationErrors;

/// Body of every error response.
///
/// # JSON Example
///
/// ```json
/// {
///   "status": 409,
///   "error": "CONFLICT",
///   "message": "Email already exists: ada@example.com"
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// HTTP status code, repeated in the body
    pub status: u16,
    /// Machine-readable error identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Field-level validation errors, when there are any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: code.status().as_u16(),
            error: code.as_str().to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Application error type that can be converted to HTTP responses.
///
/// Domain crates convert their own errors into this type; the envelope and
/// status are decided here only.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("JSON extraction error: {0}")]
    JsonExtractorRejection(#[from] JsonRejection),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::JsonExtractorRejection(_) | AppError::ValidationError(_) | AppError::BadRequest(_) => {
                ErrorCode::BadRequest
            }
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::InternalServerError(_) => ErrorCode::InternalServerError,
            AppError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();

        let body = match self {
            AppError::JsonExtractorRejection(e) => {
                tracing::warn!(error = %code, "JSON extraction error: {}", e.body_text());
                ErrorResponse::new(code, e.body_text())
            }
            AppError::ValidationError(e) => {
                let message = validation_message(&e);
                tracing::info!(error = %code, %message, "Validation error");
                ErrorResponse::new(code, message).with_details(validation_details(&e))
            }
            AppError::BadRequest(msg) => {
                tracing::info!(error = %code, "Bad request: {}", msg);
                ErrorResponse::new(code, msg)
            }
            AppError::NotFound(msg) => {
                tracing::info!(error = %code, "Not found: {}", msg);
                ErrorResponse::new(code, msg)
            }
            AppError::Conflict(msg) => {
                tracing::info!(error = %code, "Conflict: {}", msg);
                ErrorResponse::new(code, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(error = %code, "Internal server error: {}", msg);
                ErrorResponse::new(code, msg)
            }
            AppError::ServiceUnavailable(msg) => {
                tracing::warn!(error = %code, "Service unavailable: {}", msg);
                ErrorResponse::new(code, msg)
            }
        };

        body.into_response()
    }
}

/// Join every field message into one line, ordered by field name.
///
/// Errors without a message fall back to `"<field>: <code>"`.
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{}: {}", field, err.code),
            })
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Field-keyed JSON description of validation failures.
pub fn validation_details(errors: &ValidationErrors) -> Value {
    let details = errors
        .field_errors()
        .iter()
        .map(|(field, errs)| {
            let entries: Vec<Value> = errs
                .iter()
                .map(|err| {
                    serde_json::json!({
                        "code": err.code,
                        "message": err.message,
                        "params": err.params,
                    })
                })
                .collect();
            (field.to_string(), Value::Array(entries))
        })
        .collect::<serde_json::Map<_, _>>();

    Value::Object(details)
}

/// Build an envelope response for `code` with a custom message.
///
/// # Example
///
/// ```rust,ignore
/// use axum_helpers::errors::{error_response, ErrorCode};
///
/// let response = error_response(ErrorCode::BadRequest, "Invalid id: abc");
/// ```
pub fn error_response(code: ErrorCode, message: impl Into<String>) -> Response {
    ErrorResponse::new(code, message).into_response()
}
