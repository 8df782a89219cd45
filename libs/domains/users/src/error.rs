use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("User not found with email: {0}")]
    EmailNotFound(String),

    #[error("User list is empty")]
    EmptyList,

    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Internal(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        UserError::Internal(err.to_string())
    }
}

/// Convert UserError to AppError for standardized error responses
impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(_) | UserError::EmailNotFound(_) | UserError::EmptyList => {
                AppError::NotFound(err.to_string())
            }
            UserError::DuplicateEmail(_) => AppError::Conflict(err.to_string()),
            UserError::Validation(errors) => AppError::ValidationError(errors),
            UserError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (UserError::NotFound(7), StatusCode::NOT_FOUND),
            (UserError::EmailNotFound("a@b.io".into()), StatusCode::NOT_FOUND),
            (UserError::EmptyList, StatusCode::NOT_FOUND),
            (UserError::DuplicateEmail("a@b.io".into()), StatusCode::CONFLICT),
            (UserError::Validation(ValidationErrors::new()), StatusCode::BAD_REQUEST),
            (UserError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_messages() {
        assert_eq!(UserError::NotFound(7).to_string(), "User not found: 7");
        assert_eq!(UserError::EmptyList.to_string(), "User list is empty");
        assert_eq!(
            UserError::DuplicateEmail("ada@example.com".into()).to_string(),
            "Email already exists: ada@example.com"
        );
    }
}
