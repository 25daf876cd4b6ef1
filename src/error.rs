//! Error types for the catalog server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;

use crate::validation::Violations;

/// Numeric error codes carried in every error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchItem = 5,
    BadValue = 18,
    QueueFull = 22,
}

/// Per-field messages, in the order the checks produced them
pub type FieldErrors = IndexMap<String, Vec<String>>;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Catalog rule violations (dates, copy accounting, uniqueness)
    #[error("Rule violation: {0}")]
    Rules(Violations),

    /// Field-level input errors (lengths, formats)
    #[error("Invalid input")]
    InvalidFields(FieldErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<Violations> for AppError {
    fn from(violations: Violations) -> Self {
        AppError::Rules(violations)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields = FieldErrors::new();
        for (field, errs) in errors.field_errors() {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", field))
                })
                .collect();
            fields.insert(field.to_string(), messages);
        }
        AppError::InvalidFields(fields)
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    /// Field name to messages, present on validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub fields: Option<FieldErrors>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut fields = None;
        let (status, code, message) = match self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NoSuchItem, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg),
            AppError::Rules(violations) => {
                fields = Some(violations.field_messages());
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::BadValue,
                    "Validation failed".to_string(),
                )
            }
            AppError::InvalidFields(errors) => {
                fields = Some(errors);
                (
                    StatusCode::BAD_REQUEST,
                    ErrorCode::BadValue,
                    "Invalid input".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorCode::QueueFull, msg)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            fields,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::EntityKind, validation::RuleViolation};

    #[test]
    fn test_rule_violations_map_to_bad_request() {
        let mut violations = Violations::default();
        violations.push(RuleViolation::InvalidCopyAccounting);

        let response = AppError::from(violations).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_duplicate_entity_is_bad_request() {
        let violation = RuleViolation::DuplicateEntity {
            kind: EntityKind::Genre,
            fields: vec!["name"],
        };
        let response = AppError::from(Violations::from(violation)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_errors_are_masked() {
        let response = AppError::Database(sqlx::Error::RowNotFound).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_unknown_user_is_not_found() {
        let response = AppError::NotFound("User with id 7 not found".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
