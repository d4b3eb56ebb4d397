//! Error handling for the SARA inventory backend
//!
//! Every failure is rendered as `{ "error": { "code", "message", "field"? } }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Postgres SQLSTATE for unique constraint violations
const UNIQUE_VIOLATION: &str = "23505";

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Duplicate entry: {0}")]
    DuplicateName(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Out of stock: {0}")]
    OutOfStock(String),

    #[error("Validation error on {field}: {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Upload contains no rows")]
    EmptyUpload,

    #[error("Malformed CSV: {0}")]
    MalformedCsv(String),

    #[error("User already has a password")]
    AlreadyHasPassword,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::ValidationFailed {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::DuplicateName(_) | AppError::AlreadyHasPassword => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::OutOfStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ValidationFailed { .. }
            | AppError::EmptyUpload
            | AppError::MalformedCsv(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) | AppError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let field = db_err
                    .constraint()
                    .and_then(constraint_field)
                    .unwrap_or("name");
                return AppError::DuplicateName(field.to_string());
            }
        }
        AppError::Database(err)
    }
}

/// Column named by a default Postgres unique constraint, `<table>_<column>_key`
fn constraint_field(constraint: &str) -> Option<&str> {
    constraint.strip_suffix("_key")?.rsplit('_').next()
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // HashMap order is unstable; report the alphabetically first field
        let first = errors
            .field_errors()
            .into_iter()
            .min_by_key(|(field, _)| *field)
            .map(|(field, errs)| {
                let reason = errs
                    .first()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .unwrap_or_else(|| "invalid".to_string());
                (field.to_string(), reason)
            });

        match first {
            Some((field, reason)) => AppError::ValidationFailed { field, reason },
            None => AppError::validation("request", "invalid"),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }

    fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_detail = match &self {
            AppError::DuplicateName(field) => {
                ErrorDetail::new("DUPLICATE_NAME", format!("A record with this {} already exists", field))
                    .with_field(field.clone())
            }
            AppError::NotFound(resource) => {
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource))
            }
            AppError::OutOfStock(code) => ErrorDetail::new(
                "OUT_OF_STOCK",
                format!("Item {} does not have enough remaining units", code),
            ),
            AppError::ValidationFailed { field, reason } => {
                ErrorDetail::new("VALIDATION_ERROR", reason.clone()).with_field(field.clone())
            }
            AppError::Unauthorized(message) => ErrorDetail::new("UNAUTHORIZED", message.clone()),
            AppError::EmptyUpload => {
                ErrorDetail::new("EMPTY_UPLOAD", "The uploaded file contains no items")
            }
            AppError::MalformedCsv(msg) => {
                ErrorDetail::new("MALFORMED_CSV", format!("Could not read CSV upload: {}", msg))
            }
            AppError::AlreadyHasPassword => {
                ErrorDetail::new("ALREADY_HAS_PASSWORD", "User already has a password")
            }
            AppError::InvalidCredentials => {
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid email or password")
            }
            AppError::Database(_) => ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            AppError::Internal(msg) => ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            AppError::InternalError(_) => {
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred")
            }
        };

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
