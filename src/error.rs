//! Crate-wide tagged error type.
//!
//! Every failure the core can produce is a typed variant carrying a stable
//! machine-readable code plus human-readable detail, so the HTTP boundary can
//! map each to a specific status without string matching. No variant
//! terminates the process; all errors are request-scoped.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

use crate::domain::redemption::Denial;

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Wire representation of an error.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Application error taxonomy.
///
/// - Conflict: [`AppError::AliasTaken`]
/// - Exhaustion: [`AppError::AllocationExhausted`], [`AppError::RateLimitReached`]
/// - Redemption denial: [`AppError::Denied`]
/// - Infrastructure: [`AppError::Internal`]
#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    NotFound { message: String, details: Value },
    AliasTaken { message: String, details: Value },
    AllocationExhausted { message: String, details: Value },
    RateLimitReached { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    Denied { reason: Denial },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn alias_taken(message: impl Into<String>, details: Value) -> Self {
        Self::AliasTaken {
            message: message.into(),
            details,
        }
    }

    pub fn allocation_exhausted(message: impl Into<String>, details: Value) -> Self {
        Self::AllocationExhausted {
            message: message.into(),
            details,
        }
    }

    pub fn rate_limited(message: impl Into<String>, details: Value) -> Self {
        Self::RateLimitReached {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// Splits the error into its response parts.
    fn parts(self) -> (StatusCode, ErrorInfo) {
        match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                ErrorInfo {
                    code: "validation_error",
                    message,
                    details,
                },
            ),
            AppError::NotFound { message, details } => (
                StatusCode::NOT_FOUND,
                ErrorInfo {
                    code: "not_found",
                    message,
                    details,
                },
            ),
            AppError::AliasTaken { message, details } => (
                StatusCode::CONFLICT,
                ErrorInfo {
                    code: "alias_taken",
                    message,
                    details,
                },
            ),
            AppError::AllocationExhausted { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorInfo {
                    code: "allocation_exhausted",
                    message,
                    details,
                },
            ),
            AppError::RateLimitReached { message, details } => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorInfo {
                    code: "rate_limit_reached",
                    message,
                    details,
                },
            ),
            AppError::Unauthorized { message, details } => (
                StatusCode::UNAUTHORIZED,
                ErrorInfo {
                    code: "unauthorized",
                    message,
                    details,
                },
            ),
            AppError::Denied { reason } => (
                denial_status(reason),
                ErrorInfo {
                    code: reason.code(),
                    message: reason.to_string(),
                    details: json!({}),
                },
            ),
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorInfo {
                    code: "internal_error",
                    message,
                    details,
                },
            ),
        }
    }

    /// Wire representation without consuming the response machinery.
    pub fn to_error_info(&self) -> ErrorInfo {
        match self {
            AppError::Validation { message, details } => ErrorInfo {
                code: "validation_error",
                message: message.clone(),
                details: details.clone(),
            },
            AppError::NotFound { message, details } => ErrorInfo {
                code: "not_found",
                message: message.clone(),
                details: details.clone(),
            },
            AppError::AliasTaken { message, details } => ErrorInfo {
                code: "alias_taken",
                message: message.clone(),
                details: details.clone(),
            },
            AppError::AllocationExhausted { message, details } => ErrorInfo {
                code: "allocation_exhausted",
                message: message.clone(),
                details: details.clone(),
            },
            AppError::RateLimitReached { message, details } => ErrorInfo {
                code: "rate_limit_reached",
                message: message.clone(),
                details: details.clone(),
            },
            AppError::Unauthorized { message, details } => ErrorInfo {
                code: "unauthorized",
                message: message.clone(),
                details: details.clone(),
            },
            AppError::Denied { reason } => ErrorInfo {
                code: reason.code(),
                message: reason.to_string(),
                details: json!({}),
            },
            AppError::Internal { message, details } => ErrorInfo {
                code: "internal_error",
                message: message.clone(),
                details: details.clone(),
            },
        }
    }
}

/// HTTP status for each redemption denial.
fn denial_status(reason: Denial) -> StatusCode {
    match reason {
        Denial::NotYetActive => StatusCode::FORBIDDEN,
        Denial::Expired | Denial::UsageLimitReached => StatusCode::GONE,
        Denial::PasswordRequired | Denial::PasswordIncorrect => StatusCode::UNAUTHORIZED,
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.to_error_info();
        write!(f, "{}: {}", info.code, info.message)
    }
}

impl std::error::Error for AppError {}

impl From<Denial> for AppError {
    fn from(reason: Denial) -> Self {
        AppError::Denied { reason }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error() {
            if db.is_unique_violation() {
                return AppError::alias_taken(
                    "Identifier already exists",
                    json!({ "constraint": db.constraint() }),
                );
            }
        }

        tracing::error!("Database error: {e}");
        AppError::internal("Database error", json!({}))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request(
            "Request validation failed",
            serde_json::to_value(e.field_errors()).unwrap_or_else(|_| json!({})),
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = self.parts();
        (status, Json(ErrorBody { error })).into_response()
    }
}
