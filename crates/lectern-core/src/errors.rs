//! Application error type shared by every layer of the API.
//!
//! Every failure carries a stable [`ErrorKind`] alongside the HTTP status it
//! maps to. Handlers return `Result<_, AppError>` and axum renders the error
//! as `{"kind": ..., "message": ...}`.
//!
//! Infrastructure errors keep their full cause chain for the logs but only
//! ever show a generic message to the caller.

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

const INFRASTRUCTURE_MESSAGE: &str = "Service temporarily unavailable";

/// Stable error taxonomy exposed to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing, invalid or expired credential. Never says which.
    Unauthenticated,
    /// Valid principal lacking the role or ownership required.
    Forbidden,
    /// Resource absent, or present under a different parent.
    NotFound,
    /// Operation would break a uniqueness or idempotency rule.
    Conflict,
    /// Malformed input.
    Validation,
    /// Store unavailable or timed out. Retryable.
    Infrastructure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unauthenticated => "unauthenticated",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Validation => "validation",
            ErrorKind::Infrastructure => "infrastructure",
        }
    }
}

/// Wire shape of an error body, for API documentation.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub status: StatusCode,
    pub error: Error,
}

impl AppError {
    pub fn new<E>(kind: ErrorKind, status: StatusCode, err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            kind,
            status,
            error: err.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Unauthenticated,
            StatusCode::UNAUTHORIZED,
            anyhow::anyhow!(message.into()),
        )
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Forbidden,
            StatusCode::FORBIDDEN,
            anyhow::anyhow!(message.into()),
        )
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::NotFound,
            StatusCode::NOT_FOUND,
            anyhow::anyhow!(message.into()),
        )
    }

    /// Conflicts are reported as 400 to stay compatible with existing clients.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::Conflict,
            StatusCode::BAD_REQUEST,
            anyhow::anyhow!(message.into()),
        )
    }

    pub fn unprocessable<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Validation, StatusCode::UNPROCESSABLE_ENTITY, err)
    }

    pub fn bad_request<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(ErrorKind::Validation, StatusCode::BAD_REQUEST, err)
    }

    pub fn infrastructure<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self::new(
            ErrorKind::Infrastructure,
            StatusCode::SERVICE_UNAVAILABLE,
            err,
        )
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// Message safe to show to the caller.
    pub fn public_message(&self) -> String {
        match self.kind {
            ErrorKind::Infrastructure => INFRASTRUCTURE_MESSAGE.to_string(),
            _ => self.error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.kind == ErrorKind::Infrastructure {
            tracing::error!(error = ?self.error, "Infrastructure failure");
        }

        let body = Json(json!({
            "kind": self.kind,
            "message": self.public_message(),
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::infrastructure(err)
    }
}
