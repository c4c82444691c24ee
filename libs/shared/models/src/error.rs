use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Transport-facing error. Cells convert their own error enums into this, choosing a
/// stable machine-readable `code` so callers can render specific messages.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing identity: {0}")]
    Unauthenticated(String),

    #[error("Not Found: {1}")]
    NotFound(&'static str, String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Conflict: {1}")]
    Conflict(&'static str, String),

    #[error("Rule violation: {1}")]
    Rule(&'static str, String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(..) => StatusCode::CONFLICT,
            AppError::Rule(..) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::NotFound(code, _) | AppError::Conflict(code, _) | AppError::Rule(code, _) => {
                *code
            }
            AppError::BadRequest(_) => "bad_request",
            AppError::Unavailable(_) => "unavailable",
            AppError::Internal(_) => "internal",
        }
    }

    fn message(&self) -> &str {
        match self {
            AppError::Unauthenticated(msg)
            | AppError::BadRequest(msg)
            | AppError::Unavailable(msg)
            | AppError::Internal(msg) => msg,
            AppError::NotFound(_, msg) | AppError::Conflict(_, msg) | AppError::Rule(_, msg) => msg,
        }
    }
}

/// Extractor failures are the caller's fault unless axum reports a server-side cause.
fn extractor_rejection(status: StatusCode, message: String) -> AppError {
    if status.is_server_error() {
        AppError::Internal(message)
    } else {
        AppError::BadRequest(message)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        extractor_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        extractor_rejection(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        extractor_rejection(rejection.status(), rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self.message());
        } else {
            tracing::debug!("Rejected: {}: {}", status, self.message());
        }

        let body = Json(json!({
            "error": self.message(),
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}
