//! The app level error type and its mapping onto HTTP responses.
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::repo::RepoError;

/// Message used whenever a required field is absent or blank.
pub const MISSING_INPUT: &str = "Forgot to enter something!";

/// The errors a request handler may end with.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The client sent missing or invalid input. Every message is returned in the body.
    #[error("invalid input: {0:?}")]
    Validation(Vec<String>),

    /// No credentials were presented to a route that requires them.
    #[error("authentication credentials were not provided")]
    NotAuthenticated,

    /// Credentials were presented but could not be accepted, or an anonymous
    /// caller tried to change a record.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but does not own the target record.
    #[error("you do not have permission to perform this action")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Repo(#[from] RepoError),

    /// Anything unexpected, e.g. a hashing or token signing failure.
    ///
    /// The error is logged on the server and never shown to the client.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(vec![message.into()])
    }

    pub fn missing_input() -> Self {
        Self::validation(MISSING_INPUT)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotAuthenticated | AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Repo(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(_) => AppError::missing_input(),
            other => AppError::validation(other.body_text()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Validation(messages) => (status, Json(messages)).into_response(),
            AppError::Repo(e) => {
                error!(error = %e, "repository error");
                internal_response()
            }
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                internal_response()
            }
            other => (status, Json(json!({ "detail": other.to_string() }))).into_response(),
        }
    }
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "detail": "internal server error" })),
    )
        .into_response()
}
