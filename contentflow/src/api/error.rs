//! Error responses for the HTTP layer.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{error, warn};

use crate::core::TaskStatus;
use crate::errors::{ContentflowError, PersistenceError, ValidationError};

/// JSON body of every error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Human readable summary.
    pub message: String,
    /// HTTP status code.
    pub status: u16,
    /// When the error was produced.
    pub timestamp: DateTime<Utc>,
    /// Field name to message, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, String>>,
}

/// Failures a handler can answer with.
///
/// The `Display` text is the `message` of the response body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The body failed field validation.
    #[error("Validation failed")]
    Validation(#[from] ValidationError),
    /// The body could not be read as JSON.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),
    /// The endpoint needs a caller and none was given.
    #[error("Authentication required")]
    Unauthenticated,
    /// The caller is not known to the content store.
    #[error("User not found")]
    UnknownUser(String),
    /// No task with this id.
    #[error("Task not found: {0}")]
    TaskNotFound(String),
    /// The task has not completed.
    #[error("Task {task_id} is not completed (status: {status})")]
    TaskNotCompleted {
        /// Task id.
        task_id: String,
        /// Its current status.
        status: TaskStatus,
    },
    /// No content with this id belongs to the caller.
    #[error("Content not found: {0}")]
    ContentNotFound(i64),
    /// The task completed but carries no result.
    #[error("Task {0} completed without a result")]
    MissingResult(String),
    /// Anything else. The reason is logged, never returned.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_)
            | Self::MalformedBody(_)
            | Self::UnknownUser(_)
            | Self::TaskNotCompleted { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::TaskNotFound(_) | Self::ContentNotFound(_) => StatusCode::NOT_FOUND,
            Self::MissingResult(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ContentflowError> for ApiError {
    fn from(err: ContentflowError) -> Self {
        match err {
            ContentflowError::Validation(err) => Self::Validation(err),
            ContentflowError::Persistence(PersistenceError::UserNotFound { email }) => {
                Self::UnknownUser(email)
            }
            ContentflowError::Persistence(PersistenceError::ContentNotFound { id }) => {
                Self::ContentNotFound(id)
            }
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            Self::Internal(reason) => error!(error = %reason, "Request failed"),
            Self::MissingResult(task_id) => {
                error!(task_id = %task_id, "Completed task has no result");
            }
            Self::Validation(err) => warn!(errors = ?err.field_errors, "Validation error"),
            other => warn!(status = status.as_u16(), "{other}"),
        }

        let body = ErrorResponse {
            message: self.to_string(),
            status: status.as_u16(),
            timestamp: Utc::now(),
            details: match self {
                Self::Validation(err) => Some(err.field_errors),
                _ => None,
            },
        };
        (status, Json(body)).into_response()
    }
}
