use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::domain::error::StorageError;
use crate::domain::post::Post;
use crate::presentation::http::response::write_empty;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed { method: Method, path: String },

    #[error("no handler bound to {method} {path}")]
    MissingHandler { method: Method, path: String },

    #[error("failed to read request body: {0}")]
    RequestBody(#[source] axum::Error),

    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("request body is empty")]
    EmptyBody,

    #[error("failed to decode request body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("failed to {operation} posts: {source}")]
    Storage {
        operation: &'static str,
        payload: Option<Post>,
        #[source]
        source: StorageError,
    },
}

pub(crate) type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub(crate) fn storage(
        operation: &'static str,
        payload: Option<Post>,
        source: StorageError,
    ) -> Self {
        Self::Storage {
            operation,
            payload,
            source,
        }
    }

    pub(crate) fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            AppError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            // Malformed payloads are reported as server errors, not 400.
            AppError::MissingHandler { .. }
            | AppError::RequestBody(_)
            | AppError::EmptyBody
            | AppError::Decode(_)
            | AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::NotFound(_) | AppError::MethodNotAllowed { .. } => {
                debug!(error = %self, "request rejected by router");
            }
            AppError::MissingHandler { method, path } => {
                error!(%method, %path, "handler binding is missing, resource table is misconfigured");
            }
            AppError::RequestBody(_) | AppError::BodyTooLarge { .. } => {
                warn!(error = %self, "request body rejected");
            }
            AppError::EmptyBody | AppError::Decode(_) => {
                error!(error = %self, "error decoding request body");
            }
            AppError::Storage {
                operation,
                payload,
                source,
            } => {
                error!(operation, payload = ?payload, error = %source, "storage operation failed");
            }
        }

        write_empty(self.status())
    }
}
