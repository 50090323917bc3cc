use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Every failure a handler can return.
///
/// Client-facing bodies never carry internal detail: server faults are
/// logged here and answered with a generic message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("unauthorized")]
    Unauthorized,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0} already exists")]
    Conflict(&'static str),

    #[error("storage error: {0}")]
    Storage(#[source] StoreError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Map a storage error, naming the entity for `NotFound`.
    pub fn from_store(e: StoreError, entity: &'static str) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound(entity),
            StoreError::AlreadyExists(what) => Self::Conflict(what),
            other => Self::Storage(other),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Validation { field, message } => json!({
                "message": "Invalid Data was provided",
                "error": format!("{field}: {message}"),
            }),
            Self::Unauthorized => json!({ "message": "Unauthorized" }),
            Self::InvalidCredentials => json!({ "message": "invalid credentials" }),
            Self::Forbidden => json!({ "message": "Forbidden" }),
            Self::NotFound(what) => json!({ "message": format!("{what} not found") }),
            Self::Conflict(what) => json!({ "message": format!("{what} already exists") }),
            Self::Storage(e) => {
                error!(error = %e, "storage failure");
                json!({ "message": "Internal server error" })
            }
            Self::Internal(e) => {
                error!(error = %e, "internal failure");
                json!({ "message": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
