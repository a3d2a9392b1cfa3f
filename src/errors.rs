//! Errors for the boats API
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::validation::ValidationError;

#[derive(Error, Debug)]
pub enum BoatsApiError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    MalformedBody(String),

    #[error("{0}")]
    RejectedWrite(String),

    #[error("Not found")]
    NotFound,

    #[error("Invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("{0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("{0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Stored record is invalid: {0}")]
    InvalidStoredRecord(String),

    #[error("Database migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error")]
    ConfigError(#[from] config::ConfigError),

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("IO error")]
    IoError(#[from] std::io::Error),
}

impl From<JsonRejection> for BoatsApiError {
    fn from(rejection: JsonRejection) -> Self {
        BoatsApiError::MalformedBody(rejection.body_text())
    }
}

impl BoatsApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BoatsApiError::Validation(_)
            | BoatsApiError::MalformedBody(_)
            | BoatsApiError::RejectedWrite(_) => StatusCode::BAD_REQUEST,
            BoatsApiError::NotFound | BoatsApiError::InvalidRecordId(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the error came from the backing store
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            BoatsApiError::Mongo(_)
                | BoatsApiError::DatabaseError(_)
                | BoatsApiError::InvalidStoredRecord(_)
        )
    }
}

/// Body of every error response
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for BoatsApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            // A malformed record id can never match, so it reads as a miss
            BoatsApiError::InvalidRecordId(_) => BoatsApiError::NotFound.to_string(),
            ref other => other.to_string(),
        };

        if status.is_server_error() {
            error!("Request failed: {}", message);
        }

        (status, Json(ErrorBody { message })).into_response()
    }
}
