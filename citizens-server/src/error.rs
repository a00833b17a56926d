//! Error handling for the citizens server

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use citizens::{ErrorKind, RegistryError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine readable error type
    pub error: String,
    /// Human readable description
    pub message: String,
}

/// Server error types
#[derive(Debug, Error)]
pub enum ServerError {
    /// Registry library error
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// A field of the request body failed validation
    #[error("{0}")]
    Validation(String),

    /// The request could not be read as JSON of the expected shape
    #[error("{0}")]
    BadRequest(String),

    /// No route or resource matches
    #[error("{0}")]
    NotFound(String),

    /// The route exists but not for this method
    #[error("Method {0} is not allowed for this resource")]
    MethodNotAllowed(String),

    /// The request body exceeds the configured limit
    #[error("Request body is too large")]
    PayloadTooLarge,
}

impl ServerError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Registry(err) => match err.kind() {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Get the error type string
    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Registry(err) => match err {
                RegistryError::BadRelativesGiven { .. }
                | RegistryError::NotSymmetricalRelatives { .. }
                | RegistryError::DuplicateCitizenId(_)
                | RegistryError::DuplicateRelatives { .. }
                | RegistryError::EmptyBatch => "invalid_relations",
                RegistryError::Validation(_) => "validation_error",
                RegistryError::Storage(_) => "storage_error",
                RegistryError::Configuration(_) => "configuration_error",
                RegistryError::ImportNotFound(_)
                | RegistryError::CitizenNotFound(_)
                | RegistryError::RelativesNotFound => "not_found",
            },
            ServerError::Validation(_) => "validation_error",
            ServerError::BadRequest(_) => "bad_request",
            ServerError::NotFound(_) => "not_found",
            ServerError::MethodNotAllowed(_) => "method_not_allowed",
            ServerError::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let error_response = ErrorResponse {
            error: self.error_type().to_string(),
            message: self.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Helper function to create a not found error
pub fn not_found(resource: &str) -> ServerError {
    ServerError::NotFound(format!("Not found: {}", resource))
}

/// Helper function to create a validation error
pub fn validation_error(message: impl Into<String>) -> ServerError {
    ServerError::Validation(message.into())
}

/// Helper function to create a bad request error
pub fn bad_request(message: impl Into<String>) -> ServerError {
    ServerError::BadRequest(message.into())
}
