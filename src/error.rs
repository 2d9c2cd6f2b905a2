use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Classified failure of a single generative-service call
///
/// Every provider failure is routed through
/// [`classify`](crate::services::providers::classify) so that credential problems are
/// recognised the same way regardless of which operation hit them.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AiRequestError {
    #[error("No API key is configured for the AI service")]
    MissingCredential,

    #[error("Invalid API key: {0}")]
    InvalidCredential(String),

    #[error("Failed to get a response from the AI: {0}")]
    ProviderFailure(String),

    #[error("The AI returned an unexpected response: {0}")]
    MalformedResponse(String),
}

impl AiRequestError {
    pub fn is_invalid_credential(&self) -> bool {
        matches!(self, AiRequestError::InvalidCredential(_))
    }
}

/// Failure of the on-device key-value store
///
/// Never surfaced to users: callers log it and carry on as if the store missed.
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store query failed: {0}")]
    Query(#[from] sqlx::Error),

    #[error("Cache backend failed: {0}")]
    Cache(#[from] redis::RedisError),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Ai(#[from] AiRequestError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Sharing is not supported: {0}")]
    ShareUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_invalid_credential(&self) -> bool {
        matches!(self, AppError::Ai(e) if e.is_invalid_credential())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let credential_reset = self.is_invalid_credential();
        let (status, message) = match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ShareUnavailable(_) => (StatusCode::CONFLICT, self.to_string()),
            AppError::Ai(AiRequestError::MissingCredential) => {
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::Ai(AiRequestError::InvalidCredential(_)) => {
                (StatusCode::UNAUTHORIZED, "Invalid API key".to_string())
            }
            AppError::Ai(_) => (StatusCode::BAD_GATEWAY, self.to_string()),
            AppError::Storage(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = if credential_reset {
            Json(json!({ "error": message, "credential_reset": true }))
        } else {
            Json(json!({ "error": message }))
        };

        (status, body).into_response()
    }
}

/// A spawned provider call panicked or was aborted by runtime shutdown
impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Background request failed: {}", e))
    }
}

pub type AppResult<T> = Result<T, AppError>;
