//! Error envelope and JSON extraction for the HTTP API.

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use zdag_domain::error::DomainError;
use zdag_server::handlers::batch::BatchOperationError;
use zdag_storage::StorageError;

/// Error codes carried in the `code` field of every failure response.
///
/// Each code maps to one HTTP status in [`ApiError::status`].
pub mod error_codes {
    // 400 Bad Request
    /// Malformed JSON, missing fields, reserved tokens, invalid filters.
    pub const VALIDATION_ERROR: &str = "validation_error";
    /// Pagination continuation token could not be decoded.
    pub const INVALID_CONTINUATION_TOKEN: &str = "invalid_continuation_token";

    // 409 Conflict
    /// Strict create of an edge that already exists.
    pub const ALREADY_EXISTS: &str = "already_exists";
    /// The edge would close a cycle while the cycle guard is on.
    pub const CYCLE_DETECTED: &str = "cycle_detected";

    // 413 Payload Too Large
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";

    // 422 Unprocessable Entity
    /// A path, tree or depth cap stopped the query.
    pub const RESOLUTION_LIMIT_EXCEEDED: &str = "resolution_limit_exceeded";

    // 5xx
    pub const INTERNAL_ERROR: &str = "internal_error";
    /// Query exceeded its time budget.
    pub const TIMEOUT: &str = "timeout";
    /// Query was aborted before completion.
    pub const CANCELLED: &str = "cancelled";
}

/// API error response body.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Creates a validation error (400).
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new(error_codes::VALIDATION_ERROR, message)
    }

    /// Creates an invalid continuation token error (400).
    pub fn invalid_continuation_token(message: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_CONTINUATION_TOKEN, message)
    }

    /// Creates an already exists error (409).
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(error_codes::ALREADY_EXISTS, message)
    }

    /// Creates a cycle detected error (409).
    pub fn cycle_detected(message: impl Into<String>) -> Self {
        Self::new(error_codes::CYCLE_DETECTED, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(error_codes::PAYLOAD_TOO_LARGE, message)
    }

    /// Creates a resolution limit error (422).
    pub fn resolution_limit_exceeded(message: impl Into<String>) -> Self {
        Self::new(error_codes::RESOLUTION_LIMIT_EXCEEDED, message)
    }

    /// Creates an internal error (500).
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(error_codes::INTERNAL_ERROR, message)
    }

    /// Creates a timeout error (504).
    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(error_codes::TIMEOUT, message)
    }

    /// Creates a cancelled error (503).
    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(error_codes::CANCELLED, message)
    }

    pub fn status(&self) -> StatusCode {
        use error_codes::*;

        match self.code.as_str() {
            VALIDATION_ERROR | INVALID_CONTINUATION_TOKEN => StatusCode::BAD_REQUEST,
            ALREADY_EXISTS | CYCLE_DETECTED => StatusCode::CONFLICT,
            PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            RESOLUTION_LIMIT_EXCEEDED => StatusCode::UNPROCESSABLE_ENTITY,
            TIMEOUT => StatusCode::GATEWAY_TIMEOUT,
            CANCELLED => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match &err {
            DomainError::Validation(_) | DomainError::InvalidRequest { .. } => {
                ApiError::validation_error(err.to_string())
            }
            DomainError::AlreadyExists { .. } => ApiError::already_exists(err.to_string()),
            DomainError::CycleDetected { .. } => ApiError::cycle_detected(err.to_string()),
            DomainError::PathLimitExceeded { .. }
            | DomainError::TreeLimitExceeded { .. }
            | DomainError::DepthLimitExceeded { .. } => {
                warn!(error = %err, "query stopped by resolution limit");
                ApiError::resolution_limit_exceeded(err.to_string())
            }
            DomainError::Timeout { .. } => {
                warn!(error = %err, "query timed out");
                ApiError::gateway_timeout(err.to_string())
            }
            DomainError::Cancelled => ApiError::cancelled(err.to_string()),
            DomainError::StorageOperationFailed { .. } | DomainError::Internal { .. } => {
                // Full detail stays in the log.
                error!(error = %err, "internal failure while serving request");
                ApiError::internal_error("internal error while processing the request")
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidContinuationToken { token } => {
                ApiError::invalid_continuation_token(format!("invalid continuation token: {token}"))
            }
            other => ApiError::from(crate::adapters::storage_error(other)),
        }
    }
}

impl From<BatchOperationError> for ApiError {
    fn from(err: BatchOperationError) -> Self {
        match err {
            BatchOperationError::Domain(inner) => ApiError::from(inner),
            other => ApiError::validation_error(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON extractor that answers malformed bodies with a 400 envelope instead
/// of axum's plain-text 422.
///
/// Preserves 413 Payload Too Large for body limit errors.
pub struct JsonBadRequest<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBadRequest<T>
where
    T: serde::de::DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBadRequest(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    let too_large = matches!(rejection, JsonRejection::BytesRejection(_))
        && rejection.status() == StatusCode::PAYLOAD_TOO_LARGE;
    if too_large {
        ApiError::payload_too_large(rejection.body_text())
    } else {
        ApiError::validation_error(rejection.body_text())
    }
}
