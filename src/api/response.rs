//! Response types for the payroll engine API.
//!
//! This module defines the error response structures and the mapping
//! from engine errors to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let message = error.to_string();
        match error {
            EngineError::Validation { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("VALIDATION_ERROR", message),
            },
            EngineError::Cycle { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::with_details(
                    "DEPENDENCY_CYCLE",
                    "Component dependencies form a cycle",
                    message,
                ),
            },
            EngineError::UnresolvedReference { .. } => ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error: ApiError::new("UNRESOLVED_REFERENCE", message),
            },
            EngineError::MissingAssignment { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("ASSIGNMENT_NOT_FOUND", message),
            },
            EngineError::Evaluation { .. } => ApiErrorResponse {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: ApiError::new("EVALUATION_ERROR", message),
            },
            EngineError::IllegalState { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("ILLEGAL_STATE", message),
            },
            EngineError::ConcurrencyConflict { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("CONCURRENCY_CONFLICT", message),
            },
            EngineError::ApprovalBlocked { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::with_details(
                    "APPROVAL_BLOCKED",
                    message,
                    "Fix the salary structure and recalculate before approving",
                ),
            },
            EngineError::ComponentNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("COMPONENT_NOT_FOUND", message),
            },
            EngineError::PayRunNotFound { .. } => ApiErrorResponse {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new("PAY_RUN_NOT_FOUND", message),
            },
            EngineError::ReferencedByActiveAssignment { .. }
            | EngineError::ReferencedByDependentComponent { .. } => ApiErrorResponse {
                status: StatusCode::CONFLICT,
                error: ApiError::new("COMPONENT_IN_USE", message),
            },
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParse { .. } => {
                ApiErrorResponse {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: ApiError::with_details(
                        "CONFIG_ERROR",
                        "Configuration error",
                        message,
                    ),
                }
            }
        }
    }
}
