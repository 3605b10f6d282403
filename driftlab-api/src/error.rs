//! Error Types for the DRIFTLAB API
//!
//! This module defines error handling for the HTTP layer:
//! - ApiError struct for structured error responses
//! - ErrorCode enum for categorizing errors
//! - IntoResponse implementation for Axum HTTP responses
//!
//! All errors are serialized as JSON with appropriate HTTP status codes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use driftlab_core::{DriftError, ScenarioError, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODE ENUM
// ============================================================================

/// Error codes for API responses.
///
/// Each error code maps to a specific HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // ========================================================================
    // Validation Errors (400)
    // ========================================================================
    /// Request validation failed
    ValidationFailed,

    /// Request body is not valid JSON for the endpoint
    InvalidInput,

    /// Required field is missing or blank
    MissingField,

    /// Playback named a scenario outside the catalog
    UnknownScenario,

    // ========================================================================
    // Not Found Errors (404)
    // ========================================================================
    /// Playback token names no live session
    SessionNotFound,

    // ========================================================================
    // Server Errors (500, 503)
    // ========================================================================
    /// Internal server error
    InternalError,

    /// Remote store failed during a scenario
    StoreUnavailable,

    /// Cluster directory could not be queried
    ClusterUnavailable,
}

impl ErrorCode {
    /// Get the HTTP status code for this error code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidInput
            | ErrorCode::MissingField
            | ErrorCode::UnknownScenario => StatusCode::BAD_REQUEST,

            ErrorCode::SessionNotFound => StatusCode::NOT_FOUND,

            ErrorCode::StoreUnavailable | ErrorCode::ClusterUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get a default message for this error code.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Request validation failed",
            ErrorCode::InvalidInput => "Invalid input data",
            ErrorCode::MissingField => "Required field is missing",
            ErrorCode::UnknownScenario => "Unsupported scenario",
            ErrorCode::SessionNotFound => "Playback session not found",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StoreUnavailable => "Remote store unavailable",
            ErrorCode::ClusterUnavailable => "Cluster directory unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ============================================================================
// API ERROR STRUCT
// ============================================================================

/// Structured error response for API operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ApiError {
    /// Error code categorizing the error
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Optional additional details (offending field, scenario name)
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<Object>))]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Create an error with the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self {
            code,
            message: code.default_message().to_string(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.code.status_code()
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingField,
            format!("Required field '{}' is missing", field),
        )
        .with_details(serde_json::json!({ "field": field }))
    }

    pub fn unknown_scenario(name: &str) -> Self {
        Self::new(
            ErrorCode::UnknownScenario,
            format!("Unsupported scenario: {}", name),
        )
        .with_details(serde_json::json!({ "scenario": name }))
    }

    /// The token is deliberately left out of the body.
    pub fn session_not_found() -> Self {
        Self::from_code(ErrorCode::SessionNotFound)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StoreUnavailable, message)
    }

    pub fn cluster_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ClusterUnavailable, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// ============================================================================
// AXUM INTEGRATION
// ============================================================================

/// Lets handlers return `ApiResult<T>` directly.
///
/// ```ignore
/// async fn handler() -> ApiResult<Json<ScenarioReport>> {
///     Err(ApiError::missing_field("key"))
/// }
/// ```
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self);
        (status, body).into_response()
    }
}

// ============================================================================
// CONVERSIONS
// ============================================================================

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::RequiredFieldMissing { field } => ApiError::missing_field(&field),
            ValidationError::InvalidValue { field, reason } => {
                ApiError::validation_failed(format!("Invalid value for {}: {}", field, reason))
                    .with_details(serde_json::json!({ "field": field }))
            }
        }
    }
}

impl From<DriftError> for ApiError {
    fn from(err: DriftError) -> Self {
        match err {
            DriftError::Validation(e) => e.into(),
            DriftError::Scenario(ScenarioError::UnknownScenario { name }) => {
                ApiError::unknown_scenario(&name)
            }
            DriftError::Scenario(ScenarioError::InvalidParameters { scenario, reason }) => {
                ApiError::validation_failed(reason)
                    .with_details(serde_json::json!({ "scenario": scenario }))
            }
            DriftError::Store(e) => {
                tracing::error!(error = %e, "Store failure during request");
                ApiError::store_unavailable(e.to_string())
            }
            DriftError::Cluster(e) => {
                tracing::warn!(error = %e, "Cluster failure during request");
                ApiError::cluster_unavailable(e.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON serialization error: {:?}", err);
        ApiError::invalid_input(format!("Invalid JSON: {}", err))
    }
}

/// Body rejections become 400s in the API's own error shape.
///
/// A body that parses but fails request validation surfaces as a data error,
/// whose text carries the validation message.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => ApiError::validation_failed(e.body_text()),
            other => ApiError::invalid_input(other.body_text()),
        }
    }
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Result type alias for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use driftlab_core::StoreError;

    #[test]
    fn test_error_code_status_mapping() {
        assert_eq!(ErrorCode::ValidationFailed.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::UnknownScenario.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorCode::SessionNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::StoreUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ErrorCode::InternalError.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_drift_error_mapping() {
        let err: ApiError = DriftError::from(ValidationError::missing("key")).into();
        assert_eq!(err.code, ErrorCode::MissingField);
        assert!(err.message.contains("key"));

        let err: ApiError = DriftError::from(ScenarioError::UnknownScenario {
            name: "meltdown".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::UnknownScenario);
        assert_eq!(err.details, Some(serde_json::json!({ "scenario": "meltdown" })));

        let err: ApiError = DriftError::from(StoreError::Unavailable {
            reason: "connection reset".to_string(),
        })
        .into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_error_serialization() -> Result<(), serde_json::Error> {
        let err = ApiError::session_not_found();
        let json = serde_json::to_string(&err)?;

        assert!(json.contains("SESSION_NOT_FOUND"));
        assert!(!json.contains("details"));

        let deserialized: ApiError = serde_json::from_str(&json)?;
        assert_eq!(deserialized, err);
        Ok(())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::store_unavailable("Connection failed");
        let display = format!("{}", err);

        assert!(display.contains("StoreUnavailable"));
        assert!(display.contains("Connection failed"));
    }
}
