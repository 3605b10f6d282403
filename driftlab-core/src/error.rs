//! Error types for DRIFTLAB operations

use thiserror::Error;

/// Remote store and near-cache errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Wrong type for key {key}: expected {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Store lock poisoned")]
    LockPoisoned,
}

/// Validation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::RequiredFieldMissing {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Scenario dispatch errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("Unsupported scenario: {name}")]
    UnknownScenario { name: String },

    #[error("Invalid parameters for scenario {scenario}: {reason}")]
    InvalidParameters { scenario: String, reason: String },
}

/// Cluster directory errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("Node {address} unreachable: {reason}")]
    NodeUnreachable { address: String, reason: String },

    #[error("Cluster directory unavailable: {reason}")]
    DirectoryUnavailable { reason: String },
}

/// Master error type for all DRIFTLAB errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DriftError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Scenario error: {0}")]
    Scenario(#[from] ScenarioError),

    #[error("Cluster error: {0}")]
    Cluster(#[from] ClusterError),
}

impl DriftError {
    /// Short type tag used when an error is folded into an observation.
    pub fn kind(&self) -> &'static str {
        match self {
            DriftError::Store(_) => "StoreError",
            DriftError::Validation(_) => "ValidationError",
            DriftError::Scenario(_) => "ScenarioError",
            DriftError::Cluster(_) => "ClusterError",
        }
    }

    /// `"Kind: message"` form used in degraded status payloads.
    pub fn summary(&self) -> String {
        let detail = match self {
            DriftError::Store(e) => e.to_string(),
            DriftError::Validation(e) => e.to_string(),
            DriftError::Scenario(e) => e.to_string(),
            DriftError::Cluster(e) => e.to_string(),
        };
        format!("{}: {}", self.kind(), detail)
    }
}

/// Result type alias for DRIFTLAB operations.
pub type DriftResult<T> = Result<T, DriftError>;

// =============================================================================
// TESTS
// =============================================================================
