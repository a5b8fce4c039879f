// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for topology evaluation

use thiserror::Error;

use crate::domain::{InstanceError, NetworkError};

/// Errors that can occur while evaluating or emitting a topology
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopologyError {
    /// Required environment value absent or empty
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// An external lookup (availability zones, machine image) could not be resolved
    #[error("External lookup failed for {key}: {reason}")]
    ExternalLookupFailure { key: String, reason: String },

    /// The declared topology cannot be realized
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The provisioned stack does not expose an attribute an output needs
    #[error("Provisioning error: {0}")]
    Provisioning(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error while writing the cloud assembly
    #[error("I/O error: {0}")]
    Io(String),
}

impl TopologyError {
    /// Build an `ExternalLookupFailure` for a context key
    pub fn lookup(key: impl Into<String>, reason: impl Into<String>) -> Self {
        TopologyError::ExternalLookupFailure {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for topology operations
pub type TopologyResult<T> = Result<T, TopologyError>;

impl From<NetworkError> for TopologyError {
    fn from(err: NetworkError) -> Self {
        TopologyError::ConstraintViolation(err.to_string())
    }
}

impl From<InstanceError> for TopologyError {
    fn from(err: InstanceError) -> Self {
        TopologyError::ConstraintViolation(err.to_string())
    }
}

impl From<serde_json::Error> for TopologyError {
    fn from(err: serde_json::Error) -> Self {
        TopologyError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for TopologyError {
    fn from(err: std::io::Error) -> Self {
        TopologyError::Io(err.to_string())
    }
}
