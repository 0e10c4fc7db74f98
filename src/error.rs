//! Error types for trustgraph.
//!
//! All errors are strongly typed using thiserror. Mutation errors are
//! returned synchronously and never partially apply: an invalid edge or
//! duplicate vouch is rejected before any store state changes.

use thiserror::Error;

use crate::agent::AgentId;
use crate::edge::EdgeId;
use crate::storage::StorageError;
use crate::vouch::ArtifactId;

/// Validation errors that occur during input validation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Self-loop edge rejected: {agent} cannot reference itself")]
    SelfLoop {
        agent: AgentId,
    },

    #[error("Edge weight {value} is negative")]
    NegativeWeight {
        value: f64,
    },

    #[error("Duplicate vouch: {rater} already vouched for {artifact}")]
    DuplicateVouch {
        rater: AgentId,
        artifact: ArtifactId,
    },

    #[error("Agent identifier cannot be empty")]
    EmptyAgentId,

    #[error("Artifact identifier cannot be empty")]
    EmptyArtifactId,

    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        reason: String,
    },
}

/// Top-level error type for trustgraph.
///
/// This enum encompasses all possible errors that can occur when
/// mutating or querying the engine. Note that a solver hitting its
/// iteration cap is *not* an error: it is surfaced as `converged: false`
/// on the resulting snapshot, since a best-effort ranking is still useful.
#[derive(Debug, Error)]
pub enum TrustError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Edge not found: {id}")]
    EdgeNotFound {
        id: EdgeId,
    },

    #[error("Edge {id} is not a trust edge and cannot be deactivated")]
    NotATrustEdge {
        id: EdgeId,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl TrustError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a not-found error on a targeted operation.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::EdgeNotFound { .. })
    }

    /// Returns true if this is a storage error.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Returns true if this error is retryable.
    ///
    /// Validation and not-found errors won't change on retry; storage
    /// backend faults might.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Validation(_) | Self::EdgeNotFound { .. } | Self::NotATrustEdge { .. } => false,
            Self::Storage(e) => e.is_retryable(),
            Self::Internal { .. } => false,
        }
    }
}

/// Result type alias for trustgraph operations.
pub type TrustResult<T> = Result<T, TrustError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_self_loop() {
        let agent = AgentId::new("Alice").unwrap();
        let err = ValidationError::SelfLoop { agent };
        let msg = format!("{err}");
        assert!(msg.contains("alice"));
        assert!(msg.contains("Self-loop"));
    }

    #[test]
    fn test_validation_error_negative_weight() {
        let err = ValidationError::NegativeWeight { value: -0.5 };
        let msg = format!("{err}");
        assert!(msg.contains("-0.5"));
        assert!(msg.contains("negative"));
    }

    #[test]
    fn test_trust_error_from_validation() {
        let err: TrustError = ValidationError::EmptyAgentId.into();
        assert!(err.is_validation());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_trust_error_not_found() {
        let err = TrustError::EdgeNotFound { id: EdgeId::new() };
        assert!(err.is_not_found());
        assert!(!err.is_retryable());
        assert!(format!("{err}").contains("Edge not found"));
    }

    #[test]
    fn test_trust_error_from_storage() {
        let err: TrustError = StorageError::Backend("disk full".to_string()).into();
        assert!(err.is_storage());
        assert!(err.is_retryable());
        assert!(format!("{err}").contains("disk full"));
    }

    #[test]
    fn test_trust_error_internal() {
        let err = TrustError::internal("unexpected state");
        assert!(!err.is_retryable());
        assert!(format!("{err}").contains("unexpected state"));
    }
}
