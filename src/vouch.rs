//! Vouch records for rated artifacts.
//!
//! A vouch is an outcome-tagged endorsement of an artifact (a skill,
//! capability, or other reviewable item) by an agent. At most one active
//! vouch may exist per (rater, artifact) pair; a repeat is a conflict,
//! not an update.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::ValidationError;

/// Unique identifier for a vouch record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VouchId(uuid::Uuid);

impl VouchId {
    /// Creates a new random vouch ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for VouchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for VouchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a rated artifact.
///
/// Artifact identifiers are trimmed but case-preserving: unlike agents,
/// artifact registries are assumed to mint exact identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Construct an artifact identifier.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyArtifactId`] if empty after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let trimmed = raw.as_ref().trim().to_string();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyArtifactId);
        }
        Ok(Self(trimmed))
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An agent's pass/fail attestation for an artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VouchRecord {
    /// Unique record identifier.
    pub id: VouchId,
    /// The vouching agent.
    pub rater: AgentId,
    /// The rated artifact.
    pub artifact: ArtifactId,
    /// Whether the rater's test of the artifact passed.
    pub passed: bool,
    /// Optional free-text evidence supplied by the rater.
    pub evidence: Option<String>,
    /// When the vouch was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl VouchRecord {
    /// Construct a new vouch record timestamped now.
    #[must_use]
    pub fn new(rater: AgentId, artifact: ArtifactId, passed: bool, evidence: Option<String>) -> Self {
        Self {
            id: VouchId::new(),
            rater,
            artifact,
            passed,
            evidence,
            recorded_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_id_preserves_case() {
        let a = ArtifactId::new("  Skill/Parser-V2 ").unwrap();
        assert_eq!(a.as_str(), "Skill/Parser-V2");
    }

    #[test]
    fn artifact_id_rejects_empty() {
        assert!(matches!(
            ArtifactId::new(""),
            Err(ValidationError::EmptyArtifactId)
        ));
    }

    #[test]
    fn vouch_record_roundtrips_through_json() {
        let rec = VouchRecord::new(
            AgentId::new("carol").unwrap(),
            ArtifactId::new("skill-1").unwrap(),
            true,
            Some("ran the conformance suite".to_string()),
        );
        let json = serde_json::to_string(&rec).unwrap();
        let back: VouchRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }
}
