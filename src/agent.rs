//! Agent identity.
//!
//! Agents are implicit: a node exists in the trust graph from the moment
//! any edge references it, and is never explicitly deleted. The only
//! directly stored per-agent attribute is external karma, which lives in
//! the graph store's karma table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Case-insensitive unique identifier for a participant in the trust graph.
///
/// Identifiers are normalized (trimmed, ASCII-lowercased) on construction,
/// so `"Alice"` and `"alice"` refer to the same agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    /// Normalize and construct an agent identifier.
    ///
    /// # Errors
    /// Returns [`ValidationError::EmptyAgentId`] if the identifier is empty
    /// after trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ValidationError> {
        let normalized = raw.as_ref().trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::EmptyAgentId);
        }
        Ok(Self(normalized))
    }

    /// Returns the normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
