//! Typed, directed edges of the trust graph.
//!
//! Edges are append-only. The single exception is the `active` flag on
//! trust edges: revoking a trust declaration tombstones the edge instead
//! of removing it, preserving audit history. Interaction and vouch edges
//! are always active once created.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::ValidationError;

/// Default weight for an interaction that failed (vs. 1.0 for a success).
pub const FAILED_INTERACTION_WEIGHT: f64 = 0.5;

/// Unique identifier for an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(uuid::Uuid);

impl EdgeId {
    /// Creates a new random edge ID.
    #[must_use]
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for EdgeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of relationship an edge records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// An observed interaction between two agents.
    Interaction,

    /// An endorsement of another agent.
    Vouch,

    /// An explicit, revocable trust declaration.
    Trust,
}

impl EdgeKind {
    /// Default edge weight when the caller supplies none.
    #[must_use]
    pub const fn default_weight(self) -> f64 {
        match self {
            Self::Interaction | Self::Trust => 1.0,
            Self::Vouch => 2.0,
        }
    }

    /// Only trust edges may be deactivated.
    #[must_use]
    pub const fn is_revocable(self) -> bool {
        matches!(self, Self::Trust)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interaction => write!(f, "interaction"),
            Self::Vouch => write!(f, "vouch"),
            Self::Trust => write!(f, "trust"),
        }
    }
}

/// A directed, weighted, typed edge between two agents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique edge identifier.
    pub id: EdgeId,
    /// Relationship kind.
    pub kind: EdgeKind,
    /// Source agent.
    pub from: AgentId,
    /// Target agent.
    pub to: AgentId,
    /// Non-negative edge weight.
    pub weight: f64,
    /// When the edge was recorded.
    pub recorded_at: DateTime<Utc>,
    /// Tombstone flag; false only for revoked trust edges.
    pub active: bool,
}

impl Edge {
    /// Validate and construct a new active edge.
    ///
    /// A missing weight takes the kind default (1.0; 2.0 for vouches).
    ///
    /// # Errors
    /// - [`ValidationError::SelfLoop`] if `from == to` after normalization
    /// - [`ValidationError::NegativeWeight`] if the weight is below zero
    pub fn new(
        kind: EdgeKind,
        from: AgentId,
        to: AgentId,
        weight: Option<f64>,
        recorded_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        if from == to {
            return Err(ValidationError::SelfLoop { agent: from });
        }
        let weight = weight.unwrap_or_else(|| kind.default_weight());
        if weight < 0.0 || !weight.is_finite() {
            return Err(ValidationError::NegativeWeight { value: weight });
        }
        Ok(Self {
            id: EdgeId::new(),
            kind,
            from,
            to,
            weight,
            recorded_at,
            active: true,
        })
    }
}
