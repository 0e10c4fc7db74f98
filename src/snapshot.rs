//! Versioned reputation snapshots.
//!
//! A snapshot is immutable once written. Graph mutations never edit an
//! existing snapshot; they only trigger production of a new one at a
//! later graph version.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentId;

/// Computed reputation values for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentReputation {
    /// Normalized influence score in [0, 100].
    pub influence: f64,
    /// Composite score (karma + influence + activity blend).
    pub composite: f64,
    /// Number of interaction edges the agent participates in.
    pub interactions: u64,
}

/// An immutable set of computed reputation scores for all agents at one
/// point in time.
///
/// `converged: false` means the solver hit its iteration cap before the
/// convergence tolerance was met. Callers should treat fine-grained
/// ordering among closely-scored agents as unreliable in that case while
/// still trusting gross tiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationSnapshot {
    /// Graph version this snapshot was computed from.
    pub version: u64,
    /// When the computation finished.
    pub computed_at: DateTime<Utc>,
    /// Iterations the solver ran.
    pub iterations_used: u32,
    /// Whether the solver met its convergence tolerance.
    pub converged: bool,
    /// Per-agent computed scores.
    pub entries: HashMap<AgentId, AgentReputation>,
}

impl ReputationSnapshot {
    /// An empty snapshot for a graph with no agents. Valid, not an error.
    #[must_use]
    pub fn empty(version: u64) -> Self {
        Self {
            version,
            computed_at: Utc::now(),
            iterations_used: 0,
            converged: true,
            entries: HashMap::new(),
        }
    }

    /// Look up one agent's scores.
    #[must_use]
    pub fn get(&self, agent: &AgentId) -> Option<&AgentReputation> {
        self.entries.get(agent)
    }

    /// Composite score for an agent, or `default` when the agent has no
    /// entry yet (new agent, not yet scored).
    #[must_use]
    pub fn composite_or(&self, agent: &AgentId, default: f64) -> f64 {
        self.entries.get(agent).map_or(default, |r| r.composite)
    }

    /// Number of scored agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no agents were scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
