//! Trust graph storage.
//!
//! [`GraphStore`] owns node/edge lifecycle and the external karma table.
//! [`GraphView`] is the point-in-time consistent read the influence
//! solver and scorer run against, so recomputation never holds the live
//! graph lock for its full duration.

mod store;

pub use store::GraphStore;

use std::collections::{BTreeSet, HashMap};

use crate::agent::AgentId;
use crate::edge::{Edge, EdgeKind};

/// A point-in-time, consistent copy of the graph.
///
/// Taken under the store's read lock; never observes a partially-applied
/// mutation. Mutations that land after the copy simply supersede any
/// computation derived from it (eventual consistency).
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Graph version the view was taken at.
    pub version: u64,
    /// Every agent referenced by at least one edge, tombstoned or not.
    pub nodes: BTreeSet<AgentId>,
    /// All edges, including deactivated trust edges.
    pub edges: Vec<Edge>,
    /// External karma signal per agent; absent means 0.
    pub karma: HashMap<AgentId, f64>,
}

impl GraphView {
    /// Iterate over edges that participate in influence propagation.
    pub fn active_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(|e| e.active)
    }

    /// Per-agent count of interaction edges the agent participates in,
    /// as either party.
    #[must_use]
    pub fn interaction_counts(&self) -> HashMap<AgentId, u64> {
        let mut counts: HashMap<AgentId, u64> = HashMap::new();
        for edge in &self.edges {
            if edge.kind == EdgeKind::Interaction {
                *counts.entry(edge.from.clone()).or_insert(0) += 1;
                *counts.entry(edge.to.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// External karma for an agent, defaulting to 0 when never supplied.
    #[must_use]
    pub fn karma_of(&self, agent: &AgentId) -> f64 {
        self.karma.get(agent).copied().unwrap_or(0.0)
    }
}
