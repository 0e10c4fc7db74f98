//! Thread-safe in-memory graph store.
//!
//! Mutations are mutually exclusive with each other and with snapshot
//! reads via a single writer lock. Every successful mutation increments
//! a monotonic version counter that the rank cache uses to decide
//! staleness.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::agent::AgentId;
use crate::edge::{Edge, EdgeId, EdgeKind, FAILED_INTERACTION_WEIGHT};
use crate::error::{TrustError, TrustResult};
use crate::graph::GraphView;

fn lock_err(context: &'static str) -> TrustError {
    TrustError::internal(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct GraphState {
    edges: Vec<Edge>,
    by_id: HashMap<EdgeId, usize>,
    nodes: HashSet<AgentId>,
    karma: HashMap<AgentId, f64>,
    version: u64,
}

impl GraphState {
    fn append(&mut self, edge: Edge) -> EdgeId {
        let id = edge.id;
        self.nodes.insert(edge.from.clone());
        self.nodes.insert(edge.to.clone());
        self.by_id.insert(id, self.edges.len());
        self.edges.push(edge);
        self.version += 1;
        id
    }
}

/// Durable node/edge repository for the trust graph.
///
/// Edges are append-only; the only in-place mutation is tombstoning the
/// `active` flag of a trust edge. Agents come into existence on first
/// edge reference and are never deleted.
#[derive(Debug, Default)]
pub struct GraphStore {
    state: RwLock<GraphState>,
}

impl GraphStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new edge, timestamped now.
    ///
    /// A missing weight takes the kind default (1.0; 2.0 for vouches).
    ///
    /// # Errors
    /// - `Validation(SelfLoop)` if `from == to` after normalization
    /// - `Validation(NegativeWeight)` if the weight is below zero
    pub fn add_edge(
        &self,
        kind: EdgeKind,
        from: AgentId,
        to: AgentId,
        weight: Option<f64>,
    ) -> TrustResult<EdgeId> {
        self.add_edge_at(kind, from, to, weight, Utc::now())
    }

    /// Append a new edge with an explicit timestamp (restore path, tests).
    ///
    /// # Errors
    /// Same as [`GraphStore::add_edge`].
    pub fn add_edge_at(
        &self,
        kind: EdgeKind,
        from: AgentId,
        to: AgentId,
        weight: Option<f64>,
        recorded_at: DateTime<Utc>,
    ) -> TrustResult<EdgeId> {
        // Validate before taking the write lock; invalid edges never
        // reach the store.
        let edge = Edge::new(kind, from, to, weight, recorded_at)?;
        let mut state = self.state.write().map_err(|_| lock_err("graph.add_edge"))?;
        Ok(state.append(edge))
    }

    /// Record an observed interaction between two agents.
    ///
    /// Failed interactions are recorded at reduced weight rather than
    /// dropped, so activity counts still reflect them.
    ///
    /// # Errors
    /// Same as [`GraphStore::add_edge`].
    pub fn record_interaction(
        &self,
        from: AgentId,
        to: AgentId,
        succeeded: bool,
    ) -> TrustResult<EdgeId> {
        let weight = if succeeded {
            None
        } else {
            Some(FAILED_INTERACTION_WEIGHT)
        };
        self.add_edge(EdgeKind::Interaction, from, to, weight)
    }

    /// Tombstone a trust edge.
    ///
    /// Idempotent: deactivating an already-inactive edge is a no-op, not
    /// an error, and does not advance the graph version.
    ///
    /// # Errors
    /// - [`TrustError::EdgeNotFound`] for an unknown edge ID
    /// - [`TrustError::NotATrustEdge`] for interaction/vouch edges
    pub fn deactivate_trust(&self, id: EdgeId) -> TrustResult<()> {
        let mut state = self
            .state
            .write()
            .map_err(|_| lock_err("graph.deactivate_trust"))?;
        let Some(&idx) = state.by_id.get(&id) else {
            return Err(TrustError::EdgeNotFound { id });
        };
        let edge = &mut state.edges[idx];
        if !edge.kind.is_revocable() {
            return Err(TrustError::NotATrustEdge { id });
        }
        if edge.active {
            edge.active = false;
            state.version += 1;
        }
        Ok(())
    }

    /// Upsert the external karma signal for an agent.
    ///
    /// Composite scores embed karma, so this counts as a graph mutation
    /// for snapshot-staleness purposes.
    ///
    /// # Errors
    /// Returns an internal error if the store lock is poisoned.
    pub fn set_karma(&self, agent: AgentId, karma: f64) -> TrustResult<()> {
        let mut state = self.state.write().map_err(|_| lock_err("graph.set_karma"))?;
        state.karma.insert(agent, karma);
        state.version += 1;
        Ok(())
    }

    /// Fetch one edge by ID.
    ///
    /// # Errors
    /// Returns an internal error if the store lock is poisoned.
    pub fn edge(&self, id: EdgeId) -> TrustResult<Option<Edge>> {
        let state = self.state.read().map_err(|_| lock_err("graph.edge"))?;
        Ok(state.by_id.get(&id).map(|&idx| state.edges[idx].clone()))
    }

    /// Take a point-in-time consistent copy of the graph.
    ///
    /// # Errors
    /// Returns an internal error if the store lock is poisoned.
    pub fn snapshot(&self) -> TrustResult<GraphView> {
        let state = self.state.read().map_err(|_| lock_err("graph.snapshot"))?;
        Ok(GraphView {
            version: state.version,
            nodes: state.nodes.iter().cloned().collect::<BTreeSet<_>>(),
            edges: state.edges.clone(),
            karma: state.karma.clone(),
        })
    }

    /// Current graph version. Starts at 0 for an empty store and
    /// increments on every successful mutation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.read().expect("graph lock poisoned").version
    }

    /// Rebuild state from durable storage on init.
    ///
    /// Replaces all current state and reinstates the persisted version
    /// counter, so a snapshot flushed at that version is still fresh.
    ///
    /// # Errors
    /// Returns an internal error if the store lock is poisoned.
    pub fn restore(
        &self,
        edges: Vec<Edge>,
        karma: HashMap<AgentId, f64>,
        version: u64,
    ) -> TrustResult<()> {
        let mut state = self.state.write().map_err(|_| lock_err("graph.restore"))?;
        let mut fresh = GraphState::default();
        for edge in edges {
            fresh.append(edge);
        }
        fresh.karma = karma;
        // Never move the counter backwards relative to the edges we hold.
        fresh.version = fresh.version.max(version);
        *state = fresh;
        Ok(())
    }
}
