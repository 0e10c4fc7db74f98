//! Reputation engine facade.
//!
//! `ReputationEngine` wires the graph store, influence solver, composite
//! scorer, rank cache, and safety classifier together behind the
//! interface the surrounding services consume: mutation inbound (record
//! interaction/vouch/trust, karma supply), query outbound (reputation,
//! leaderboard, percentile, safety), and the durable lifecycle (init
//! from storage, serve, lazy or eager recompute, teardown flush).

mod refresh;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::composite::{CompositeScorer, ScoreWeights};
use crate::edge::{EdgeId, EdgeKind};
use crate::error::{TrustResult, ValidationError};
use crate::graph::GraphStore;
use crate::rank::RankCache;
use crate::safety::{SafetyClassifier, SafetyRating};
use crate::snapshot::{AgentReputation, ReputationSnapshot};
use crate::solver::{InfluenceSolver, SolverConfig};
use crate::storage::{PersistedState, StateBackend};
use crate::vouch::{ArtifactId, VouchId};

use refresh::RefreshWorker;

/// When recomputation runs relative to mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// Invalidate on mutation, recompute on the next read.
    #[default]
    Lazy,
    /// Additionally recompute off the read path on a worker thread.
    Eager,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Influence solver parameters.
    pub solver: SolverConfig,
    /// Composite scoring coefficients.
    pub weights: ScoreWeights,
    /// Recompute policy.
    pub refresh: RefreshMode,
}

impl EngineConfig {
    /// Validate all nested configuration.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidConfig`] describing the first
    /// invalid field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        self.solver.validate()?;
        self.weights.validate()?;
        Ok(self)
    }
}

/// Trust graph and reputation scoring engine.
pub struct ReputationEngine {
    graph: Arc<GraphStore>,
    rank: Arc<RankCache>,
    safety: SafetyClassifier,
    backend: Option<Arc<dyn StateBackend>>,
    refresh: Option<RefreshWorker>,
}

impl ReputationEngine {
    /// Create an engine with no durable backend (embedded/test use).
    ///
    /// # Errors
    /// Returns a validation error for an invalid configuration.
    pub fn new(config: EngineConfig) -> TrustResult<Self> {
        Self::build(config, None)
    }

    /// Create an engine restored from durable storage.
    ///
    /// Loads edges, karma, vouches, and the latest snapshot (if any)
    /// before serving. The restored snapshot is served as-is until the
    /// first mutation invalidates it.
    ///
    /// # Errors
    /// Returns a validation error for an invalid configuration or a
    /// storage error from the backend.
    pub fn open(backend: Arc<dyn StateBackend>, config: EngineConfig) -> TrustResult<Self> {
        let engine = Self::build(config, Some(Arc::clone(&backend)))?;
        if let Some(state) = backend.load()? {
            engine
                .graph
                .restore(state.edges, state.karma, state.graph_version)?;
            engine.safety.store().restore(state.vouches)?;
            if let Some(snapshot) = state.snapshot {
                engine.rank.restore(snapshot)?;
            }
        }
        Ok(engine)
    }

    fn build(config: EngineConfig, backend: Option<Arc<dyn StateBackend>>) -> TrustResult<Self> {
        let config = config.validate()?;
        let graph = Arc::new(GraphStore::new());
        let rank = Arc::new(RankCache::new(
            Arc::clone(&graph),
            InfluenceSolver::new(config.solver),
            CompositeScorer::new(config.weights),
        ));
        let refresh = match config.refresh {
            RefreshMode::Lazy => None,
            RefreshMode::Eager => Some(RefreshWorker::start(Arc::clone(&rank))),
        };
        Ok(Self {
            graph,
            rank,
            safety: SafetyClassifier::new(),
            backend,
            refresh,
        })
    }

    fn after_mutation(&self) {
        self.rank.invalidate();
        if let Some(worker) = &self.refresh {
            worker.nudge();
        }
    }

    /// The underlying graph store.
    #[must_use]
    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    // ---- mutation inbound -------------------------------------------------

    /// Record an observed interaction between two agents.
    ///
    /// # Errors
    /// Validation errors for self-loops.
    pub fn record_interaction(
        &self,
        from: AgentId,
        to: AgentId,
        succeeded: bool,
    ) -> TrustResult<EdgeId> {
        let id = self.graph.record_interaction(from, to, succeeded)?;
        self.after_mutation();
        Ok(id)
    }

    /// Record an agent-to-agent endorsement as a vouch edge.
    ///
    /// # Errors
    /// Validation errors for self-loops.
    pub fn vouch_for_agent(&self, from: AgentId, to: AgentId) -> TrustResult<EdgeId> {
        let id = self.graph.add_edge(EdgeKind::Vouch, from, to, None)?;
        self.after_mutation();
        Ok(id)
    }

    /// Declare explicit trust from one agent to another.
    ///
    /// # Errors
    /// Validation errors for self-loops and negative weights.
    pub fn declare_trust(
        &self,
        from: AgentId,
        to: AgentId,
        weight: Option<f64>,
    ) -> TrustResult<EdgeId> {
        let id = self.graph.add_edge(EdgeKind::Trust, from, to, weight)?;
        self.after_mutation();
        Ok(id)
    }

    /// Revoke a trust declaration (tombstone; idempotent).
    ///
    /// # Errors
    /// [`crate::TrustError::EdgeNotFound`] or
    /// [`crate::TrustError::NotATrustEdge`].
    pub fn revoke_trust(&self, edge: EdgeId) -> TrustResult<()> {
        self.graph.deactivate_trust(edge)?;
        self.after_mutation();
        Ok(())
    }

    /// Supply the external karma signal for an agent.
    ///
    /// # Errors
    /// Internal error on lock poisoning.
    pub fn set_karma(&self, agent: AgentId, karma: f64) -> TrustResult<()> {
        self.graph.set_karma(agent, karma)?;
        self.after_mutation();
        Ok(())
    }

    /// Record an artifact vouch.
    ///
    /// Vouch records live outside the graph: this does not invalidate
    /// the reputation snapshot, and classification always folds live
    /// vouches into whatever snapshot is current.
    ///
    /// # Errors
    /// `Validation(DuplicateVouch)` on a repeat (rater, artifact) pair.
    pub fn vouch_artifact(
        &self,
        rater: AgentId,
        artifact: ArtifactId,
        passed: bool,
        evidence: Option<String>,
    ) -> TrustResult<VouchId> {
        self.safety.vouch(rater, artifact, passed, evidence)
    }

    // ---- query outbound ---------------------------------------------------

    /// Computed reputation for one agent, or `None` when the agent is
    /// not yet in the snapshot.
    ///
    /// # Errors
    /// Propagates snapshot recomputation errors.
    pub fn reputation(&self, agent: &AgentId) -> TrustResult<Option<AgentReputation>> {
        Ok(self.rank.get_snapshot()?.get(agent).copied())
    }

    /// Percentile of an agent's composite score. 0 for unknown agents.
    ///
    /// # Errors
    /// Propagates snapshot recomputation errors.
    pub fn percentile(&self, agent: &AgentId) -> TrustResult<f64> {
        self.rank.percentile(agent)
    }

    /// Top agents by composite score.
    ///
    /// # Errors
    /// Propagates snapshot recomputation errors.
    pub fn leaderboard(&self, limit: usize) -> TrustResult<Vec<(AgentId, AgentReputation)>> {
        self.rank.leaderboard(limit)
    }

    /// Vouch-weighted safety rating for an artifact, computed from live
    /// vouch records plus the latest snapshot.
    ///
    /// # Errors
    /// Propagates snapshot recomputation errors.
    pub fn safety(&self, artifact: &ArtifactId) -> TrustResult<SafetyRating> {
        let snapshot = self.rank.get_snapshot()?;
        self.safety.classify(artifact, &snapshot)
    }

    /// The current reputation snapshot, recomputing if stale.
    ///
    /// # Errors
    /// Propagates snapshot recomputation errors.
    pub fn snapshot(&self) -> TrustResult<Arc<ReputationSnapshot>> {
        self.rank.get_snapshot()
    }

    // ---- lifecycle --------------------------------------------------------

    /// Flush all durable state to the backend. No-op without one.
    ///
    /// # Errors
    /// Storage errors from the backend.
    pub fn flush(&self) -> TrustResult<()> {
        let Some(backend) = &self.backend else {
            return Ok(());
        };
        let view = self.graph.snapshot()?;
        let vouches = self.safety.store().all()?;
        let snapshot = self.rank.get_snapshot().ok().map(|s| (*s).clone());
        let state = PersistedState {
            graph_version: view.version,
            edges: view.edges,
            karma: view.karma,
            vouches,
            snapshot,
        };
        backend.store(&state)?;
        Ok(())
    }
}

impl std::fmt::Debug for ReputationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReputationEngine")
            .field("graph_version", &self.graph.version())
            .field("eager_refresh", &self.refresh.is_some())
            .field("durable", &self.backend.is_some())
            .finish()
    }
}
