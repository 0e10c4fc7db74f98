//! Snapshot cache, percentile queries, and recompute policy.
//!
//! The cache holds the last computed [`ReputationSnapshot`] and decides
//! when a recomputation is due by comparing the snapshot's version with
//! the live graph version. Recomputation is single-flight: concurrent
//! readers that find the cache stale coalesce onto one in-flight solve
//! instead of each running a redundant pass.
//!
//! The solver runs against a point-in-time graph view, never holding the
//! live graph lock for its duration. Mutations that land mid-solve just
//! leave the fresh snapshot already stale; the next read recomputes.

use std::sync::{Arc, Condvar, Mutex};

use chrono::Utc;

use crate::agent::AgentId;
use crate::composite::CompositeScorer;
use crate::error::{TrustError, TrustResult};
use crate::graph::{GraphStore, GraphView};
use crate::snapshot::{AgentReputation, ReputationSnapshot};
use crate::solver::InfluenceSolver;

/// Snapshot lifecycle: `Absent -> Computing -> Ready`, re-entering
/// `Computing` whenever a read finds the ready snapshot stale.
#[derive(Debug, Clone)]
enum CacheState {
    Absent,
    Computing,
    Ready(Arc<ReputationSnapshot>),
}

#[derive(Debug)]
struct CacheSlot {
    state: CacheState,
    /// Set by mutation hooks; cleared when a recompute starts.
    stale: bool,
}

/// Holds the latest reputation snapshot and serves ranking queries.
#[derive(Debug)]
pub struct RankCache {
    graph: Arc<GraphStore>,
    solver: InfluenceSolver,
    scorer: CompositeScorer,
    slot: Mutex<CacheSlot>,
    ready: Condvar,
}

impl RankCache {
    /// Create a cache over the given graph with the given computation
    /// parameters. No snapshot exists until the first read.
    #[must_use]
    pub fn new(graph: Arc<GraphStore>, solver: InfluenceSolver, scorer: CompositeScorer) -> Self {
        Self {
            graph,
            solver,
            scorer,
            slot: Mutex::new(CacheSlot {
                state: CacheState::Absent,
                stale: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Mark the cached snapshot stale without recomputing.
    ///
    /// Called by graph mutation hooks; the recompute happens lazily on
    /// the next read (or eagerly when a refresh worker picks it up).
    pub fn invalidate(&self) {
        let mut slot = self.slot.lock().expect("rank cache lock poisoned");
        slot.stale = true;
    }

    /// Return the most recent snapshot, recomputing first if the graph
    /// has advanced past it.
    ///
    /// Concurrent callers that find the cache stale coalesce: one runs
    /// the solve, the rest wait on it and share the result.
    ///
    /// # Errors
    /// Returns an internal error if a lock is poisoned.
    pub fn get_snapshot(&self) -> TrustResult<Arc<ReputationSnapshot>> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| TrustError::internal("rank cache lock poisoned"))?;
        loop {
            if let CacheState::Ready(snap) = &slot.state {
                if !slot.stale && snap.version == self.graph.version() {
                    return Ok(Arc::clone(snap));
                }
            }
            if matches!(slot.state, CacheState::Computing) {
                // Coalesce onto the in-flight computation, then re-check
                // freshness from the top.
                slot = self
                    .ready
                    .wait(slot)
                    .map_err(|_| TrustError::internal("rank cache lock poisoned"))?;
                continue;
            }

            // Absent, or ready but stale: this caller computes.
            slot.state = CacheState::Computing;
            slot.stale = false;
            drop(slot);

            // Solve outside the cache lock so mutations and vouch writes
            // keep flowing during the computation.
            let result = self
                .graph
                .snapshot()
                .map(|view| Arc::new(self.build(&view)));

            slot = self
                .slot
                .lock()
                .map_err(|_| TrustError::internal("rank cache lock poisoned"))?;
            return match result {
                Ok(snap) => {
                    slot.state = CacheState::Ready(Arc::clone(&snap));
                    self.ready.notify_all();
                    Ok(snap)
                }
                Err(e) => {
                    // Roll back so waiters do not hang on a wedged state.
                    slot.state = CacheState::Absent;
                    self.ready.notify_all();
                    Err(e)
                }
            };
        }
    }

    /// Percentage of snapshot agents whose composite score is strictly
    /// below this agent's. Returns 0 for an agent absent from the
    /// snapshot (new agent, not yet scored).
    ///
    /// # Errors
    /// Propagates snapshot recomputation errors.
    #[allow(clippy::cast_precision_loss)]
    pub fn percentile(&self, agent: &AgentId) -> TrustResult<f64> {
        let snap = self.get_snapshot()?;
        let Some(entry) = snap.get(agent) else {
            return Ok(0.0);
        };
        let total = snap.len();
        if total == 0 {
            return Ok(0.0);
        }
        let below = snap
            .entries
            .values()
            .filter(|r| r.composite < entry.composite)
            .count();
        Ok(below as f64 / total as f64 * 100.0)
    }

    /// Top agents by composite score, descending; ties break on agent ID
    /// for deterministic output.
    ///
    /// # Errors
    /// Propagates snapshot recomputation errors.
    pub fn leaderboard(&self, limit: usize) -> TrustResult<Vec<(AgentId, AgentReputation)>> {
        let snap = self.get_snapshot()?;
        let mut rows: Vec<(AgentId, AgentReputation)> = snap
            .entries
            .iter()
            .map(|(a, r)| (a.clone(), *r))
            .collect();
        rows.sort_by(|(a_id, a), (b_id, b)| {
            b.composite
                .partial_cmp(&a.composite)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a_id.cmp(b_id))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    /// Install a snapshot restored from durable storage without running
    /// the solver.
    ///
    /// # Errors
    /// Returns an internal error if the cache lock is poisoned.
    pub fn restore(&self, snapshot: ReputationSnapshot) -> TrustResult<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| TrustError::internal("rank cache lock poisoned"))?;
        slot.state = CacheState::Ready(Arc::new(snapshot));
        slot.stale = false;
        Ok(())
    }

    fn build(&self, view: &GraphView) -> ReputationSnapshot {
        if view.nodes.is_empty() {
            return ReputationSnapshot::empty(view.version);
        }

        let outcome = self.solver.solve(view);
        let counts = view.interaction_counts();

        let entries = view
            .nodes
            .iter()
            .map(|agent| {
                let influence = outcome.normalized.get(agent).copied().unwrap_or(0.0);
                let interactions = counts.get(agent).copied().unwrap_or(0);
                let composite =
                    self.scorer
                        .score(influence, interactions, view.karma_of(agent));
                (
                    agent.clone(),
                    AgentReputation {
                        influence,
                        composite,
                        interactions,
                    },
                )
            })
            .collect();

        ReputationSnapshot {
            version: view.version,
            computed_at: Utc::now(),
            iterations_used: outcome.iterations,
            converged: outcome.converged,
            entries,
        }
    }
}
