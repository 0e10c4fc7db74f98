//! Iterative damped-influence computation.
//!
//! A weight-normalized, damped random-walk over the active edges of the
//! graph (PageRank family). One deliberate divergence from the textbook
//! formulation, inherited from the platform this engine scores: agents
//! with zero outgoing weight drop their mass instead of redistributing
//! it uniformly. Sink-heavy graphs therefore under-weight well-connected
//! sinks; switching to redistribution would materially reorder rankings
//! and is a product decision, not a bug fix.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::ValidationError;
use crate::graph::GraphView;

/// Solver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Damping factor `d` of the walk.
    pub damping: f64,
    /// Convergence tolerance on the sum of absolute score deltas.
    pub tolerance: f64,
    /// Hard iteration cap; the only latency bound the solver has.
    pub max_iterations: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 100,
        }
    }
}

impl SolverConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidConfig`] if the damping factor is
    /// outside (0, 1), the tolerance is not positive, or the iteration cap
    /// is zero.
    pub fn validate(self) -> Result<Self, ValidationError> {
        if !(self.damping > 0.0 && self.damping < 1.0) {
            return Err(ValidationError::InvalidConfig {
                reason: format!("damping must be in (0, 1), got {}", self.damping),
            });
        }
        if !(self.tolerance > 0.0) {
            return Err(ValidationError::InvalidConfig {
                reason: format!("tolerance must be positive, got {}", self.tolerance),
            });
        }
        if self.max_iterations == 0 {
            return Err(ValidationError::InvalidConfig {
                reason: "max_iterations must be at least 1".to_string(),
            });
        }
        Ok(self)
    }
}

/// Result of one influence computation.
#[derive(Debug, Clone, PartialEq)]
pub struct InfluenceOutcome {
    /// Raw damped-walk scores (sum ≈ 1.0 modulo dangling mass).
    pub raw: HashMap<AgentId, f64>,
    /// Scores normalized to [0, 100] by the maximum raw score.
    pub normalized: HashMap<AgentId, f64>,
    /// Iterations actually run.
    pub iterations: u32,
    /// True when the delta sum fell below tolerance before the cap.
    pub converged: bool,
}

impl InfluenceOutcome {
    fn empty() -> Self {
        Self {
            raw: HashMap::new(),
            normalized: HashMap::new(),
            iterations: 0,
            converged: true,
        }
    }
}

/// Damped, weight-normalized iterative influence solver.
///
/// Never fails for a well-formed graph: non-negative edge weights are a
/// precondition enforced at edge insertion, and an empty graph yields an
/// empty outcome.
#[derive(Debug, Clone, Default)]
pub struct InfluenceSolver {
    config: SolverConfig,
}

impl InfluenceSolver {
    /// Create a solver with the given configuration.
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Run the influence computation against a consistent graph view.
    #[must_use]
    pub fn solve(&self, view: &GraphView) -> InfluenceOutcome {
        let nodes: Vec<&AgentId> = view.nodes.iter().collect();
        let n = nodes.len();
        if n == 0 {
            return InfluenceOutcome::empty();
        }

        // Only active edges participate; tombstoned trust edges are
        // invisible to the walk. Zero-weight edges contribute nothing
        // either way.
        let active: Vec<(&AgentId, &AgentId, f64)> = view
            .active_edges()
            .filter(|e| e.weight > 0.0)
            .map(|e| (&e.from, &e.to, e.weight))
            .collect();

        if active.is_empty() {
            // No influence flows anywhere: every agent scores zero after
            // normalization, and there is nothing to iterate on.
            let zeros: HashMap<AgentId, f64> =
                nodes.iter().map(|&a| (a.clone(), 0.0)).collect();
            return InfluenceOutcome {
                raw: zeros.clone(),
                normalized: zeros,
                iterations: 1,
                converged: true,
            };
        }

        let mut out_weight: HashMap<&AgentId, f64> = HashMap::new();
        for &(from, _, weight) in &active {
            *out_weight.entry(from).or_insert(0.0) += weight;
        }

        #[allow(clippy::cast_precision_loss)]
        let n_f = n as f64;
        let d = self.config.damping;
        let base = (1.0 - d) / n_f;

        let mut scores: HashMap<&AgentId, f64> =
            nodes.iter().map(|&a| (a, 1.0 / n_f)).collect();

        let mut iterations = 0;
        let mut converged = false;
        while iterations < self.config.max_iterations {
            let mut next: HashMap<&AgentId, f64> =
                nodes.iter().map(|&a| (a, base)).collect();

            for &(from, to, weight) in &active {
                let source_score = scores.get(from).copied().unwrap_or(0.0);
                let total_out = out_weight.get(from).copied().unwrap_or(0.0);
                if total_out > 0.0 {
                    if let Some(slot) = next.get_mut(to) {
                        *slot += d * source_score * weight / total_out;
                    }
                }
            }

            let delta: f64 = nodes
                .iter()
                .map(|&a| {
                    let old = scores.get(a).copied().unwrap_or(0.0);
                    let new = next.get(a).copied().unwrap_or(0.0);
                    (new - old).abs()
                })
                .sum();

            scores = next;
            iterations += 1;

            if delta < self.config.tolerance {
                converged = true;
                break;
            }
        }

        let max = scores.values().fold(0.0f64, |acc, &v| acc.max(v));
        let normalized: HashMap<AgentId, f64> = if max > 0.0 {
            scores
                .iter()
                .map(|(&a, &v)| (a.clone(), v / max * 100.0))
                .collect()
        } else {
            scores.keys().map(|&a| (a.clone(), 0.0)).collect()
        };

        InfluenceOutcome {
            raw: scores.into_iter().map(|(a, v)| (a.clone(), v)).collect(),
            normalized,
            iterations,
            converged,
        }
    }
}
