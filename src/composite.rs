//! Composite reputation scoring.
//!
//! Folds the external karma signal, the normalized influence score, and
//! raw activity into one weighted number. The activity term is the
//! interaction count itself, not normalized: karma and influence live on
//! a 0-100 scale while activity is unbounded, so very active agents can
//! outgrow the other two factors. That scale inconsistency is inherited
//! from the platform's scoring formula and is kept intact; rescaling it
//! would shift every published ranking.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Weighting coefficients of the composite formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the external karma signal.
    pub karma: f64,
    /// Weight of the normalized influence score.
    pub influence: f64,
    /// Weight of the raw interaction count.
    pub activity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            karma: 0.4,
            influence: 0.4,
            activity: 0.2,
        }
    }
}

impl ScoreWeights {
    /// Validate the weights.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidConfig`] if any weight is
    /// negative or non-finite.
    pub fn validate(self) -> Result<Self, ValidationError> {
        for (name, value) in [
            ("karma", self.karma),
            ("influence", self.influence),
            ("activity", self.activity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ValidationError::InvalidConfig {
                    reason: format!("score weight '{name}' must be non-negative, got {value}"),
                });
            }
        }
        Ok(self)
    }
}

/// Combines karma, influence, and activity into one score.
#[derive(Debug, Clone, Copy, Default)]
pub struct CompositeScorer {
    weights: ScoreWeights,
}

impl CompositeScorer {
    /// Create a scorer with the given weights.
    #[must_use]
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    /// The active weights.
    #[must_use]
    pub const fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    /// Compute the composite score.
    ///
    /// `influence` is expected on the 0-100 normalized scale; `karma` is
    /// an opaque external number defaulting to 0 for agents the outside
    /// reputation source has never supplied.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn score(&self, influence: f64, interactions: u64, karma: f64) -> f64 {
        self.weights.karma * karma
            + self.weights.influence * influence
            + self.weights.activity * interactions as f64
    }
}
