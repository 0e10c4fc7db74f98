//! Vouch storage and safety classification.
//!
//! Safety ratings are derived on demand from live vouch records plus the
//! latest reputation snapshot's composite scores, and never cached:
//! vouches arrive concurrently with snapshot staleness, so a cached
//! rating would go quietly wrong. The snapshot itself may lag the graph;
//! that staleness is an accepted design property.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::error::{TrustError, TrustResult, ValidationError};
use crate::snapshot::ReputationSnapshot;
use crate::vouch::{ArtifactId, VouchId, VouchRecord};

/// Composite score assumed for a voucher with no snapshot entry yet.
///
/// This exact bootstrap constant matters: it lets early adopters lend a
/// small but non-zero weight to artifacts before the first recompute has
/// ever scored them.
pub const DEFAULT_VOUCHER_COMPOSITE: f64 = 10.0;

/// Multiplier applied to a voucher's weight when the vouch outcome failed.
pub const FAILED_VOUCH_FACTOR: f64 = 0.5;

fn lock_err(context: &'static str) -> TrustError {
    TrustError::internal(format!("poisoned lock: {context}"))
}

/// Safety tier of a rated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SafetyTier {
    /// No vouches at all.
    Unaudited,
    /// At least one vouch.
    LimitedTesting,
    /// At least 2 vouches and a weighted score of 40 or better.
    CommunityTested,
    /// At least 5 vouches and a weighted score of 70 or better.
    Trusted,
}

impl fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unaudited => write!(f, "unaudited"),
            Self::LimitedTesting => write!(f, "limited-testing"),
            Self::CommunityTested => write!(f, "community-tested"),
            Self::Trusted => write!(f, "trusted"),
        }
    }
}

/// Derived safety rating for one artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyRating {
    /// The rated artifact.
    pub artifact: ArtifactId,
    /// Tier reached under the threshold ladder.
    pub tier: SafetyTier,
    /// Reputation-weighted pass rate, scaled 0-100.
    pub score: f64,
    /// Number of vouches considered.
    pub vouch_count: usize,
    /// Sum of outcome-adjusted voucher weights (the score's numerator).
    pub weighted_mass: f64,
}

#[derive(Debug, Default)]
struct VouchState {
    records: Vec<VouchRecord>,
    by_pair: HashMap<(AgentId, ArtifactId), usize>,
    by_artifact: HashMap<ArtifactId, Vec<usize>>,
}

impl VouchState {
    fn append(&mut self, record: VouchRecord) -> VouchId {
        let id = record.id;
        let idx = self.records.len();
        self.by_pair
            .insert((record.rater.clone(), record.artifact.clone()), idx);
        self.by_artifact
            .entry(record.artifact.clone())
            .or_default()
            .push(idx);
        self.records.push(record);
        id
    }
}

/// Thread-safe vouch record store.
///
/// Independent of the graph store's locking: vouch writes proceed
/// concurrently with influence recomputation.
#[derive(Debug, Default)]
pub struct VouchStore {
    state: RwLock<VouchState>,
}

impl VouchStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a vouch record.
    ///
    /// # Errors
    /// `Validation(DuplicateVouch)` if the (rater, artifact) pair already
    /// has an active vouch. A repeat vouch is a conflict, not an update.
    pub fn insert(&self, record: VouchRecord) -> TrustResult<VouchId> {
        let mut state = self.state.write().map_err(|_| lock_err("vouch.insert"))?;
        let pair = (record.rater.clone(), record.artifact.clone());
        if state.by_pair.contains_key(&pair) {
            return Err(TrustError::Validation(ValidationError::DuplicateVouch {
                rater: record.rater.clone(),
                artifact: record.artifact.clone(),
            }));
        }
        Ok(state.append(record))
    }

    /// All vouches for one artifact, in insertion order.
    ///
    /// # Errors
    /// Returns an internal error if the store lock is poisoned.
    pub fn vouches_for(&self, artifact: &ArtifactId) -> TrustResult<Vec<VouchRecord>> {
        let state = self.state.read().map_err(|_| lock_err("vouch.vouches_for"))?;
        let Some(indices) = state.by_artifact.get(artifact) else {
            return Ok(Vec::new());
        };
        Ok(indices.iter().map(|&i| state.records[i].clone()).collect())
    }

    /// All stored records, for durable flush.
    ///
    /// # Errors
    /// Returns an internal error if the store lock is poisoned.
    pub fn all(&self) -> TrustResult<Vec<VouchRecord>> {
        let state = self.state.read().map_err(|_| lock_err("vouch.all"))?;
        Ok(state.records.clone())
    }

    /// Rebuild from durable storage on init. Replaces all current state.
    ///
    /// # Errors
    /// Returns an internal error if the store lock is poisoned.
    pub fn restore(&self, records: Vec<VouchRecord>) -> TrustResult<()> {
        let mut state = self.state.write().map_err(|_| lock_err("vouch.restore"))?;
        let mut fresh = VouchState::default();
        for record in records {
            fresh.append(record);
        }
        *state = fresh;
        Ok(())
    }
}

/// Computes vouch-weighted safety tiers for rated artifacts.
#[derive(Debug, Default)]
pub struct SafetyClassifier {
    store: VouchStore,
}

impl SafetyClassifier {
    /// Create a classifier with an empty vouch store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying vouch store.
    #[must_use]
    pub const fn store(&self) -> &VouchStore {
        &self.store
    }

    /// Record a new vouch.
    ///
    /// # Errors
    /// `Validation(DuplicateVouch)` on a repeat (rater, artifact) pair.
    pub fn vouch(
        &self,
        rater: AgentId,
        artifact: ArtifactId,
        passed: bool,
        evidence: Option<String>,
    ) -> TrustResult<VouchId> {
        self.store
            .insert(VouchRecord::new(rater, artifact, passed, evidence))
    }

    /// Classify an artifact against the given reputation snapshot.
    ///
    /// Each vouch is weighted by its rater's composite score (or the
    /// bootstrap default for unscored raters), halved for failed
    /// outcomes. The rating is a reputation-weighted pass rate on a
    /// 0-100 scale, pushed through the tier threshold ladder.
    ///
    /// # Errors
    /// Returns an internal error if the vouch store lock is poisoned.
    pub fn classify(
        &self,
        artifact: &ArtifactId,
        snapshot: &ReputationSnapshot,
    ) -> TrustResult<SafetyRating> {
        let vouches = self.store.vouches_for(artifact)?;
        if vouches.is_empty() {
            return Ok(SafetyRating {
                artifact: artifact.clone(),
                tier: SafetyTier::Unaudited,
                score: 0.0,
                vouch_count: 0,
                weighted_mass: 0.0,
            });
        }

        let mut weighted_mass = 0.0;
        let mut total_voucher_score = 0.0;
        for vouch in &vouches {
            let voucher_score = snapshot.composite_or(&vouch.rater, DEFAULT_VOUCHER_COMPOSITE);
            let outcome_factor = if vouch.passed { 1.0 } else { FAILED_VOUCH_FACTOR };
            weighted_mass += voucher_score * outcome_factor;
            total_voucher_score += voucher_score;
        }

        let score = if total_voucher_score > 0.0 {
            weighted_mass / total_voucher_score * 100.0
        } else {
            0.0
        };

        let vouch_count = vouches.len();
        // First match wins, top tier down.
        let tier = if vouch_count >= 5 && score >= 70.0 {
            SafetyTier::Trusted
        } else if vouch_count >= 2 && score >= 40.0 {
            SafetyTier::CommunityTested
        } else {
            SafetyTier::LimitedTesting
        };

        Ok(SafetyRating {
            artifact: artifact.clone(),
            tier,
            score,
            vouch_count,
            weighted_mass,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::AgentReputation;

    fn agent(s: &str) -> AgentId {
        AgentId::new(s).unwrap()
    }

    fn artifact(s: &str) -> ArtifactId {
        ArtifactId::new(s).unwrap()
    }

    fn snapshot_with(composites: &[(&str, f64)]) -> ReputationSnapshot {
        let mut snap = ReputationSnapshot::empty(1);
        for (name, composite) in composites {
            snap.entries.insert(
                agent(name),
                AgentReputation {
                    influence: 0.0,
                    composite: *composite,
                    interactions: 0,
                },
            );
        }
        snap
    }

    #[test]
    fn no_vouches_is_unaudited() {
        let classifier = SafetyClassifier::new();
        let rating = classifier
            .classify(&artifact("skill-1"), &ReputationSnapshot::empty(1))
            .unwrap();
        assert_eq!(rating.tier, SafetyTier::Unaudited);
        assert_eq!(rating.score, 0.0);
        assert_eq!(rating.vouch_count, 0);
    }

    #[test]
    fn duplicate_vouch_is_rejected_but_second_rater_counts() {
        let classifier = SafetyClassifier::new();
        let art = artifact("skill-1");
        classifier
            .vouch(agent("a"), art.clone(), true, None)
            .unwrap();

        let err = classifier
            .vouch(agent("a"), art.clone(), false, None)
            .unwrap_err();
        assert!(matches!(
            err,
            TrustError::Validation(ValidationError::DuplicateVouch { .. })
        ));

        classifier
            .vouch(agent("b"), art.clone(), true, None)
            .unwrap();
        let rating = classifier
            .classify(&art, &ReputationSnapshot::empty(1))
            .unwrap();
        assert_eq!(rating.vouch_count, 2);
    }

    #[test]
    fn five_strong_passing_vouches_reach_trusted() {
        let classifier = SafetyClassifier::new();
        let art = artifact("skill-1");
        let raters = ["a", "b", "c", "d", "e"];
        for name in raters {
            classifier
                .vouch(agent(name), art.clone(), true, None)
                .unwrap();
        }
        let snap = snapshot_with(&raters.map(|n| (n, 70.0)));
        let rating = classifier.classify(&art, &snap).unwrap();
        assert!((rating.score - 100.0).abs() < 1e-9);
        assert_eq!(rating.vouch_count, 5);
        assert_eq!(rating.tier, SafetyTier::Trusted);
    }

    #[test]
    fn single_default_weight_vouch_is_limited_testing() {
        // One passing vouch from an unscored rater: weighted score is a
        // perfect 100, but the count gate keeps the tier down.
        let classifier = SafetyClassifier::new();
        let art = artifact("skill-1");
        classifier
            .vouch(agent("newbie"), art.clone(), true, None)
            .unwrap();
        let rating = classifier
            .classify(&art, &ReputationSnapshot::empty(1))
            .unwrap();
        assert!((rating.score - 100.0).abs() < 1e-9);
        assert_eq!(rating.weighted_mass, DEFAULT_VOUCHER_COMPOSITE);
        assert_eq!(rating.tier, SafetyTier::LimitedTesting);
    }

    #[test]
    fn failed_vouches_halve_their_weight() {
        let classifier = SafetyClassifier::new();
        let art = artifact("skill-1");
        classifier
            .vouch(agent("a"), art.clone(), true, None)
            .unwrap();
        classifier
            .vouch(agent("b"), art.clone(), false, None)
            .unwrap();
        let snap = snapshot_with(&[("a", 50.0), ("b", 50.0)]);
        let rating = classifier.classify(&art, &snap).unwrap();
        // (50 + 25) / 100 = 75%
        assert!((rating.score - 75.0).abs() < 1e-9);
        assert_eq!(rating.tier, SafetyTier::CommunityTested);
    }

    #[test]
    fn all_failed_vouches_score_half() {
        let classifier = SafetyClassifier::new();
        let art = artifact("skill-1");
        for name in ["a", "b", "c"] {
            classifier
                .vouch(agent(name), art.clone(), false, None)
                .unwrap();
        }
        let snap = snapshot_with(&[("a", 50.0), ("b", 50.0), ("c", 50.0)]);
        let rating = classifier.classify(&art, &snap).unwrap();
        // All-failed still scores 50 (half weight / full weight), which
        // clears the community gate of 40 with 3 vouches.
        assert!((rating.score - 50.0).abs() < 1e-9);
        assert_eq!(rating.tier, SafetyTier::CommunityTested);
    }

    #[test]
    fn tier_serde_uses_kebab_case() {
        let json = serde_json::to_string(&SafetyTier::CommunityTested).unwrap();
        assert_eq!(json, "\"community-tested\"");
        assert_eq!(SafetyTier::LimitedTesting.to_string(), "limited-testing");
    }

    #[test]
    fn restore_replaces_state_and_reapplies_uniqueness() {
        let store = VouchStore::new();
        let art = artifact("skill-1");
        let record = VouchRecord::new(agent("a"), art.clone(), true, None);
        store.restore(vec![record]).unwrap();

        let err = store
            .insert(VouchRecord::new(agent("a"), art.clone(), true, None))
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.vouches_for(&art).unwrap().len(), 1);
    }
}
