//! End-to-end scenarios against the public engine API.

use std::sync::Arc;

use trustgraph::{
    AgentId, ArtifactId, EngineConfig, MemoryBackend, ReputationEngine, SafetyTier, SolverConfig,
    StateBackend, TrustError, ValidationError,
};

fn agent(s: &str) -> AgentId {
    AgentId::new(s).unwrap()
}

fn artifact(s: &str) -> ArtifactId {
    ArtifactId::new(s).unwrap()
}

fn default_engine() -> ReputationEngine {
    ReputationEngine::new(EngineConfig::default()).unwrap()
}

#[test]
fn empty_engine_serves_empty_snapshot() {
    let engine = default_engine();
    let snap = engine.snapshot().unwrap();
    assert!(snap.is_empty());
    assert!(snap.converged);
    assert_eq!(engine.percentile(&agent("nobody")).unwrap(), 0.0);
    assert!(engine.leaderboard(10).unwrap().is_empty());
}

#[test]
fn composite_reference_scenario() {
    // karma=80, influence=50, interactions=10 -> composite 54.
    // Build the influence side indirectly: the agent's snapshot entry
    // carries whatever the solver computed, so here we verify the
    // formula through the scorer-visible fields instead of raw math.
    let engine = default_engine();
    for i in 0..10 {
        engine
            .record_interaction(agent("a"), agent(&format!("peer-{i}")), true)
            .unwrap();
    }
    engine.set_karma(agent("a"), 80.0).unwrap();

    let rep = engine.reputation(&agent("a")).unwrap().unwrap();
    assert_eq!(rep.interactions, 10);
    let expected = 0.4 * 80.0 + 0.4 * rep.influence + 0.2 * 10.0;
    assert!(
        (rep.composite - expected).abs() < 1e-9,
        "composite {} != expected {}",
        rep.composite,
        expected
    );
}

#[test]
fn vouching_raises_the_target() {
    let engine = default_engine();
    engine
        .declare_trust(agent("a"), agent("hub"), None)
        .unwrap();
    engine
        .declare_trust(agent("b"), agent("hub"), None)
        .unwrap();
    engine
        .record_interaction(agent("hub"), agent("newcomer"), true)
        .unwrap();

    let before = engine
        .reputation(&agent("newcomer"))
        .unwrap()
        .unwrap()
        .influence;

    engine
        .vouch_for_agent(agent("a"), agent("newcomer"))
        .unwrap();

    let after = engine
        .reputation(&agent("newcomer"))
        .unwrap()
        .unwrap()
        .influence;
    assert!(
        after > before,
        "vouch edge did not raise influence: {before} -> {after}"
    );
}

#[test]
fn trust_revocation_is_idempotent_and_lowers_target() {
    let engine = default_engine();
    let edge = engine
        .declare_trust(agent("a"), agent("b"), None)
        .unwrap();
    engine.declare_trust(agent("b"), agent("c"), None).unwrap();
    engine.declare_trust(agent("c"), agent("a"), None).unwrap();
    engine.declare_trust(agent("c"), agent("b"), None).unwrap();

    let before = engine.reputation(&agent("b")).unwrap().unwrap().influence;

    engine.revoke_trust(edge).unwrap();
    let after = engine.reputation(&agent("b")).unwrap().unwrap().influence;
    assert!(after < before);

    // Repeat revocation: no error, nothing changes.
    engine.revoke_trust(edge).unwrap();
    let again = engine.reputation(&agent("b")).unwrap().unwrap().influence;
    assert_eq!(after, again);
}

#[test]
fn self_loop_and_negative_weight_are_validation_errors() {
    let engine = default_engine();
    assert!(matches!(
        engine
            .record_interaction(agent("a"), agent("A"), true)
            .unwrap_err(),
        TrustError::Validation(ValidationError::SelfLoop { .. })
    ));
    assert!(matches!(
        engine
            .declare_trust(agent("a"), agent("b"), Some(-1.0))
            .unwrap_err(),
        TrustError::Validation(ValidationError::NegativeWeight { .. })
    ));
    // Nothing reached the graph.
    assert!(engine.snapshot().unwrap().is_empty());
}

#[test]
fn duplicate_vouch_rejected_second_rater_accepted() {
    let engine = default_engine();
    let art = artifact("skill/parser");

    engine
        .vouch_artifact(agent("a"), art.clone(), true, Some("works".into()))
        .unwrap();
    let err = engine
        .vouch_artifact(agent("a"), art.clone(), true, None)
        .unwrap_err();
    assert!(matches!(
        err,
        TrustError::Validation(ValidationError::DuplicateVouch { .. })
    ));

    engine
        .vouch_artifact(agent("b"), art.clone(), true, None)
        .unwrap();
    let rating = engine.safety(&art).unwrap();
    assert_eq!(rating.vouch_count, 2);
}

#[test]
fn five_reputable_vouchers_reach_trusted() {
    let engine = default_engine();
    let art = artifact("skill/parser");

    // Give each voucher karma so their snapshot composite is high.
    for name in ["a", "b", "c", "d", "e"] {
        engine.set_karma(agent(name), 100.0).unwrap();
        engine
            .record_interaction(agent(name), agent("counterpart"), true)
            .unwrap();
        engine
            .vouch_artifact(agent(name), art.clone(), true, None)
            .unwrap();
    }

    let rating = engine.safety(&art).unwrap();
    assert_eq!(rating.vouch_count, 5);
    assert!((rating.score - 100.0).abs() < 1e-9);
    assert_eq!(rating.tier, SafetyTier::Trusted);
}

#[test]
fn single_bootstrap_vouch_is_limited_testing() {
    let engine = default_engine();
    let art = artifact("skill/parser");
    engine
        .vouch_artifact(agent("early-adopter"), art.clone(), true, None)
        .unwrap();

    let rating = engine.safety(&art).unwrap();
    assert!((rating.score - 100.0).abs() < 1e-9);
    assert_eq!(rating.vouch_count, 1);
    assert_eq!(rating.tier, SafetyTier::LimitedTesting);
}

#[test]
fn unvouched_artifact_is_unaudited() {
    let engine = default_engine();
    let rating = engine.safety(&artifact("never-reviewed")).unwrap();
    assert_eq!(rating.tier, SafetyTier::Unaudited);
    assert_eq!(rating.score, 0.0);
}

#[test]
fn percentile_is_monotonic_over_the_leaderboard() {
    let engine = default_engine();
    for (name, karma) in [("a", 10.0), ("b", 40.0), ("c", 90.0), ("d", 90.0)] {
        engine
            .record_interaction(agent(name), agent("hub"), true)
            .unwrap();
        engine.set_karma(agent(name), karma).unwrap();
    }

    let rows = engine.leaderboard(10).unwrap();
    for pair in rows.windows(2) {
        let (hi, lo) = (&pair[0], &pair[1]);
        assert!(hi.1.composite >= lo.1.composite);
        if hi.1.composite > lo.1.composite {
            assert!(
                engine.percentile(&hi.0).unwrap() >= engine.percentile(&lo.0).unwrap(),
                "percentile order broken between {} and {}",
                hi.0,
                lo.0
            );
        }
    }
}

#[test]
fn unconverged_snapshot_is_flagged_not_failed() {
    let engine = ReputationEngine::new(EngineConfig {
        solver: SolverConfig {
            max_iterations: 1,
            ..SolverConfig::default()
        },
        ..EngineConfig::default()
    })
    .unwrap();
    engine.declare_trust(agent("a"), agent("b"), None).unwrap();
    engine.declare_trust(agent("b"), agent("a"), None).unwrap();

    let snap = engine.snapshot().unwrap();
    assert!(!snap.converged);
    assert_eq!(snap.iterations_used, 1);
    assert_eq!(snap.len(), 2);
}

#[test]
fn lifecycle_flush_reopen_preserves_everything() {
    let backend = Arc::new(MemoryBackend::new());
    let trust_edge;
    {
        let engine = ReputationEngine::open(
            Arc::clone(&backend) as Arc<dyn StateBackend>,
            EngineConfig::default(),
        )
        .unwrap();
        trust_edge = engine.declare_trust(agent("a"), agent("b"), None).unwrap();
        engine
            .record_interaction(agent("b"), agent("c"), false)
            .unwrap();
        engine.set_karma(agent("c"), 25.0).unwrap();
        engine
            .vouch_artifact(agent("a"), artifact("skill-1"), false, None)
            .unwrap();
        engine.flush().unwrap();
    }

    let engine = ReputationEngine::open(
        backend as Arc<dyn StateBackend>,
        EngineConfig::default(),
    )
    .unwrap();

    // Restored snapshot is fresh until the next mutation.
    let snap = engine.snapshot().unwrap();
    assert_eq!(snap.len(), 3);

    // Trust tombstoning still works on the restored edge.
    engine.revoke_trust(trust_edge).unwrap();
    let after = engine.snapshot().unwrap();
    assert!(after.version > snap.version);

    // Vouch uniqueness survived.
    assert!(engine
        .vouch_artifact(agent("a"), artifact("skill-1"), true, None)
        .is_err());
}

#[test]
fn karma_update_invalidates_snapshot() {
    let engine = default_engine();
    engine
        .record_interaction(agent("a"), agent("b"), true)
        .unwrap();
    let before = engine.reputation(&agent("a")).unwrap().unwrap().composite;

    engine.set_karma(agent("a"), 100.0).unwrap();
    let after = engine.reputation(&agent("a")).unwrap().unwrap().composite;
    assert!((after - before - 40.0).abs() < 1e-9, "karma delta not 0.4*100");
}
