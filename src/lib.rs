//! # Trustgraph - Trust Graph & Reputation Scoring Engine
//!
//! Trustgraph computes trust and reputation scores for participants
//! ("agents") in a multi-service platform from a graph of observed
//! interactions, endorsements ("vouches"), and explicit trust
//! declarations.
//!
//! ## Core Concepts
//!
//! - **Agent**: a participant node, created implicitly on first edge reference
//! - **Edge**: a directed, typed, weighted relationship (interaction, vouch, trust)
//! - **Influence score**: normalized output of a damped iterative walk over the graph
//! - **Composite score**: weighted blend of external karma, influence, and activity
//! - **Snapshot**: an immutable, versioned set of computed scores for all agents
//! - **Safety tier**: a vouch-weighted classification of a rated artifact
//!
//! ## Usage
//!
//! ```rust
//! use trustgraph::{AgentId, EngineConfig, ReputationEngine};
//!
//! let engine = ReputationEngine::new(EngineConfig::default())?;
//!
//! let alice = AgentId::new("alice")?;
//! let bob = AgentId::new("bob")?;
//! engine.record_interaction(alice.clone(), bob.clone(), true)?;
//! engine.declare_trust(alice.clone(), bob.clone(), None)?;
//! engine.set_karma(alice.clone(), 80.0)?;
//!
//! let reputation = engine.reputation(&bob)?;
//! assert!(reputation.is_some());
//! # Ok::<(), trustgraph::TrustError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod agent;
pub mod composite;
pub mod edge;
pub mod engine;
pub mod error;
pub mod graph;
pub mod rank;
pub mod safety;
pub mod snapshot;
pub mod solver;
pub mod storage;
pub mod vouch;

// Re-export primary types at crate root for convenience
pub use agent::AgentId;
pub use composite::{CompositeScorer, ScoreWeights};
pub use edge::{Edge, EdgeId, EdgeKind};
pub use engine::{EngineConfig, RefreshMode, ReputationEngine};
pub use error::{TrustError, TrustResult, ValidationError};
pub use graph::{GraphStore, GraphView};
pub use rank::RankCache;
pub use safety::{SafetyClassifier, SafetyRating, SafetyTier, VouchStore};
pub use snapshot::{AgentReputation, ReputationSnapshot};
pub use solver::{InfluenceOutcome, InfluenceSolver, SolverConfig};
pub use storage::{MemoryBackend, PersistedState, StateBackend, StorageError};
pub use vouch::{ArtifactId, VouchId, VouchRecord};

#[cfg(feature = "persistent")]
pub use storage::FileBackend;
