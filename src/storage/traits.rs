//! Abstract durable-state backend.
//!
//! The engine keeps three durable collections: edges (append-mostly,
//! tombstone-updatable for trust edges), vouch records (append-mostly,
//! per-pair-unique), and the single latest reputation snapshot
//! (replace-on-write). Backends persist them as one unit; nothing else
//! is durable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::AgentId;
use crate::edge::Edge;
use crate::snapshot::ReputationSnapshot;
use crate::vouch::VouchRecord;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend I/O or infrastructure fault.
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Stored data failed checksum or framing validation.
    #[error("Corrupt state file: {0}")]
    Corrupt(String),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Backend faults may clear on retry; corruption and serialization
    /// failures will not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}

/// The engine's full durable state, persisted as one unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Graph version at flush time; restored so a persisted snapshot
    /// stays servable until the first post-restart mutation.
    pub graph_version: u64,
    /// All graph edges, tombstones included.
    pub edges: Vec<Edge>,
    /// External karma table.
    pub karma: HashMap<AgentId, f64>,
    /// All vouch records.
    pub vouches: Vec<VouchRecord>,
    /// The latest reputation snapshot, if one was ever computed.
    pub snapshot: Option<ReputationSnapshot>,
}

/// Durable key-value snapshot read/write boundary.
///
/// # Safety Considerations
/// - `store` must replace the previous state atomically: a crash
///   mid-write must leave either the old state or the new one readable.
/// - Implementations must be safe for concurrent use.
pub trait StateBackend: Send + Sync {
    /// Load the persisted state, or `None` if nothing was ever stored.
    fn load(&self) -> Result<Option<PersistedState>, StorageError>;

    /// Replace the persisted state.
    fn store(&self, state: &PersistedState) -> Result<(), StorageError>;
}
