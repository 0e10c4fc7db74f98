//! Durable-state backends.

mod memory;
mod traits;

#[cfg(feature = "persistent")]
mod file;

pub use memory::MemoryBackend;
pub use traits::{PersistedState, StateBackend, StorageError};

#[cfg(feature = "persistent")]
pub use file::FileBackend;
