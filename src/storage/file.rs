//! Checksummed single-file state backend.
//!
//! The durable layout is deliberately simple: one file holding the whole
//! [`PersistedState`], replaced atomically on every flush. Framing:
//!
//! ```text
//! [magic: 4 bytes "TGRF"][version: 1 byte]
//! [length: 4 bytes LE][data: N bytes JSON][crc32: 4 bytes LE]
//! ```
//!
//! Writes go to a sibling temp file first and are renamed into place, so
//! a crash mid-flush leaves the previous state intact.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crc32fast::Hasher;

use crate::storage::traits::{PersistedState, StateBackend, StorageError};

/// Magic bytes identifying a trustgraph state file.
pub const MAGIC: [u8; 4] = *b"TGRF";

/// Current file format version.
const FORMAT_VERSION: u8 = 1;

/// Reject unreasonably large state payloads (100 MB).
const MAX_PAYLOAD_SIZE: usize = 100 * 1024 * 1024;

fn io_err(context: &str, e: &std::io::Error) -> StorageError {
    StorageError::Backend(format!("{context}: {e}"))
}

fn encode(state: &PersistedState) -> Result<Vec<u8>, StorageError> {
    let data = serde_json::to_vec(state)
        .map_err(|e| StorageError::Serialization(format!("state encoding failed: {e}")))?;

    let mut hasher = Hasher::new();
    hasher.update(&data);
    let crc = hasher.finalize();

    #[allow(clippy::cast_possible_truncation)]
    let len = data.len() as u32;

    let mut out = Vec::with_capacity(4 + 1 + 4 + data.len() + 4);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&data);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

fn decode(reader: &mut impl Read) -> Result<PersistedState, StorageError> {
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .map_err(|e| io_err("reading magic", &e))?;
    if magic != MAGIC {
        return Err(StorageError::Corrupt(format!(
            "invalid magic bytes: expected {MAGIC:?}, got {magic:?}"
        )));
    }

    let mut version = [0u8; 1];
    reader
        .read_exact(&mut version)
        .map_err(|e| io_err("reading version", &e))?;
    if version[0] != FORMAT_VERSION {
        return Err(StorageError::Corrupt(format!(
            "unsupported format version: {} (expected {FORMAT_VERSION})",
            version[0]
        )));
    }

    let mut len_bytes = [0u8; 4];
    reader
        .read_exact(&mut len_bytes)
        .map_err(|e| io_err("reading length", &e))?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    if len > MAX_PAYLOAD_SIZE {
        return Err(StorageError::Corrupt(format!(
            "payload size {len} exceeds maximum {MAX_PAYLOAD_SIZE}"
        )));
    }

    let mut data = vec![0u8; len];
    reader
        .read_exact(&mut data)
        .map_err(|e| io_err("reading payload", &e))?;

    let mut crc_bytes = [0u8; 4];
    reader
        .read_exact(&mut crc_bytes)
        .map_err(|e| io_err("reading checksum", &e))?;
    let stored_crc = u32::from_le_bytes(crc_bytes);

    let mut hasher = Hasher::new();
    hasher.update(&data);
    let computed_crc = hasher.finalize();
    if stored_crc != computed_crc {
        return Err(StorageError::Corrupt(format!(
            "CRC mismatch: stored={stored_crc:08x}, computed={computed_crc:08x}"
        )));
    }

    serde_json::from_slice(&data)
        .map_err(|e| StorageError::Serialization(format!("state decoding failed: {e}")))
}

/// File-backed state backend with replace-on-write semantics.
#[derive(Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    /// Create a backend storing state at `path`. The file need not exist
    /// yet; the first `load` then returns `None`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The state file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl StateBackend for FileBackend {
    fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let mut file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_err("opening state file", &e)),
        };
        decode(&mut file).map(Some)
    }

    fn store(&self, state: &PersistedState) -> Result<(), StorageError> {
        let bytes = encode(state)?;
        let tmp = self.tmp_path();

        let mut file = fs::File::create(&tmp).map_err(|e| io_err("creating temp file", &e))?;
        file.write_all(&bytes)
            .map_err(|e| io_err("writing state", &e))?;
        file.sync_all().map_err(|e| io_err("syncing state", &e))?;
        drop(file);

        fs::rename(&tmp, &self.path).map_err(|e| io_err("replacing state file", &e))
    }
}
