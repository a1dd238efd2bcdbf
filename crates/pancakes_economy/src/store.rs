//! # Snapshot Store
//!
//! **The Persistence Port**
//!
//! The tracker saves the whole [`StudyState`] after every mutating
//! operation, loads it once at startup and clears it on a full reset.
//!
//! ## Guarantees
//!
//! 1. **Integrity**: every snapshot carries a CRC32; a torn or edited file is rejected
//! 2. **Atomic replace**: the file store writes a sibling temp file and renames it
//! 3. **Best-effort load**: anything unreadable is reported as
//!    `MalformedPersistedState` and the tracker falls back to defaults
//!
//! ## Format
//!
//! ```text
//! [4 bytes: magic "SPCK"]
//! [4 bytes: version]
//! [4 bytes: payload length]
//! [N bytes: JSON payload (the StudyState record)]
//! [4 bytes: CRC32 of everything above]
//! ```
//!
//! A bare JSON object (no frame) is also accepted on load, which is what
//! the browser build's storage export looks like.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::{EconomyError, EconomyResult};
use crate::state::StudyState;

/// Magic bytes identifying a snapshot.
const SNAPSHOT_MAGIC: &[u8; 4] = b"SPCK";

/// Current snapshot format version.
const SNAPSHOT_VERSION: u32 = 1;

/// Magic + version + length.
const HEADER_LEN: usize = 12;

/// Trailing CRC32.
const CRC_LEN: usize = 4;

/// Where the tracker keeps its state between runs.
pub trait StateStore {
    /// Writes the whole state, replacing any previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::Storage` if the snapshot cannot be written.
    fn save(&self, state: &StudyState) -> EconomyResult<()>;

    /// Reads the stored state, `None` if nothing was ever saved.
    ///
    /// # Errors
    ///
    /// - `MalformedPersistedState` if the snapshot is unreadable
    /// - `Storage` if the backing medium fails
    fn load(&self) -> EconomyResult<Option<StudyState>>;

    /// Deletes the stored state.
    ///
    /// # Errors
    ///
    /// Returns `EconomyError::Storage` if the snapshot cannot be removed.
    fn clear(&self) -> EconomyResult<()>;
}

/// Serializes and frames a state.
///
/// # Errors
///
/// Returns `EconomyError::Storage` if serialization fails.
pub fn encode_snapshot(state: &StudyState) -> EconomyResult<Vec<u8>> {
    let payload = serde_json::to_vec(state)
        .map_err(|e| EconomyError::Storage(format!("Failed to serialize state: {e}")))?;
    let payload_len = u32::try_from(payload.len())
        .map_err(|_| EconomyError::Storage("State too large to snapshot".to_string()))?;

    let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + CRC_LEN);
    buf.extend_from_slice(SNAPSHOT_MAGIC);
    buf.extend_from_slice(&SNAPSHOT_VERSION.to_le_bytes());
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&payload);

    let crc = crc32fast::hash(&buf);
    buf.extend_from_slice(&crc.to_le_bytes());

    Ok(buf)
}

/// Verifies and decodes a snapshot.
///
/// # Errors
///
/// Returns `EconomyError::MalformedPersistedState` describing the first
/// check that failed.
pub fn decode_snapshot(data: &[u8]) -> EconomyResult<StudyState> {
    if data.first() == Some(&b'{') {
        return parse_payload(data);
    }

    if data.len() < HEADER_LEN + CRC_LEN {
        return Err(malformed("snapshot truncated"));
    }
    if &data[0..4] != SNAPSHOT_MAGIC {
        return Err(malformed("invalid snapshot magic"));
    }

    let version = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
    if version != SNAPSHOT_VERSION {
        return Err(malformed(&format!("unsupported snapshot version: {version}")));
    }

    let payload_len = u32::from_le_bytes([data[8], data[9], data[10], data[11]]) as usize;
    if data.len() != HEADER_LEN + payload_len + CRC_LEN {
        return Err(malformed("payload length mismatch"));
    }

    let body_end = HEADER_LEN + payload_len;
    let stored_crc = u32::from_le_bytes([
        data[body_end],
        data[body_end + 1],
        data[body_end + 2],
        data[body_end + 3],
    ]);
    if crc32fast::hash(&data[..body_end]) != stored_crc {
        return Err(malformed("CRC mismatch"));
    }

    parse_payload(&data[HEADER_LEN..body_end])
}

fn parse_payload(payload: &[u8]) -> EconomyResult<StudyState> {
    serde_json::from_slice(payload).map_err(|e| malformed(&format!("invalid state record: {e}")))
}

fn malformed(reason: &str) -> EconomyError {
    EconomyError::MalformedPersistedState(reason.to_string())
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-process store holding one framed snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<Vec<u8>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-filled with raw bytes (which need not be valid).
    #[must_use]
    pub fn with_bytes(raw: Vec<u8>) -> Self {
        Self {
            slot: Mutex::new(Some(raw)),
        }
    }

    /// Returns a copy of the stored bytes.
    #[must_use]
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.slot.lock().clone()
    }
}

impl StateStore for MemoryStore {
    fn save(&self, state: &StudyState) -> EconomyResult<()> {
        let bytes = encode_snapshot(state)?;
        *self.slot.lock() = Some(bytes);
        Ok(())
    }

    fn load(&self) -> EconomyResult<Option<StudyState>> {
        self.slot.lock().as_deref().map(decode_snapshot).transpose()
    }

    fn clear(&self) -> EconomyResult<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// Snapshot kept in a single file.
#[derive(Debug)]
pub struct FileStore {
    /// Path to the snapshot file.
    path: PathBuf,
    /// Serializes writers sharing this store.
    io_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store at `path`. Nothing is touched until the first save.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            io_lock: Mutex::new(()),
        }
    }

    /// Path to the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for FileStore {
    fn save(&self, state: &StudyState) -> EconomyResult<()> {
        let bytes = encode_snapshot(state)?;
        let _guard = self.io_lock.lock();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| EconomyError::Storage(format!("Failed to create {}: {e}", parent.display())))?;
        }

        let temp = self.temp_path();
        let mut file = File::create(&temp)
            .map_err(|e| EconomyError::Storage(format!("Failed to create snapshot: {e}")))?;
        file.write_all(&bytes)
            .map_err(|e| EconomyError::Storage(format!("Snapshot write failed: {e}")))?;
        file.sync_all()
            .map_err(|e| EconomyError::Storage(format!("Snapshot sync failed: {e}")))?;
        drop(file);

        fs::rename(&temp, &self.path)
            .map_err(|e| EconomyError::Storage(format!("Snapshot rename failed: {e}")))?;

        debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }

    fn load(&self) -> EconomyResult<Option<StudyState>> {
        let _guard = self.io_lock.lock();
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(EconomyError::Storage(format!(
                    "Failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        decode_snapshot(&data).map(Some)
    }

    fn clear(&self) -> EconomyResult<()> {
        let _guard = self.io_lock.lock();
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!(path = %self.path.display(), "snapshot removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(EconomyError::Storage(format!(
                "Failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}
