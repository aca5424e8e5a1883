//! High-score persistence.
//!
//! [`ScoreStore`] keeps a single best score under a fixed key in any
//! [`KeyValueStore`]. Storage problems never reach the game loop: a failed
//! read behaves as "no high score yet" and a failed write is logged and
//! dropped.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::{PersistenceConfig, StoreBackend};
use crate::error::{MindMatchError, Result};
use crate::persistence::SqliteStore;

/// Minimal persistence primitive: integers stored under string keys.
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<i64>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set(&mut self, key: &str, value: i64) -> Result<()>;
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, i64>,
    writes: usize,
}

/// In-process store. Clones share the same map, so a test can keep a handle
/// while the session owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls made so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.inner.lock().writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.inner.lock().values.get(key).copied())
    }

    fn set(&mut self, key: &str, value: i64) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.values.insert(key.to_string(), value);
        inner.writes += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileStore
// ---------------------------------------------------------------------------

/// A JSON object file mapping keys to integers, rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Use the file at `path`. It is created on the first write.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, i64>> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&data).map_err(|e| MindMatchError::Serialization(e.to_string()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.read_all()?.get(key).copied())
    }

    fn set(&mut self, key: &str, value: i64) -> Result<()> {
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value);
        let json = serde_json::to_vec_pretty(&values)
            .map_err(|e| MindMatchError::Serialization(e.to_string()))?;

        // Write-then-rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), key, value, "Stored value");
        Ok(())
    }
}

/// Open the backend selected by `config`.
///
/// # Errors
/// Returns an error if the sqlite database cannot be opened.
pub fn open_store(config: &PersistenceConfig) -> Result<Box<dyn KeyValueStore + Send>> {
    Ok(match config.backend {
        StoreBackend::Memory => Box::new(MemoryStore::new()),
        StoreBackend::Json => Box::new(JsonFileStore::new(&config.path)),
        StoreBackend::Sqlite => Box::new(SqliteStore::open(&config.path, config)?),
    })
}

// ---------------------------------------------------------------------------
// ScoreStore
// ---------------------------------------------------------------------------

/// The persisted best score.
///
/// `save` overwrites unconditionally; the session only calls it when the
/// score at game over beats the loaded value.
pub struct ScoreStore {
    backend: Box<dyn KeyValueStore + Send>,
    key: String,
}

impl std::fmt::Debug for ScoreStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreStore")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ScoreStore {
    /// Key used when none is configured.
    pub const DEFAULT_KEY: &'static str = "mindmatch_highscore";

    /// Wrap `backend`, storing the high score under `key`.
    pub fn new(backend: impl KeyValueStore + Send + 'static, key: impl Into<String>) -> Self {
        Self::from_boxed(Box::new(backend), key)
    }

    /// Wrap an already boxed backend.
    pub fn from_boxed(backend: Box<dyn KeyValueStore + Send>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// A fresh in-memory store under the default key.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), Self::DEFAULT_KEY)
    }

    /// Open the backend and key described by `config`.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be opened.
    pub fn open(config: &PersistenceConfig) -> Result<Self> {
        let backend = open_store(config)?;
        info!(backend = ?config.backend, key = %config.key, "High-score store opened");
        Ok(Self::from_boxed(backend, config.key.clone()))
    }

    /// Key the high score lives under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Stored high score, 0 if nothing was stored or the read failed.
    #[must_use]
    pub fn load(&self) -> u32 {
        match self.backend.get(&self.key) {
            Ok(None) => 0,
            Ok(Some(value)) => u32::try_from(value).unwrap_or_else(|_| {
                warn!(key = %self.key, value, "Stored high score out of range, using 0");
                0
            }),
            Err(e) => {
                warn!(key = %self.key, error = %e, "High score unavailable, using 0");
                0
            }
        }
    }

    /// Store `value`. Best-effort: returns `false` if the write failed.
    pub fn save(&mut self, value: u32) -> bool {
        match self.backend.set(&self.key, i64::from(value)) {
            Ok(()) => {
                info!(key = %self.key, value, "High score saved");
                true
            }
            Err(e) => {
                warn!(key = %self.key, value, error = %e, "High score not saved");
                false
            }
        }
    }
}
