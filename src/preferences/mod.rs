// Persisted viewer preference store
//
// Generic typed key/value persistence with JSON serialization and silent
// fallback when the backing storage misbehaves. Shared across camera views,
// keyed per camera, so there is no cross-camera contention.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for storage backend operations
pub type StoreResult<T> = Result<T, StorageError>;

/// Failures raised by a preference backend
///
/// These never escape `PreferenceStore`: reads fall back to the cached or
/// default value and writes are dropped, with a warning logged.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backing storage could not be read or written
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// Stored payload could not be parsed
    #[error("Corrupt payload for key '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    /// Value could not be serialized for storage
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// I/O errors from file-backed storage
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Create an unavailable-storage error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a corrupt-payload error
    pub fn corrupt(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

/// Raw string-keyed persistence consumed by `PreferenceStore`
///
/// Implementations hold JSON-encoded values. The store never interprets a
/// backend failure as fatal.
pub trait PreferenceBackend: Send + Sync {
    /// Load the raw serialized value for a key, `None` if absent
    fn load(&self, key: &str) -> StoreResult<Option<String>>;

    /// Persist the raw serialized value for a key
    fn save(&mut self, key: &str, value: &str) -> StoreResult<()>;
}

/// In-memory backend, primarily for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryBackend {
    entries: HashMap<String, String>,
    poisoned: bool,
}

impl MemoryBackend {
    /// Create an empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent load/save fail, for failure-path tests
    pub fn poison(&mut self) {
        self.poisoned = true;
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the backend holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        if self.poisoned {
            return Err(StorageError::unavailable("memory backend poisoned"));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> StoreResult<()> {
        if self.poisoned {
            return Err(StorageError::unavailable("memory backend poisoned"));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// File backend persisting all preferences as one JSON object
///
/// Each save rewrites the whole map. Suitable for the small per-camera
/// preference sets this crate manages; not a general-purpose database.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    /// Create a backend rooted at the given file path
    ///
    /// The file is created lazily on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> StoreResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| StorageError::corrupt(self.path.display().to_string(), e.to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &HashMap<String, String>) -> StoreResult<()> {
        let raw = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

impl PreferenceBackend for JsonFileBackend {
    fn load(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> StoreResult<()> {
        let mut map = self.read_map().unwrap_or_default();
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }
}

/// Typed preference store with lazy defaults and silent failure recovery
///
/// `get` lazily initializes a missing entry to the caller's default and
/// writes it back. Any backend failure is absorbed: the in-memory value (or
/// the default) is returned and a warning logged. Values persist until
/// overwritten; there is no TTL or eviction.
pub struct PreferenceStore {
    backend: Box<dyn PreferenceBackend>,
    // Authoritative once populated, so a flaky backend is invisible to callers.
    cache: HashMap<String, String>,
}

impl PreferenceStore {
    /// Create a store over the given backend
    pub fn new(backend: Box<dyn PreferenceBackend>) -> Self {
        Self {
            backend,
            cache: HashMap::new(),
        }
    }

    /// Create a store backed only by memory
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()))
    }

    /// Read a typed value, initializing it to `default` when absent
    pub fn get<T>(&mut self, key: &str, default: T) -> T
    where
        T: Serialize + DeserializeOwned + Clone,
    {
        if let Some(raw) = self.cache.get(key) {
            if let Ok(value) = serde_json::from_str(raw) {
                return value;
            }
        }

        match self.backend.load(key) {
            Ok(Some(raw)) => match serde_json::from_str::<T>(&raw) {
                Ok(value) => {
                    self.cache.insert(key.to_string(), raw);
                    value
                }
                Err(e) => {
                    log::warn!("Discarding corrupt preference '{}': {}", key, e);
                    self.write_through(key, &default);
                    default
                }
            },
            Ok(None) => {
                self.write_through(key, &default);
                default
            }
            Err(e) => {
                log::warn!("Preference read failed for '{}': {}", key, e);
                default
            }
        }
    }

    /// Write a typed value, overwriting any previous entry
    ///
    /// Backend failures are swallowed; the in-memory value is kept so later
    /// reads still observe the write.
    pub fn set<T: Serialize>(&mut self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("Preference serialization failed for '{}': {}", key, e);
                return;
            }
        };

        self.cache.insert(key.to_string(), raw.clone());
        if let Err(e) = self.backend.save(key, &raw) {
            log::warn!("Preference write failed for '{}': {}", key, e);
        }
    }

    fn write_through<T: Serialize>(&mut self, key: &str, value: &T) {
        if let Ok(raw) = serde_json::to_string(value) {
            self.cache.insert(key.to_string(), raw.clone());
            if let Err(e) = self.backend.save(key, &raw) {
                log::warn!("Preference write failed for '{}': {}", key, e);
            }
        }
    }
}

/// Storage key for a camera's persisted audio preference
pub fn audio_preference_key(camera: &str) -> String {
    format!("{}_audio", camera)
}
