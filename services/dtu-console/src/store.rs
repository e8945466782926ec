//! Durable session and locale-preference storage
//!
//! [`CredentialStore`] is the single owner of the persisted [`Session`]. It
//! sits on top of a [`KeyValueStore`] backend: [`MemoryStore`] for tests and
//! [`FileStore`] for the CLI. Reads never fail; unreadable or corrupted
//! entries are reported through `tracing` and treated as absent.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Storage key holding the serialized session
pub const USER_KEY: &str = "user";

/// Storage key holding the preferred locale code
pub const LOCALE_KEY: &str = "locale";

/// Client-held proof of authentication plus whatever the device returned
/// from the authentication check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Basic auth token, `base64(username:password)`
    #[serde(rename = "authdata")]
    pub auth_data: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Session {
    pub fn new(auth_data: impl Into<String>) -> Self {
        Self {
            auth_data: auth_data.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Synchronous key/value persistence
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value; implementations persist before returning
    fn set(&self, key: &str, value: &str) -> crate::Result<()>;

    fn remove(&self, key: &str) -> crate::Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory store, used for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> crate::Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}

/// JSON document on disk, rewritten on every mutation
///
/// A mutation only becomes visible once the document has been written, so
/// the in-memory view never runs ahead of the file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// or corrupted file is logged and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!("Ignoring corrupted store {:?}: {}", path, e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read store {:?}: {}", path, e);
                BTreeMap::new()
            }
        };

        tracing::debug!("Opened store {:?} with {} entries", path, entries.len());
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Temp file + rename so a crash never leaves a half-written document
    fn persist(&self, entries: &BTreeMap<String, String>) -> crate::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            crate::ConsoleError::Storage(format!(
                "Failed to rename {:?} to {:?}: {}",
                tmp_path, self.path, e
            ))
        })
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        let mut entries = lock(&self.entries);
        let mut updated = entries.clone();
        updated.insert(key.to_string(), value.to_string());
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, key: &str) -> crate::Result<()> {
        let mut entries = lock(&self.entries);
        if !entries.contains_key(key) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(key);
        self.persist(&updated)?;
        *entries = updated;
        Ok(())
    }
}

/// Owner of the persisted session and locale preference
///
/// Clones share the same backend and session epoch. Session writes are
/// serialized so the epoch always names the session on record.
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
    epoch: Arc<AtomicU64>,
    session_lock: Arc<Mutex<()>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("epoch", &self.session_epoch())
            .finish()
    }
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self {
            backend,
            epoch: Arc::new(AtomicU64::new(0)),
            session_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store backed by a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The current session, or `None` if absent or unreadable
    pub fn get(&self) -> Option<Session> {
        self.load_json(USER_KEY)
    }

    pub fn set(&self, session: &Session) {
        let _guard = lock(&self.session_lock);
        self.save_json(USER_KEY, session);
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!("Session stored (epoch {})", epoch);
    }

    pub fn clear(&self) {
        let _guard = lock(&self.session_lock);
        self.remove_session();
    }

    /// Clear the session only while `epoch` is still current
    pub fn clear_if_current(&self, epoch: u64) -> bool {
        let _guard = lock(&self.session_lock);
        if self.session_epoch() != epoch {
            return false;
        }
        self.remove_session();
        true
    }

    fn remove_session(&self) {
        if let Err(e) = self.backend.remove(USER_KEY) {
            tracing::warn!("Failed to clear session: {}", e);
        }
    }

    /// Number of sessions stored by this process so far
    pub fn session_epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn locale_preference(&self) -> Option<String> {
        self.backend
            .get(LOCALE_KEY)
            .map(|code| code.trim().to_string())
            .filter(|code| !code.is_empty())
    }

    pub fn set_locale_preference(&self, code: &str) {
        if let Err(e) = self.backend.set(LOCALE_KEY, code) {
            tracing::warn!("Failed to persist locale preference '{}': {}", code, e);
        }
    }

    /// Read and deserialize a JSON entry; corrupted entries read as absent
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring unreadable '{}' entry: {}", key, e);
                None
            }
        }
    }

    pub fn save_json<T: Serialize>(&self, key: &str, value: &T) {
        let result = serde_json::to_string(value)
            .map_err(crate::ConsoleError::from)
            .and_then(|raw| self.backend.set(key, &raw));
        if let Err(e) = result {
            tracing::warn!("Failed to persist '{}' entry: {}", key, e);
        }
    }
}
