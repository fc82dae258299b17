use std::collections::HashMap;
use std::fs;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use directories::ProjectDirs;

use crate::maintenance::{atomic_write, quarantine_corrupt_file};
use crate::StorageError;

const QUALIFIER: &str = "org";
const ORG: &str = "trellis";
const APP: &str = "trellis";

/// Session-scoped string key-value storage.
pub trait SessionStorage: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Moves an unreadable value out of the way. Plain removal by default.
    fn quarantine(&self, key: &str) -> Result<(), StorageError> {
        self.remove_item(key)
    }
}

/// Storage that lives exactly as long as the value does.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map only means a writer panicked mid-insert; the map is still usable.
        self.items.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// One JSON file per key inside a per-session directory.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    dir: Utf8PathBuf,
}

impl FileSessionStorage {
    pub fn new(dir: impl Into<Utf8PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(Self { dir })
    }

    /// Storage for `session_id` under the default sessions root.
    pub fn for_session(session_id: &str) -> Result<Self, StorageError> {
        Self::for_session_in(&sessions_root()?, session_id)
    }

    pub fn for_session_in(root: &Utf8Path, session_id: &str) -> Result<Self, StorageError> {
        validate_key(session_id)?;
        Self::new(root.join(session_id))
    }

    /// Storage for a brand new session under the default sessions root.
    pub fn new_session() -> Result<Self, StorageError> {
        Self::new_session_in(&sessions_root()?)
    }

    pub fn new_session_in(root: &Utf8Path) -> Result<Self, StorageError> {
        Self::for_session_in(root, &uuid::Uuid::new_v4().to_string())
    }

    /// Name of the session directory, which is the session id for storage
    /// opened through `for_session`/`new_session`.
    pub fn session_id(&self) -> Option<&str> {
        self.dir.file_name()
    }

    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Ends the session by deleting everything stored for it.
    pub fn clear(&self) -> Result<(), StorageError> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    fn item_path(&self, key: &str) -> Result<Utf8PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl SessionStorage for FileSessionStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.item_path(key)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.item_path(key)?;
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }
        atomic_write(&path, value.as_bytes())?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let path = self.item_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn quarantine(&self, key: &str) -> Result<(), StorageError> {
        let path = self.item_path(key)?;
        quarantine_corrupt_file(&path)?;
        Ok(())
    }
}

/// Directory holding one subdirectory per session: `TRELLIS_SESSIONS_ROOT`
/// if set, else `sessions/` under the user's cache directory.
pub fn sessions_root() -> Result<Utf8PathBuf, StorageError> {
    if let Ok(dir) = std::env::var(trellis_config::SESSIONS_ROOT_ENV) {
        return Ok(Utf8PathBuf::from(dir));
    }
    let proj_dirs = ProjectDirs::from(QUALIFIER, ORG, APP).ok_or(StorageError::NoSessionDir)?;
    let cache = Utf8PathBuf::from_path_buf(proj_dirs.cache_dir().to_path_buf())
        .map_err(|_| StorageError::NoSessionDir)?;
    Ok(cache.join("sessions"))
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.contains("..")
        || key.contains(['/', '\\', ':'])
        || key.chars().any(char::is_control)
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
