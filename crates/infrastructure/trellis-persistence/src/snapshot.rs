use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::{SessionStorage, StorageError, StorageErrorKind};

pub const CURRENT_SCHEMA: u32 = trellis_config::SNAPSHOT_SCHEMA_VERSION;

/// Envelope written to session storage around the aggregate state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot<T> {
    pub schema_version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: T,
}

#[derive(Deserialize)]
struct SchemaProbe {
    schema_version: u32,
}

pub fn encode_snapshot<T: Serialize>(state: &T) -> Result<String, StorageError> {
    let snapshot = Snapshot {
        schema_version: CURRENT_SCHEMA,
        saved_at: Utc::now(),
        state,
    };
    Ok(serde_json::to_string(&snapshot)?)
}

pub fn decode_snapshot<T: DeserializeOwned>(raw: &str) -> Result<Snapshot<T>, StorageError> {
    let probe: SchemaProbe =
        serde_json::from_str(raw).map_err(|e| StorageError::Corrupt(e.to_string()))?;
    if probe.schema_version > CURRENT_SCHEMA {
        return Err(StorageError::NewerSchema {
            found: probe.schema_version,
            supported: CURRENT_SCHEMA,
        });
    }
    serde_json::from_str(raw).map_err(|e| StorageError::Corrupt(e.to_string()))
}

pub fn save_snapshot<T: Serialize>(
    storage: &dyn SessionStorage,
    key: &str,
    state: &T,
) -> Result<(), StorageError> {
    let raw = encode_snapshot(state)?;
    storage.set_item(key, &raw)
}

pub fn load_snapshot<T: DeserializeOwned>(
    storage: &dyn SessionStorage,
    key: &str,
) -> Result<Option<Snapshot<T>>, StorageError> {
    match storage.get_item(key)? {
        Some(raw) => decode_snapshot(&raw).map(Some),
        None => Ok(None),
    }
}

/// Loads the snapshot under `key`, setting aside corrupt values and ignoring
/// ones written by a newer schema. Only I/O failures are returned as errors.
pub fn restore_snapshot<T: DeserializeOwned>(
    storage: &dyn SessionStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    match load_snapshot(storage, key) {
        Ok(snapshot) => Ok(snapshot.map(|s| s.state)),
        Err(e) => match e.kind() {
            StorageErrorKind::Corrupt => {
                tracing::warn!(key, "discarding unreadable session snapshot: {e}");
                storage.quarantine(key)?;
                Ok(None)
            }
            StorageErrorKind::NewerSchema => {
                tracing::warn!(key, "ignoring session snapshot: {e}");
                Ok(None)
            }
            _ => Err(e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemorySessionStorage;

    #[test]
    fn newer_schema_is_reported() {
        let raw = r#"{"schema_version": 999, "saved_at": "2026-01-01T00:00:00Z", "state": 1}"#;
        let err = decode_snapshot::<u32>(raw).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::NewerSchema);
    }

    #[test]
    fn missing_snapshot_restores_nothing() {
        let storage = MemorySessionStorage::new();
        let restored: Option<Vec<String>> = restore_snapshot(&storage, "k").unwrap();
        assert!(restored.is_none());
    }

    #[test]
    fn corrupt_snapshot_is_dropped_from_memory_storage() {
        let storage = MemorySessionStorage::new();
        storage.set_item("k", "{not json").unwrap();
        let restored: Option<Vec<String>> = restore_snapshot(&storage, "k").unwrap();
        assert!(restored.is_none());
        assert!(storage.get_item("k").unwrap().is_none());
    }
}
