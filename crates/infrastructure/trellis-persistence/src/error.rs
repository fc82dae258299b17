#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("snapshot is invalid or corrupt: {0}")]
    Corrupt(String),
    #[error("snapshot is from a newer build (schema_version={found}, supported={supported})")]
    NewerSchema { found: u32, supported: u32 },
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
    #[error("could not determine session storage directory")]
    NoSessionDir,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    Corrupt,
    NewerSchema,
    InvalidKey,
    Io,
    Codec,
}

impl StorageError {
    pub fn kind(&self) -> StorageErrorKind {
        match self {
            StorageError::Corrupt(_) => StorageErrorKind::Corrupt,
            StorageError::NewerSchema { .. } => StorageErrorKind::NewerSchema,
            StorageError::InvalidKey(_) => StorageErrorKind::InvalidKey,
            StorageError::Io(_) | StorageError::NoSessionDir => StorageErrorKind::Io,
            StorageError::Serde(_) => StorageErrorKind::Codec,
        }
    }
}
