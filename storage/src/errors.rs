// storage/src/errors.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database operation failed: {0}")]
    Sled(#[from] sled::Error),

    #[error("Serialization/Deserialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Already Exists: {0}")]
    Conflict(String),

    #[error("Referenced {0} does not exist")]
    MissingReference(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
