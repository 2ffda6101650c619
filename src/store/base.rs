use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use super::{file_store::FileStorage, memory_store::MemoryStorage};
use crate::config::{StorageBackend, StorageConfig};

/// Key holding the raw session token.
pub const TOKEN_KEY: &str = "jwt_token";
/// Key holding the serialized profile snapshot.
pub const PROFILE_KEY: &str = "user";
/// Key holding the UI theme preference.
pub const THEME_KEY: &str = "app-theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage document is corrupt: {0}")]
    Corrupt(String),
    #[error("storage is unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous client-local key/value persistence that survives restarts.
///
/// Calls are blocking but local, so callers treat them as non-suspending.
pub trait Storage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn is_durable(&self) -> bool {
        true
    }
}

/// Creates a concrete storage implementation based on the StorageConfig.
/// If `storage.enabled = false`, returns an in-memory storage.
pub fn create_storage(config: &StorageConfig) -> Result<Arc<dyn Storage>, StorageError> {
    if !config.enabled {
        info!("Durable storage is disabled. Session data will not survive restarts.");
        return Ok(Arc::new(MemoryStorage::new()));
    }

    match &config.backend {
        Some(StorageBackend::File(file_config)) => {
            let storage = FileStorage::open(&file_config.path)?;
            info!("Using file storage at {}", file_config.path.display());
            Ok(Arc::new(storage))
        }
        None => Err(StorageError::Unavailable(
            "storage is enabled, but no backend config is provided".to_string(),
        )),
    }
}
