//! Key-value persistence capability
//!
//! Services never talk to a storage mechanism directly. They are handed an
//! `Arc<dyn KeyValueStore>` at construction time and read/write JSON records
//! through it, so tests can swap in [`MemoryStore`] while the binary uses
//! [`FileStore`].

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info};

use crate::error::{StoreError, StoreResult};

/// Names of the persisted records
pub mod keys {
    pub const CURRENT_SESSION: &str = "currentSession";
    pub const USER_REGISTRY: &str = "userRegistry";
    pub const CREDENTIAL_TABLE: &str = "credentialTable";
    pub const DATABASE_CONFIG: &str = "databaseConfig";
    pub const HAS_OWNER_FLAG: &str = "hasOwnerFlag";
    pub const IS_CONFIGURED_FLAG: &str = "isConfiguredFlag";
}

/// Simple string key-value storage
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set a key-value pair, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete a key. Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Check if the store is reachable
    async fn health_check(&self) -> StoreResult<bool>;
}

/// Read and decode a JSON record
pub async fn get_json<T, S>(store: &S, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    let Some(raw) = store.get(key).await? else {
        return Ok(None);
    };

    serde_json::from_str(&raw).map(Some).map_err(|source| {
        error!("Persisted record '{}' is malformed: {}", key, source);
        StoreError::Corrupt {
            key: key.to_string(),
            source,
        }
    })
}

/// Encode and write a JSON record
pub async fn set_json<T, S>(store: &S, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw).await
}

/// In-memory store, used by tests and short-lived processes
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }
}

/// Directory-backed store keeping one JSON document per key
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    /// Serializes write-then-rename so overlapping writes to a key cannot interleave
    write_lock: Mutex<()>,
}

/// Suffix source for temporary files, shared by every handle in the process
static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|source| StoreError::Io {
                key: root.display().to_string(),
                source,
            })?;

        info!("File store opened at {}", root.display());
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    fn io_error(key: &str, source: std::io::Error) -> StoreError {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        match tokio::fs::read_to_string(self.path_for(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let path = self.path_for(key);
        // Unique per write, other handles on the same directory may be writing too
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .root
            .join(format!(".{key}.{}.{seq}.tmp", std::process::id()));

        let _guard = self.write_lock.lock().await;

        // Write then rename so a reader never sees a half-written record
        if let Err(e) = tokio::fs::write(&tmp, value).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Self::io_error(key, e));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(Self::io_error(key, e));
        }

        debug!("Wrote record {}", key);
        Ok(())
    }

    async fn delete(&self, key: &str) -> StoreResult<()> {
        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Self::io_error(key, e)),
        }
    }

    async fn health_check(&self) -> StoreResult<bool> {
        let metadata = tokio::fs::metadata(&self.root)
            .await
            .map_err(|e| Self::io_error(&self.root.display().to_string(), e))?;
        Ok(metadata.is_dir())
    }
}
