//! The storage provider boundary.
//!
//! [`KvStore`] is everything the host asks of a persistence backend: read,
//! write, delete and enumerate byte values under `(namespace, key)`. The
//! host never looks at how a provider lays data out.
//!
//! [`ScopedKvStore`] pins a namespace so callers (the registry, an app's
//! storage) only ever name keys. Any string is a valid key, the empty
//! string included.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StorageError, StorageResult};

/// A string-keyed byte store partitioned into namespaces.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// The value under `key`, or `None` if absent.
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()>;

    /// Remove `key`. Returns whether it was present.
    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool>;

    /// Every key in `namespace`. Order is up to the provider.
    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>>;
}

/// A [`KvStore`] held in process memory.
///
/// Nothing survives the process. Used by tests and by embedders that have
/// no backend.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RwLock<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryKvStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(
        &self,
    ) -> StorageResult<std::sync::RwLockReadGuard<'_, BTreeMap<(String, String), Vec<u8>>>> {
        self.entries
            .read()
            .map_err(|e| StorageError::Internal(e.to_string()))
    }

    fn write(
        &self,
    ) -> StorageResult<std::sync::RwLockWriteGuard<'_, BTreeMap<(String, String), Vec<u8>>>> {
        self.entries
            .write()
            .map_err(|e| StorageError::Internal(e.to_string()))
    }
}

fn entry_key(namespace: &str, key: &str) -> (String, String) {
    (namespace.to_owned(), key.to_owned())
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.read()?.get(&entry_key(namespace, key)).cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.write()?.insert(entry_key(namespace, key), value);
        Ok(())
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        Ok(self.write()?.remove(&entry_key(namespace, key)).is_some())
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        Ok(self
            .read()?
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, key)| key.clone())
            .collect())
    }
}

/// A [`KvStore`] pinned to one namespace.
#[derive(Clone)]
pub struct ScopedKvStore {
    inner: Arc<dyn KvStore>,
    namespace: String,
}

impl std::fmt::Debug for ScopedKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedKvStore")
            .field("namespace", &self.namespace)
            .finish_non_exhaustive()
    }
}

impl ScopedKvStore {
    /// Pin `store` to `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] for a blank namespace.
    pub fn new(store: Arc<dyn KvStore>, namespace: impl Into<String>) -> StorageResult<Self> {
        let namespace = namespace.into();
        if namespace.trim().is_empty() {
            return Err(StorageError::InvalidKey(
                "namespace must not be blank".into(),
            ));
        }
        Ok(Self {
            inner: store,
            namespace,
        })
    }

    /// The pinned namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Raw bytes under `key`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(&self.namespace, key).await
    }

    /// Store raw bytes under `key`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.inner.set(&self.namespace, key, value).await
    }

    /// Remove `key`, returning whether it was present.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn delete(&self, key: &str) -> StorageResult<bool> {
        self.inner.delete(&self.namespace, key).await
    }

    /// Keys in the namespace, sorted ascending whatever order the provider
    /// returns them in.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn list_keys(&self) -> StorageResult<Vec<String>> {
        let mut keys = self.inner.list_keys(&self.namespace).await?;
        keys.sort_unstable();
        Ok(keys)
    }

    /// Sum of the stored value lengths in the namespace.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub async fn usage(&self) -> StorageResult<u64> {
        let mut total: u64 = 0;
        for key in self.inner.list_keys(&self.namespace).await? {
            if let Some(bytes) = self.inner.get(&self.namespace, &key).await? {
                total = total.saturating_add(byte_len(&bytes));
            }
        }
        Ok(total)
    }

    /// Decode the JSON value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if the stored bytes are not
    /// a `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.get(key).await? {
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StorageError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    /// Encode `value` as JSON and store it under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Serialization`] if `value` does not encode.
    pub async fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StorageResult<()> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.set(key, bytes).await
    }
}

/// Byte length as `u64`.
pub(crate) fn byte_len(bytes: &[u8]) -> u64 {
    u64::try_from(bytes.len()).unwrap_or(u64::MAX)
}
