//! Mock storage providers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use webdesk_storage::{KvStore, MemoryKvStore, StorageError, StorageResult};

/// A [`KvStore`] that reads from memory and refuses writes while switched
/// to failing.
///
/// Clones share the same data and the same switch.
#[derive(Debug, Clone, Default)]
pub struct FlakyKvStore {
    inner: Arc<MemoryKvStore>,
    failing: Arc<AtomicBool>,
}

impl FlakyKvStore {
    /// Create a working store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> StorageResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StorageError::Internal("provider unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KvStore for FlakyKvStore {
    async fn get(&self, namespace: &str, key: &str) -> StorageResult<Option<Vec<u8>>> {
        self.inner.get(namespace, key).await
    }

    async fn set(&self, namespace: &str, key: &str, value: Vec<u8>) -> StorageResult<()> {
        self.check()?;
        self.inner.set(namespace, key, value).await
    }

    async fn delete(&self, namespace: &str, key: &str) -> StorageResult<bool> {
        self.check()?;
        self.inner.delete(namespace, key).await
    }

    async fn list_keys(&self, namespace: &str) -> StorageResult<Vec<String>> {
        self.inner.list_keys(namespace).await
    }
}
