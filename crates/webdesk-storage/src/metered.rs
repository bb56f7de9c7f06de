//! Per-app storage metered against a soft quota.
//!
//! Every app gets its own namespace (`app:{id}`). Values are stored as their
//! JSON serialization and usage is the sum of those byte lengths. A write is
//! refused, without touching the store, when the projected total would
//! exceed the quota:
//!
//! ```text
//! projected = usage - len(old value of key) + len(new value)
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use webdesk_core::AppId;

use crate::error::{StorageError, StorageResult};
use crate::kv::{KvStore, ScopedKvStore, byte_len};

/// Namespace holding one app's entries.
#[must_use]
pub fn app_namespace(app_id: &AppId) -> String {
    format!("app:{app_id}")
}

/// Usage report returned by `storage.quota`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaReport {
    /// Bytes currently stored.
    pub used: u64,
    /// The soft limit in bytes.
    pub soft_limit: u64,
}

/// One app's storage, metered against its soft quota.
#[derive(Debug, Clone)]
pub struct AppStorage {
    scoped: ScopedKvStore,
    quota: u64,
}

impl AppStorage {
    /// Bind a metered view of `store` for `app_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the app id yields an unusable
    /// namespace.
    pub fn new(store: Arc<dyn KvStore>, app_id: &AppId, quota: u64) -> StorageResult<Self> {
        Ok(Self {
            scoped: ScopedKvStore::new(store, app_namespace(app_id))?,
            quota,
        })
    }

    /// Read `key`, or `fallback` when it is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails or the stored bytes are not
    /// JSON.
    pub async fn get(&self, key: &str, fallback: Value) -> StorageResult<Value> {
        Ok(self.scoped.get_json(key).await?.unwrap_or(fallback))
    }

    /// Write `value` under `key` if the quota allows it.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::QuotaExceeded`] if the projected usage exceeds
    /// the quota. The previous value is left untouched in that case.
    pub async fn set(&self, key: &str, value: &Value) -> StorageResult<()> {
        let bytes =
            serde_json::to_vec(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let old = self.scoped.get(key).await?.map_or(0, |b| byte_len(&b));
        let projected = self
            .scoped
            .usage()
            .await?
            .saturating_sub(old)
            .saturating_add(byte_len(&bytes));

        if projected > self.quota {
            warn!(
                namespace = self.scoped.namespace(),
                key,
                projected,
                limit = self.quota,
                "Storage write refused: soft quota exceeded"
            );
            return Err(StorageError::QuotaExceeded {
                projected,
                limit: self.quota,
            });
        }

        debug!(namespace = self.scoped.namespace(), key, projected, "Storage write");
        self.scoped.set(key, bytes).await
    }

    /// Every key this app owns, sorted ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails.
    pub async fn list(&self) -> StorageResult<Vec<String>> {
        self.scoped.list_keys().await
    }

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails.
    pub async fn remove(&self, key: &str) -> StorageResult<()> {
        self.scoped.delete(key).await.map(|_| ())
    }

    /// Current usage and the limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails.
    pub async fn quota(&self) -> StorageResult<QuotaReport> {
        Ok(QuotaReport {
            used: self.scoped.usage().await?,
            soft_limit: self.quota,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::kv::MemoryKvStore;

    fn storage(quota: u64) -> AppStorage {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        AppStorage::new(store, &AppId::from("notes"), quota).unwrap()
    }

    #[tokio::test]
    async fn test_get_returns_fallback_when_absent() {
        let s = storage(1024);
        assert_eq!(s.get("missing", Value::Null).await.unwrap(), Value::Null);
        assert_eq!(s.get("missing", json!([])).await.unwrap(), json!([]));
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let s = storage(1024);
        let value = json!({"title": "hi", "tags": ["a", "b"], "n": 1.5});
        s.set("doc", &value).await.unwrap();
        assert_eq!(s.get("doc", Value::Null).await.unwrap(), value);
    }

    #[tokio::test]
    async fn test_set_over_quota_keeps_prior_value() {
        let s = storage(10);
        s.set("k", &json!("abc")).await.unwrap(); // 5 bytes
        let err = s.set("k", &json!("abcdefghijkl")).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                projected: 14,
                limit: 10
            }
        ));
        assert_eq!(s.get("k", Value::Null).await.unwrap(), json!("abc"));
    }

    #[tokio::test]
    async fn test_overwrite_counts_only_the_new_size() {
        let s = storage(10);
        s.set("k", &json!("abcdefgh")).await.unwrap(); // 10 bytes, at the limit
        s.set("k", &json!("abcdefgh")).await.unwrap();
        assert_eq!(s.quota().await.unwrap().used, 10);
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_scoped() {
        let store: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
        let a = AppStorage::new(Arc::clone(&store), &AppId::from("a"), 1024).unwrap();
        let b = AppStorage::new(store, &AppId::from("b"), 1024).unwrap();
        a.set("zeta", &json!(1)).await.unwrap();
        a.set("alpha", &json!(2)).await.unwrap();
        b.set("other", &json!(3)).await.unwrap();
        assert_eq!(a.list().await.unwrap(), vec!["alpha", "zeta"]);
    }

    #[tokio::test]
    async fn test_empty_key_is_metered_like_any_other() {
        let s = storage(1024);
        s.set("", &json!("abc")).await.unwrap();
        assert_eq!(s.get("", Value::Null).await.unwrap(), json!("abc"));
        assert_eq!(s.list().await.unwrap(), vec![""]);
        assert_eq!(s.quota().await.unwrap().used, 5);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let s = storage(1024);
        s.set("k", &json!(true)).await.unwrap();
        s.remove("k").await.unwrap();
        s.remove("k").await.unwrap();
        assert!(s.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_quota_reports_camel_case() {
        let s = storage(512);
        s.set("k", &json!(12)).await.unwrap();
        let report = serde_json::to_value(s.quota().await.unwrap()).unwrap();
        assert_eq!(report, json!({"used": 2, "softLimit": 512}));
    }
}
