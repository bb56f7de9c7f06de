//! The app registry.
//!
//! Holds the builtin seed and the installed collection. Only the installed
//! collection is persisted: a single JSON array under [`INSTALLED_KEY`] in
//! the system namespace, rewritten in full on every mutation. Each mutation
//! is persisted before it becomes visible, so a failed write leaves the
//! registry as it was.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use webdesk_events::{EventBus, ShellEvent};
use webdesk_storage::{KvStore, SYSTEM_NAMESPACE, ScopedKvStore};

use crate::builtins::builtin_manifests;
use crate::error::{RegistryError, RegistryResult};
use crate::manifest::AppManifest;

/// Storage key of the installed collection.
pub const INSTALLED_KEY: &str = "os:registry:installed";

/// Catalog of builtin and installed apps.
pub struct AppRegistry {
    builtins: Vec<Arc<AppManifest>>,
    installed: Vec<Arc<AppManifest>>,
    store: ScopedKvStore,
    events: EventBus,
}

impl std::fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppRegistry")
            .field("builtins", &self.builtins.len())
            .field("installed", &self.installed.len())
            .finish_non_exhaustive()
    }
}

impl AppRegistry {
    /// Load the registry, reading the installed collection once.
    ///
    /// A missing collection loads as empty. So does a corrupt one, and
    /// individual entries that fail validation or collide with a builtin
    /// are skipped; both cases are logged.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Storage`] if the provider itself fails.
    pub async fn load(store: Arc<dyn KvStore>, events: EventBus) -> RegistryResult<Self> {
        let store = ScopedKvStore::new(store, SYSTEM_NAMESPACE)?;
        let builtins: Vec<Arc<AppManifest>> =
            builtin_manifests().into_iter().map(Arc::new).collect();

        let raw = match store.get_json::<Vec<Value>>(INSTALLED_KEY).await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(webdesk_storage::StorageError::Serialization(e)) => {
                warn!(error = %e, "Installed app collection is corrupt, starting empty");
                Vec::new()
            },
            Err(e) => return Err(e.into()),
        };

        let mut registry = Self {
            builtins,
            installed: Vec::with_capacity(raw.len()),
            store,
            events,
        };
        for entry in &raw {
            match AppManifest::from_value(entry) {
                Ok(m) if registry.is_builtin(m.id.as_str()) => {
                    warn!(app_id = %m.id, "Skipping stored app that shadows a builtin");
                },
                Ok(m) => registry.upsert_in(m),
                Err(e) => warn!(error = %e, "Skipping invalid stored app"),
            }
        }

        info!(
            builtins = registry.builtins.len(),
            installed = registry.installed.len(),
            "App registry loaded"
        );
        Ok(registry)
    }

    /// Every manifest: builtins first, then installed apps in install order.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<AppManifest>> {
        self.builtins
            .iter()
            .chain(self.installed.iter())
            .cloned()
            .collect()
    }

    /// Manifests whose name or description contains `query`, ignoring case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<Arc<AppManifest>> {
        self.builtins
            .iter()
            .chain(self.installed.iter())
            .filter(|m| m.matches(query))
            .cloned()
            .collect()
    }

    /// Look up a manifest by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<AppManifest>> {
        self.builtins
            .iter()
            .chain(self.installed.iter())
            .find(|m| m.id.as_str() == id)
            .cloned()
    }

    /// Whether `id` is reserved by a builtin.
    #[must_use]
    pub fn is_builtin(&self, id: &str) -> bool {
        self.builtins.iter().any(|m| m.id.as_str() == id)
    }

    /// Installed (non-builtin) manifests in install order.
    #[must_use]
    pub fn installed(&self) -> &[Arc<AppManifest>] {
        &self.installed
    }

    /// Validate and install a manifest, replacing any installed app with the
    /// same id.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidManifest`] if validation fails,
    /// [`RegistryError::BuiltinConflict`] if the id is reserved, or
    /// [`RegistryError::Storage`] if persisting fails.
    pub async fn install(&mut self, mut manifest: AppManifest) -> RegistryResult<()> {
        manifest.builtin = false;
        manifest.validate()?;
        if self.is_builtin(manifest.id.as_str()) {
            return Err(RegistryError::BuiltinConflict(
                "Cannot override builtin app id".into(),
            ));
        }

        let app_id = manifest.id.clone();
        let mut next = self.installed.clone();
        upsert(&mut next, manifest);
        self.commit(next).await?;

        info!(app_id = %app_id, "App installed");
        self.events.publish(ShellEvent::RegistryChanged);
        Ok(())
    }

    /// Validate an untyped manifest and install it.
    ///
    /// # Errors
    ///
    /// Same as [`install`](Self::install).
    pub async fn install_value(&mut self, raw: &Value) -> RegistryResult<()> {
        let manifest = AppManifest::from_value(raw)?;
        self.install(manifest).await
    }

    /// Remove an installed app and return its manifest.
    ///
    /// The registry knows nothing about running instances; closing them is
    /// up to the caller.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::BuiltinConflict`] for builtin ids,
    /// [`RegistryError::NotInstalled`] if nothing matches, or
    /// [`RegistryError::Storage`] if persisting fails.
    pub async fn uninstall(&mut self, app_id: &str) -> RegistryResult<Arc<AppManifest>> {
        if self.is_builtin(app_id) {
            return Err(RegistryError::BuiltinConflict(
                "Cannot uninstall builtin app".into(),
            ));
        }
        let Some(pos) = self.installed.iter().position(|m| m.id.as_str() == app_id) else {
            return Err(RegistryError::NotInstalled(app_id.to_owned()));
        };

        let mut next = self.installed.clone();
        let removed = next.remove(pos);
        self.commit(next).await?;

        info!(app_id, "App uninstalled");
        self.events.publish(ShellEvent::RegistryChanged);
        Ok(removed)
    }

    /// Persist `next` and make it the installed collection.
    async fn commit(&mut self, next: Vec<Arc<AppManifest>>) -> RegistryResult<()> {
        let records: Vec<&AppManifest> = next.iter().map(AsRef::as_ref).collect();
        self.store.set_json(INSTALLED_KEY, &records).await?;
        debug!(installed = next.len(), "Installed app collection persisted");
        self.installed = next;
        Ok(())
    }

    fn upsert_in(&mut self, manifest: AppManifest) {
        upsert(&mut self.installed, manifest);
    }
}

fn upsert(list: &mut Vec<Arc<AppManifest>>, manifest: AppManifest) {
    let manifest = Arc::new(manifest);
    if let Some(slot) = list.iter_mut().find(|m| m.id == manifest.id) {
        *slot = manifest;
    } else {
        list.push(manifest);
    }
}
