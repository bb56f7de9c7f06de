//! The host-owned context every operation acts on.
//!
//! [`Desktop`] holds the registry, the window and process tables, the
//! storage provider and the event bus. Operations that span components
//! live here so each of them completes in one step: closing a window reaps
//! its processes, and uninstalling an app closes its windows.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::info;
use webdesk_apps::{AppManifest, AppRegistry};
use webdesk_core::{AppId, WindowId};
use webdesk_events::EventBus;
use webdesk_rpc::InboundFrame;
use webdesk_storage::{AppStorage, KvStore, StorageResult};

use crate::config::HostConfig;
use crate::error::KernelResult;
use crate::gate;
use crate::process::{Process, ProcessManager};
use crate::surface::SurfaceHost;
use crate::window::WindowManager;

/// Registry, windows, processes and storage of one desktop session.
pub struct Desktop {
    registry: AppRegistry,
    windows: WindowManager,
    processes: ProcessManager,
    store: Arc<dyn KvStore>,
    events: EventBus,
    config: HostConfig,
}

impl std::fmt::Debug for Desktop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Desktop")
            .field("registry", &self.registry)
            .field("windows", &self.windows)
            .field("processes", &self.processes.len())
            .finish_non_exhaustive()
    }
}

impl Desktop {
    /// Load the registry and set up empty window and process tables.
    ///
    /// Returns the desktop and the fan-in queue of frames sent by every
    /// process it will ever host.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Registry`](crate::KernelError::Registry) if
    /// the installed app collection cannot be read.
    pub async fn new(
        config: HostConfig,
        store: Arc<dyn KvStore>,
        surfaces: Box<dyn SurfaceHost>,
        events: EventBus,
    ) -> KernelResult<(Self, mpsc::UnboundedReceiver<InboundFrame>)> {
        let registry = AppRegistry::load(Arc::clone(&store), events.clone()).await?;
        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let windows = WindowManager::new(
            config.windows.clone(),
            config.placement_seed,
            surfaces,
            frames_tx,
            events.clone(),
        );
        let processes = ProcessManager::new(events.clone());

        let desktop = Self {
            registry,
            windows,
            processes,
            store,
            events,
            config,
        };
        Ok((desktop, frames_rx))
    }

    /// The app catalog.
    #[must_use]
    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    /// Window state.
    #[must_use]
    pub fn windows(&self) -> &WindowManager {
        &self.windows
    }

    /// Window state, for focus, minimize, maximize and geometry changes.
    ///
    /// Closing must go through [`close_window`](Self::close_window) so the
    /// window's processes are reaped.
    pub fn windows_mut(&mut self) -> &mut WindowManager {
        &mut self.windows
    }

    /// Process table.
    #[must_use]
    pub fn processes(&self) -> &ProcessManager {
        &self.processes
    }

    /// Shell notification bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Configuration the desktop was built with.
    #[must_use]
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Start an app in a new window.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::AppNotFound`](crate::KernelError::AppNotFound)
    /// for an unknown app id.
    pub fn launch(&mut self, app_id: &str) -> KernelResult<Process> {
        self.processes
            .launch(&self.registry, &mut self.windows, app_id)
    }

    /// Close a window and reap the processes bound to it.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`](crate::KernelError::WindowNotFound)
    /// if the window is not live.
    pub fn close_window(&mut self, window_id: WindowId) -> KernelResult<Vec<Process>> {
        self.windows.close(window_id)?;
        Ok(self.processes.reap_window(window_id))
    }

    /// Close whichever window is on top. Returns the closed window's id.
    pub fn close_top_window(&mut self) -> Option<WindowId> {
        let top = self.windows.top_window()?;
        self.close_window(top).ok().map(|_| top)
    }

    /// Install or replace an app.
    ///
    /// # Errors
    ///
    /// Propagates registry errors unchanged.
    pub async fn install(&mut self, manifest: AppManifest) -> KernelResult<()> {
        Ok(self.registry.install(manifest).await?)
    }

    /// Validate and install an untyped manifest.
    ///
    /// # Errors
    ///
    /// Propagates registry errors unchanged.
    pub async fn install_value(&mut self, raw: &Value) -> KernelResult<()> {
        Ok(self.registry.install_value(raw).await?)
    }

    /// Remove an installed app and close every window running it.
    ///
    /// Returns the ids of the closed windows.
    ///
    /// # Errors
    ///
    /// Propagates registry errors unchanged; nothing is closed when the
    /// uninstall is refused.
    pub async fn uninstall(&mut self, app_id: &str) -> KernelResult<Vec<WindowId>> {
        let removed = self.registry.uninstall(app_id).await?;
        let doomed = self.windows.windows_for_app(&removed.id);
        for window_id in &doomed {
            self.close_window(*window_id)?;
        }
        info!(app_id, closed = doomed.len(), "Uninstalled app's windows closed");
        Ok(doomed)
    }

    /// Metered storage of one app.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the app id is not a usable namespace.
    pub fn app_storage(&self, app_id: &AppId) -> StorageResult<AppStorage> {
        AppStorage::new(
            Arc::clone(&self.store),
            app_id,
            self.config.storage_quota_bytes,
        )
    }

    /// Run one frame from a process through the capability gate.
    ///
    /// Returns whether a reply was delivered.
    pub async fn handle_frame(&mut self, inbound: InboundFrame) -> bool {
        gate::handle_frame(self, inbound).await
    }

    /// Close every window and reap every process. Returns how many windows
    /// were closed.
    pub fn teardown(&mut self) -> usize {
        let ids = self.windows.ids();
        let mut closed = 0usize;
        for window_id in ids {
            if self.close_window(window_id).is_ok() {
                closed = closed.saturating_add(1);
            }
        }
        closed
    }
}
