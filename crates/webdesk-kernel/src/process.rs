//! Process table.
//!
//! A process is a running app instance bound to exactly one window. There
//! is no way to end a process directly; it goes away when its window does.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};
use webdesk_apps::AppRegistry;
use webdesk_core::{AppId, ProcessId, WindowId};
use webdesk_events::{EventBus, ShellEvent};

use crate::error::{KernelError, KernelResult};
use crate::window::WindowManager;

/// A running app instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Process {
    /// Process id.
    pub id: ProcessId,
    /// App the process runs.
    pub app_id: AppId,
    /// Window the process renders into.
    pub window_id: WindowId,
}

/// Owner of the process-to-window association.
#[derive(Debug)]
pub struct ProcessManager {
    processes: BTreeMap<ProcessId, Process>,
    next_pid: ProcessId,
    events: EventBus,
}

impl ProcessManager {
    /// Create an empty table. The first process gets id 1.
    #[must_use]
    pub fn new(events: EventBus) -> Self {
        Self {
            processes: BTreeMap::new(),
            next_pid: ProcessId::FIRST,
            events,
        }
    }

    /// Start `app_id` in a new window and return the new process record.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::AppNotFound`] if the registry does not know the
    /// app. Nothing else is touched and a `LaunchFailed` event is published.
    pub fn launch(
        &mut self,
        registry: &AppRegistry,
        windows: &mut WindowManager,
        app_id: &str,
    ) -> KernelResult<Process> {
        let Some(app) = registry.get(app_id) else {
            warn!(app_id, "Launch requested for unknown app");
            let app_id = AppId::from(app_id);
            self.events.publish(ShellEvent::LaunchFailed {
                app_id: app_id.clone(),
                reason: format!("App not found: {app_id}"),
            });
            return Err(KernelError::AppNotFound(app_id));
        };

        let entry_url = app.entry_url.clone();
        let app_id = app.id.clone();
        let window_id = windows.create(app, &entry_url);

        let pid = self.next_pid;
        self.next_pid = pid.next();
        let process = Process {
            id: pid,
            app_id: app_id.clone(),
            window_id,
        };
        self.processes.insert(pid, process.clone());

        info!(process_id = %pid, app_id = %app_id, window_id = %window_id, "Process launched");
        self.events.publish(ShellEvent::ProcessStarted {
            process_id: pid,
            app_id,
            window_id,
        });
        Ok(process)
    }

    /// Drop every process bound to `window_id`.
    pub fn reap_window(&mut self, window_id: WindowId) -> Vec<Process> {
        let pids: Vec<ProcessId> = self
            .processes
            .values()
            .filter(|p| p.window_id == window_id)
            .map(|p| p.id)
            .collect();
        let reaped: Vec<Process> = pids
            .into_iter()
            .filter_map(|pid| self.processes.remove(&pid))
            .collect();
        for p in &reaped {
            debug!(process_id = %p.id, window_id = %window_id, "Process reaped");
        }
        reaped
    }

    /// Look up a process.
    #[must_use]
    pub fn get(&self, pid: ProcessId) -> Option<&Process> {
        self.processes.get(&pid)
    }

    /// The process bound to `window_id`, if any.
    #[must_use]
    pub fn for_window(&self, window_id: WindowId) -> Option<&Process> {
        self.processes.values().find(|p| p.window_id == window_id)
    }

    /// Every live process in id order.
    #[must_use]
    pub fn list(&self) -> Vec<Process> {
        self.processes.values().cloned().collect()
    }

    /// Number of live processes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    /// Whether no process is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}
