//! Shell notification types.

use serde::{Deserialize, Serialize};
use webdesk_core::{AppId, ProcessId, WindowId};

/// A change in host state the shell chrome may want to reflect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShellEvent {
    /// A window was created; the dock should gain an entry.
    WindowOpened {
        /// The new window.
        window_id: WindowId,
        /// App the window belongs to.
        app_id: AppId,
        /// Title shown in the window chrome and dock.
        title: String,
        /// Icon reference for the dock entry.
        icon: String,
    },
    /// A window was raised and marked active.
    WindowFocused {
        /// The focused window.
        window_id: WindowId,
    },
    /// A window was hidden.
    WindowMinimized {
        /// The minimized window.
        window_id: WindowId,
    },
    /// A minimized window became visible again.
    WindowRestored {
        /// The restored window.
        window_id: WindowId,
    },
    /// A window was expanded to fill the content area.
    WindowMaximized {
        /// The maximized window.
        window_id: WindowId,
    },
    /// A maximized window went back to its previous rectangle.
    WindowRestoredSize {
        /// The window.
        window_id: WindowId,
    },
    /// A window was destroyed; its dock entry should go.
    WindowClosed {
        /// The destroyed window.
        window_id: WindowId,
        /// App the window belonged to.
        app_id: AppId,
    },
    /// A process was started.
    ProcessStarted {
        /// The new process.
        process_id: ProcessId,
        /// App it runs.
        app_id: AppId,
        /// Window it is bound to.
        window_id: WindowId,
    },
    /// An app asked the shell to show a message.
    Alert {
        /// The requesting app.
        app_id: AppId,
        /// Message text.
        message: String,
    },
    /// An app asked the shell to open a URL outside the desktop.
    OpenUrl {
        /// The requesting app.
        app_id: AppId,
        /// Target URL.
        url: String,
    },
    /// A launch request could not be satisfied.
    LaunchFailed {
        /// The requested app id.
        app_id: AppId,
        /// Why the launch failed.
        reason: String,
    },
    /// The set of installed apps changed.
    RegistryChanged,
    /// The user's session ended and the desktop was torn down.
    SessionEnded,
}

impl ShellEvent {
    /// Dotted name of the event kind, usable for topic filtering.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::WindowOpened { .. } => "window.opened",
            Self::WindowFocused { .. } => "window.focused",
            Self::WindowMinimized { .. } => "window.minimized",
            Self::WindowRestored { .. } => "window.restored",
            Self::WindowMaximized { .. } => "window.maximized",
            Self::WindowRestoredSize { .. } => "window.restored_size",
            Self::WindowClosed { .. } => "window.closed",
            Self::ProcessStarted { .. } => "process.started",
            Self::Alert { .. } => "shell.alert",
            Self::OpenUrl { .. } => "shell.open_url",
            Self::LaunchFailed { .. } => "shell.launch_failed",
            Self::RegistryChanged => "registry.changed",
            Self::SessionEnded => "session.ended",
        }
    }

    /// The window this event concerns, if any.
    #[must_use]
    pub fn window_id(&self) -> Option<WindowId> {
        match self {
            Self::WindowOpened { window_id, .. }
            | Self::WindowFocused { window_id }
            | Self::WindowMinimized { window_id }
            | Self::WindowRestored { window_id }
            | Self::WindowMaximized { window_id }
            | Self::WindowRestoredSize { window_id }
            | Self::WindowClosed { window_id, .. }
            | Self::ProcessStarted { window_id, .. } => Some(*window_id),
            _ => None,
        }
    }
}
