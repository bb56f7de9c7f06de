//! Commands from the rendering surface into the kernel loop.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use webdesk_apps::AppManifest;
use webdesk_core::{Rect, WindowId};
use webdesk_events::{EventBus, EventReceiver};

use crate::error::{KernelError, KernelResult};
use crate::process::Process;
use crate::window::{FocusOptions, WindowInfo};

/// How many commands may queue before senders wait.
pub(crate) const COMMAND_QUEUE_CAPACITY: usize = 64;

type Reply<T> = oneshot::Sender<T>;

/// A user action or query, handled by the kernel loop one at a time.
#[derive(Debug)]
pub(crate) enum Command {
    Launch {
        app_id: String,
        reply: Reply<KernelResult<Process>>,
    },
    Focus {
        window_id: WindowId,
        options: FocusOptions,
        reply: Reply<KernelResult<()>>,
    },
    Minimize {
        window_id: WindowId,
        reply: Reply<KernelResult<()>>,
    },
    ToggleMaximize {
        window_id: WindowId,
        reply: Reply<KernelResult<()>>,
    },
    Close {
        window_id: WindowId,
        reply: Reply<KernelResult<Vec<Process>>>,
    },
    CloseTop {
        reply: Reply<Option<WindowId>>,
    },
    Move {
        window_id: WindowId,
        left: f64,
        top: f64,
        reply: Reply<KernelResult<Rect>>,
    },
    Resize {
        window_id: WindowId,
        width: f64,
        height: f64,
        reply: Reply<KernelResult<Rect>>,
    },
    SetContentArea {
        width: f64,
        height: f64,
        reply: Reply<KernelResult<()>>,
    },
    TopWindow {
        reply: Reply<Option<WindowId>>,
    },
    Windows {
        reply: Reply<Vec<WindowInfo>>,
    },
    Processes {
        reply: Reply<Vec<Process>>,
    },
    Apps {
        query: String,
        reply: Reply<Vec<Arc<AppManifest>>>,
    },
    Install {
        manifest: Box<AppManifest>,
        reply: Reply<KernelResult<()>>,
    },
    Uninstall {
        app_id: String,
        reply: Reply<KernelResult<Vec<WindowId>>>,
    },
}

/// Cloneable handle the shell chrome drives the kernel through.
///
/// Once every handle is dropped the kernel loop shuts down.
#[derive(Debug, Clone)]
pub struct KernelHandle {
    commands: mpsc::Sender<Command>,
    events: EventBus,
}

impl KernelHandle {
    pub(crate) fn new(commands: mpsc::Sender<Command>, events: EventBus) -> Self {
        Self { commands, events }
    }

    /// Subscribe to shell notifications.
    #[must_use]
    pub fn subscribe(&self) -> EventReceiver {
        self.events.subscribe()
    }

    /// Subscribe to shell notifications whose type matches `pattern`, e.g.
    /// `window.*`.
    #[must_use]
    pub fn subscribe_topic(&self, pattern: impl Into<String>) -> EventReceiver {
        self.events.subscribe_topic(pattern)
    }

    /// Whether the kernel loop has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> KernelResult<T> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| KernelError::Stopped)?;
        rx.await.map_err(|_| KernelError::Stopped)
    }

    /// Start an app.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::AppNotFound`] for an unknown app, or
    /// [`KernelError::Stopped`] if the loop is gone.
    pub async fn launch(&self, app_id: impl Into<String>) -> KernelResult<Process> {
        let app_id = app_id.into();
        self.request(|reply| Command::Launch { app_id, reply })
            .await?
    }

    /// Raise a window, optionally flipping its minimized state.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] or [`KernelError::Stopped`].
    pub async fn focus(&self, window_id: WindowId, options: FocusOptions) -> KernelResult<()> {
        self.request(|reply| Command::Focus {
            window_id,
            options,
            reply,
        })
        .await?
    }

    /// Hide a window.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] or [`KernelError::Stopped`].
    pub async fn minimize(&self, window_id: WindowId) -> KernelResult<()> {
        self.request(|reply| Command::Minimize { window_id, reply })
            .await?
    }

    /// Maximize or restore a window.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] or [`KernelError::Stopped`].
    pub async fn toggle_maximize(&self, window_id: WindowId) -> KernelResult<()> {
        self.request(|reply| Command::ToggleMaximize { window_id, reply })
            .await?
    }

    /// Close a window. Returns the processes that went with it.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] or [`KernelError::Stopped`].
    pub async fn close_window(&self, window_id: WindowId) -> KernelResult<Vec<Process>> {
        self.request(|reply| Command::Close { window_id, reply })
            .await?
    }

    /// Close the top window, if any.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Stopped`] if the loop is gone.
    pub async fn close_top_window(&self) -> KernelResult<Option<WindowId>> {
        self.request(|reply| Command::CloseTop { reply }).await
    }

    /// Drag a window.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] or [`KernelError::Stopped`].
    pub async fn move_window(&self, window_id: WindowId, left: f64, top: f64) -> KernelResult<Rect> {
        self.request(|reply| Command::Move {
            window_id,
            left,
            top,
            reply,
        })
        .await?
    }

    /// Resize a window.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] or [`KernelError::Stopped`].
    pub async fn resize_window(
        &self,
        window_id: WindowId,
        width: f64,
        height: f64,
    ) -> KernelResult<Rect> {
        self.request(|reply| Command::Resize {
            window_id,
            width,
            height,
            reply,
        })
        .await?
    }

    /// Report a new content area size.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidGeometry`] or [`KernelError::Stopped`].
    pub async fn set_content_area(&self, width: f64, height: f64) -> KernelResult<()> {
        self.request(|reply| Command::SetContentArea {
            width,
            height,
            reply,
        })
        .await?
    }

    /// The visible window on top.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Stopped`] if the loop is gone.
    pub async fn top_window(&self) -> KernelResult<Option<WindowId>> {
        self.request(|reply| Command::TopWindow { reply }).await
    }

    /// Snapshots of every live window, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Stopped`] if the loop is gone.
    pub async fn windows(&self) -> KernelResult<Vec<WindowInfo>> {
        self.request(|reply| Command::Windows { reply }).await
    }

    /// Every live process.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Stopped`] if the loop is gone.
    pub async fn processes(&self) -> KernelResult<Vec<Process>> {
        self.request(|reply| Command::Processes { reply }).await
    }

    /// Apps matching `query` (all apps for an empty query).
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Stopped`] if the loop is gone.
    pub async fn apps(&self, query: impl Into<String>) -> KernelResult<Vec<Arc<AppManifest>>> {
        let query = query.into();
        self.request(|reply| Command::Apps { query, reply }).await
    }

    /// Install or replace an app.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Registry`] or [`KernelError::Stopped`].
    pub async fn install(&self, manifest: AppManifest) -> KernelResult<()> {
        self.request(|reply| Command::Install {
            manifest: Box::new(manifest),
            reply,
        })
        .await?
    }

    /// Uninstall an app and close its windows.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Registry`] or [`KernelError::Stopped`].
    pub async fn uninstall(&self, app_id: impl Into<String>) -> KernelResult<Vec<WindowId>> {
        let app_id = app_id.into();
        self.request(|reply| Command::Uninstall { app_id, reply })
            .await?
    }
}
