//! Boot and the single control loop.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use webdesk_events::{EventBus, ShellEvent};
use webdesk_rpc::InboundFrame;
use webdesk_storage::KvStore;

use crate::config::HostConfig;
use crate::desktop::Desktop;
use crate::error::{KernelError, KernelResult};
use crate::handle::{COMMAND_QUEUE_CAPACITY, Command, KernelHandle};
use crate::session::{AuthEvent, IdentityProvider, Session, UserProfile};
use crate::surface::SurfaceHost;

/// Why [`Kernel::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The session ended; the embedder should send the user to sign in.
    SignedOut,
    /// Every [`KernelHandle`] was dropped.
    Shutdown,
}

/// A booted desktop and the loop that drives it.
pub struct Kernel {
    desktop: Desktop,
    identity: Arc<dyn IdentityProvider>,
    session: Session,
    profile: UserProfile,
    commands: mpsc::Receiver<Command>,
    frames: mpsc::UnboundedReceiver<InboundFrame>,
    auth: broadcast::Receiver<AuthEvent>,
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("desktop", &self.desktop)
            .field("user_id", &self.session.user_id)
            .finish_non_exhaustive()
    }
}

impl Kernel {
    /// Check the session, load the registry and build an empty desktop.
    ///
    /// # Errors
    ///
    /// - [`KernelError::Unauthenticated`] if there is no session.
    /// - [`KernelError::ProfileUnavailable`] if the session has no profile.
    /// - [`KernelError::Identity`] if the provider fails.
    /// - [`KernelError::Registry`] if the installed apps cannot be read.
    pub async fn boot(
        config: HostConfig,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn KvStore>,
        surfaces: Box<dyn SurfaceHost>,
    ) -> KernelResult<(Self, KernelHandle)> {
        // Subscribe first so a sign-out racing the checks below is not lost.
        let auth = identity.subscribe();

        let session = identity
            .check_session()
            .await?
            .ok_or(KernelError::Unauthenticated)?;
        let profile = identity
            .current_user()
            .await?
            .ok_or(KernelError::ProfileUnavailable)?;

        let version = config.version.clone();
        let events = EventBus::new();
        let (desktop, frames) = Desktop::new(config, store, surfaces, events.clone()).await?;
        let (commands_tx, commands) = mpsc::channel(COMMAND_QUEUE_CAPACITY);

        info!(
            version = %version,
            user_id = %session.user_id,
            user = profile.display_name(),
            apps = desktop.registry().list().len(),
            "Desktop booted"
        );

        let kernel = Self {
            desktop,
            identity,
            session,
            profile,
            commands,
            frames,
            auth,
        };
        Ok((kernel, KernelHandle::new(commands_tx, events)))
    }

    /// The desktop context.
    #[must_use]
    pub fn desktop(&self) -> &Desktop {
        &self.desktop
    }

    /// The desktop context, for embedders driving it without the loop.
    pub fn desktop_mut(&mut self) -> &mut Desktop {
        &mut self.desktop
    }

    /// The session the desktop was booted with.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The signed-in user's profile.
    #[must_use]
    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    /// The identity collaborator.
    #[must_use]
    pub fn identity(&self) -> &Arc<dyn IdentityProvider> {
        &self.identity
    }

    /// Handle auth events, commands and process frames one at a time until
    /// the session ends or every handle is dropped.
    ///
    /// Auth events are checked first so a sign-out is never queued behind
    /// process traffic.
    pub async fn run(mut self) -> ExitReason {
        let mut auth_open = true;
        loop {
            tokio::select! {
                biased;
                event = self.auth.recv(), if auth_open => {
                    match event {
                        Ok(event) if event.ends_session() => {
                            self.end_session();
                            return ExitReason::SignedOut;
                        },
                        Ok(_) => debug!("Auth state refreshed"),
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Auth events lagged, rechecking session");
                            if !matches!(self.identity.check_session().await, Ok(Some(_))) {
                                self.end_session();
                                return ExitReason::SignedOut;
                            }
                        },
                        Err(RecvError::Closed) => {
                            debug!("Identity provider stopped publishing auth events");
                            auth_open = false;
                        },
                    }
                }
                command = self.commands.recv() => {
                    if let Some(command) = command {
                        self.apply(command).await;
                    } else {
                        let closed = self.desktop.teardown();
                        info!(closed, "All kernel handles dropped, shutting down");
                        return ExitReason::Shutdown;
                    }
                }
                Some(frame) = self.frames.recv() => {
                    self.desktop.handle_frame(frame).await;
                }
            }
        }
    }

    fn end_session(&mut self) {
        let closed = self.desktop.teardown();
        info!(user_id = %self.session.user_id, closed, "Session ended, desktop torn down");
        self.desktop.events().publish(ShellEvent::SessionEnded);
    }

    async fn apply(&mut self, command: Command) {
        let desk = &mut self.desktop;
        match command {
            Command::Launch { app_id, reply } => {
                let _ = reply.send(desk.launch(&app_id));
            },
            Command::Focus {
                window_id,
                options,
                reply,
            } => {
                let _ = reply.send(desk.windows_mut().focus(window_id, options));
            },
            Command::Minimize { window_id, reply } => {
                let _ = reply.send(desk.windows_mut().minimize(window_id));
            },
            Command::ToggleMaximize { window_id, reply } => {
                let _ = reply.send(desk.windows_mut().toggle_maximize(window_id));
            },
            Command::Close { window_id, reply } => {
                let _ = reply.send(desk.close_window(window_id));
            },
            Command::CloseTop { reply } => {
                let _ = reply.send(desk.close_top_window());
            },
            Command::Move {
                window_id,
                left,
                top,
                reply,
            } => {
                let _ = reply.send(desk.windows_mut().move_window(window_id, left, top));
            },
            Command::Resize {
                window_id,
                width,
                height,
                reply,
            } => {
                let _ = reply.send(desk.windows_mut().resize_window(window_id, width, height));
            },
            Command::SetContentArea {
                width,
                height,
                reply,
            } => {
                let _ = reply.send(desk.windows_mut().set_content_area(width, height));
            },
            Command::TopWindow { reply } => {
                let _ = reply.send(desk.windows().top_window());
            },
            Command::Windows { reply } => {
                let _ = reply.send(desk.windows().infos());
            },
            Command::Processes { reply } => {
                let _ = reply.send(desk.processes().list());
            },
            Command::Apps { query, reply } => {
                let _ = reply.send(desk.registry().search(&query));
            },
            Command::Install { manifest, reply } => {
                let _ = reply.send(desk.install(*manifest).await);
            },
            Command::Uninstall { app_id, reply } => {
                let _ = reply.send(desk.uninstall(&app_id).await);
            },
        }
    }
}
