//! Window lifecycle, stacking and geometry.
//!
//! Stacking order is a counter that only ever grows: creating or focusing a
//! window stamps it with the next value. The window on top is the visible
//! one with the highest stamp, ties broken by creation order.

use std::collections::HashMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webdesk_apps::AppManifest;
use webdesk_core::{AppId, Rect, SurfaceId, WindowId};
use webdesk_events::{EventBus, ShellEvent};
use webdesk_rpc::{HostLink, InboundFrame, duplex};

use crate::config::WindowGeometry;
use crate::error::{KernelError, KernelResult};
use crate::surface::{SurfaceAttachment, SurfaceHost};

/// Whether a window is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// On screen.
    Visible,
    /// Hidden but alive.
    Minimized,
}

/// Options for [`WindowManager::focus`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusOptions {
    /// Flip between visible and minimized after raising.
    pub toggle_minimize: bool,
}

impl FocusOptions {
    /// Focus and flip minimized state, as a dock click does.
    #[must_use]
    pub const fn toggle_minimize() -> Self {
        Self {
            toggle_minimize: true,
        }
    }
}

/// A live window.
#[derive(Debug)]
pub struct Window {
    id: WindowId,
    app: Arc<AppManifest>,
    link: HostLink,
    stacking: u64,
    seq: u64,
    rect: Rect,
    maximized: bool,
    saved_rect: Option<Rect>,
    visibility: Visibility,
}

impl Window {
    /// Window id.
    #[must_use]
    pub fn id(&self) -> WindowId {
        self.id
    }

    /// Manifest of the app the window hosts.
    #[must_use]
    pub fn app(&self) -> &Arc<AppManifest> {
        &self.app
    }

    /// Id of the app the window hosts.
    #[must_use]
    pub fn app_id(&self) -> &AppId {
        &self.app.id
    }

    /// Surface rendered inside the window.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.link.surface_id()
    }

    /// Host end of the window's RPC channel.
    #[must_use]
    pub fn link(&self) -> &HostLink {
        &self.link
    }

    /// Current stacking stamp.
    #[must_use]
    pub fn stacking(&self) -> u64 {
        self.stacking
    }

    /// Current rectangle.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Whether the window fills the content area.
    #[must_use]
    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    /// Rectangle to restore on un-maximize.
    #[must_use]
    pub fn saved_rect(&self) -> Option<Rect> {
        self.saved_rect
    }

    /// Visibility.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Whether the window is on screen.
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visibility == Visibility::Visible
    }

    /// A detached snapshot for the shell chrome.
    #[must_use]
    pub fn info(&self) -> WindowInfo {
        WindowInfo {
            window_id: self.id,
            app_id: self.app.id.clone(),
            title: self.app.name.clone(),
            icon: self.app.icon.clone(),
            surface_id: self.surface_id(),
            stacking: self.stacking,
            rect: self.rect,
            maximized: self.maximized,
            visibility: self.visibility,
        }
    }
}

/// Snapshot of a window's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowInfo {
    /// Window id.
    pub window_id: WindowId,
    /// App the window hosts.
    pub app_id: AppId,
    /// Title from the app name.
    pub title: String,
    /// Icon reference from the manifest.
    pub icon: String,
    /// Surface rendered inside.
    pub surface_id: SurfaceId,
    /// Stacking stamp.
    pub stacking: u64,
    /// Rectangle.
    pub rect: Rect,
    /// Maximized flag.
    pub maximized: bool,
    /// Visibility.
    pub visibility: Visibility,
}

// ---------------------------------------------------------------------------
// WindowManager
// ---------------------------------------------------------------------------

/// Owner of every live window.
pub struct WindowManager {
    windows: HashMap<WindowId, Window>,
    by_surface: HashMap<SurfaceId, WindowId>,
    z_top: u64,
    next_seq: u64,
    active: Option<WindowId>,
    geometry: WindowGeometry,
    content_area: Rect,
    rng: StdRng,
    surfaces: Box<dyn SurfaceHost>,
    frames_tx: mpsc::UnboundedSender<InboundFrame>,
    events: EventBus,
}

impl std::fmt::Debug for WindowManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowManager")
            .field("windows", &self.windows.len())
            .field("z_top", &self.z_top)
            .field("active", &self.active)
            .field("content_area", &self.content_area)
            .finish_non_exhaustive()
    }
}

impl WindowManager {
    /// Create an empty window manager.
    ///
    /// `frames_tx` is the host's fan-in queue; every window's channel feeds
    /// into it.
    #[must_use]
    pub fn new(
        geometry: WindowGeometry,
        placement_seed: Option<u64>,
        surfaces: Box<dyn SurfaceHost>,
        frames_tx: mpsc::UnboundedSender<InboundFrame>,
        events: EventBus,
    ) -> Self {
        let rng = match placement_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            windows: HashMap::new(),
            by_surface: HashMap::new(),
            z_top: 0,
            next_seq: 0,
            active: None,
            content_area: geometry.content_area,
            geometry,
            rng,
            surfaces,
            frames_tx,
            events,
        }
    }

    /// Open a window for `app` loading `entry_url`, and focus it.
    pub fn create(&mut self, app: Arc<AppManifest>, entry_url: &str) -> WindowId {
        let id = WindowId::new();
        let surface_id = SurfaceId::new();
        let (link, channel) = duplex(surface_id, self.frames_tx.clone());

        let left = self.geometry.origin_left + jitter(&mut self.rng, self.geometry.jitter_left);
        let top = self.geometry.origin_top + jitter(&mut self.rng, self.geometry.jitter_top);
        let rect = Rect::new(
            left,
            top,
            self.geometry.default_width,
            self.geometry.default_height,
        );

        self.z_top = self.z_top.saturating_add(1);
        let seq = self.next_seq;
        self.next_seq = self.next_seq.saturating_add(1);

        let app_id = app.id.clone();
        let title = app.name.clone();
        let icon = app.icon.clone();

        self.windows.insert(
            id,
            Window {
                id,
                app,
                link,
                stacking: self.z_top,
                seq,
                rect,
                maximized: false,
                saved_rect: None,
                visibility: Visibility::Visible,
            },
        );
        self.by_surface.insert(surface_id, id);

        self.surfaces.attach(SurfaceAttachment {
            surface_id,
            window_id: id,
            app_id: app_id.clone(),
            entry_url: entry_url.to_owned(),
            channel,
        });
        info!(window_id = %id, app_id = %app_id, surface_id = %surface_id, "Window created");
        self.events.publish(ShellEvent::WindowOpened {
            window_id: id,
            app_id,
            title,
            icon,
        });

        self.raise(id);
        id
    }

    /// Raise a window to the top and mark it active.
    ///
    /// With [`FocusOptions::toggle_minimize`] the window's visibility is
    /// flipped after raising.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] if the window is not live.
    pub fn focus(&mut self, id: WindowId, options: FocusOptions) -> KernelResult<()> {
        if !self.windows.contains_key(&id) {
            return Err(KernelError::WindowNotFound(id));
        }
        self.raise(id);

        if options.toggle_minimize {
            let visible = self
                .windows
                .get(&id)
                .is_some_and(Window::is_visible);
            if visible {
                self.minimize(id)?;
            } else {
                self.restore(id);
            }
        }
        Ok(())
    }

    /// Hide a window. It stays live.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] if the window is not live.
    pub fn minimize(&mut self, id: WindowId) -> KernelResult<()> {
        let win = self
            .windows
            .get_mut(&id)
            .ok_or(KernelError::WindowNotFound(id))?;
        if win.visibility == Visibility::Minimized {
            return Ok(());
        }
        win.visibility = Visibility::Minimized;
        if self.active == Some(id) {
            self.active = None;
        }
        debug!(window_id = %id, "Window minimized");
        self.events
            .publish(ShellEvent::WindowMinimized { window_id: id });
        Ok(())
    }

    /// Maximize a window, or put it back where it was.
    ///
    /// A maximized window with no saved rectangle just drops the flag.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] if the window is not live.
    pub fn toggle_maximize(&mut self, id: WindowId) -> KernelResult<()> {
        let area = Rect::from_size(self.content_area.width, self.content_area.height);
        let win = self
            .windows
            .get_mut(&id)
            .ok_or(KernelError::WindowNotFound(id))?;

        let event = if win.maximized {
            if let Some(saved) = win.saved_rect.take() {
                win.rect = saved;
            }
            win.maximized = false;
            ShellEvent::WindowRestoredSize { window_id: id }
        } else {
            win.saved_rect = Some(win.rect);
            win.rect = area;
            win.maximized = true;
            ShellEvent::WindowMaximized { window_id: id }
        };
        debug!(window_id = %id, maximized = win.maximized, "Window maximize toggled");
        self.events.publish(event);
        Ok(())
    }

    /// Destroy a window and detach its surface. The id is never reused.
    ///
    /// Processes bound to the window are not touched here; the desktop reaps
    /// them in the same operation.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] if the window is not live.
    pub fn close(&mut self, id: WindowId) -> KernelResult<Window> {
        let win = self
            .windows
            .remove(&id)
            .ok_or(KernelError::WindowNotFound(id))?;
        let surface_id = win.surface_id();
        self.by_surface.remove(&surface_id);
        if self.active == Some(id) {
            self.active = None;
        }
        self.surfaces.detach(surface_id, id);

        info!(window_id = %id, app_id = %win.app.id, "Window closed");
        self.events.publish(ShellEvent::WindowClosed {
            window_id: id,
            app_id: win.app.id.clone(),
        });
        Ok(win)
    }

    /// The visible window with the highest stacking stamp.
    #[must_use]
    pub fn top_window(&self) -> Option<WindowId> {
        self.windows
            .values()
            .filter(|w| w.is_visible())
            .max_by_key(|w| (w.stacking, w.seq))
            .map(|w| w.id)
    }

    /// Move a window, keeping it inside the content area.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] if the window is not live.
    pub fn move_window(&mut self, id: WindowId, left: f64, top: f64) -> KernelResult<Rect> {
        let area = self.content_area;
        let win = self
            .windows
            .get_mut(&id)
            .ok_or(KernelError::WindowNotFound(id))?;
        win.rect.left = clamp_offset(left, area.width - win.rect.width);
        win.rect.top = clamp_offset(top, area.height - win.rect.height);
        Ok(win.rect)
    }

    /// Resize a window within the content area, never below the minimum
    /// size.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::WindowNotFound`] if the window is not live.
    pub fn resize_window(&mut self, id: WindowId, width: f64, height: f64) -> KernelResult<Rect> {
        let area = self.content_area;
        let (min_width, min_height) = (self.geometry.min_width, self.geometry.min_height);
        let win = self
            .windows
            .get_mut(&id)
            .ok_or(KernelError::WindowNotFound(id))?;
        win.rect.width = width
            .min(area.width - win.rect.left)
            .max(min_width);
        win.rect.height = height
            .min(area.height - win.rect.top)
            .max(min_height);
        Ok(win.rect)
    }

    /// Change the area windows live in. Maximized windows follow it.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidGeometry`] unless both sides are finite
    /// and positive.
    pub fn set_content_area(&mut self, width: f64, height: f64) -> KernelResult<()> {
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(KernelError::InvalidGeometry(format!(
                "content area must be positive, got {width}x{height}"
            )));
        }
        self.content_area = Rect::from_size(width, height);
        for win in self.windows.values_mut().filter(|w| w.maximized) {
            win.rect = self.content_area;
        }
        Ok(())
    }

    /// Area windows are clamped to.
    #[must_use]
    pub fn content_area(&self) -> Rect {
        self.content_area
    }

    /// The most recently focused window, unless it was since hidden or
    /// closed.
    #[must_use]
    pub fn active(&self) -> Option<WindowId> {
        self.active
    }

    /// Look up a window.
    #[must_use]
    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    /// Resolve the window whose surface sent a frame.
    #[must_use]
    pub fn window_for_surface(&self, surface_id: SurfaceId) -> Option<&Window> {
        self.by_surface
            .get(&surface_id)
            .and_then(|id| self.windows.get(id))
    }

    /// Windows hosting `app_id`, oldest first.
    #[must_use]
    pub fn windows_for_app(&self, app_id: &AppId) -> Vec<WindowId> {
        let mut matching: Vec<&Window> = self
            .windows
            .values()
            .filter(|w| &w.app.id == app_id)
            .collect();
        matching.sort_by_key(|w| w.seq);
        matching.into_iter().map(|w| w.id).collect()
    }

    /// Snapshots of every window, oldest first.
    #[must_use]
    pub fn infos(&self) -> Vec<WindowInfo> {
        let mut all: Vec<&Window> = self.windows.values().collect();
        all.sort_by_key(|w| w.seq);
        all.into_iter().map(Window::info).collect()
    }

    /// Ids of every window, oldest first.
    #[must_use]
    pub fn ids(&self) -> Vec<WindowId> {
        self.infos().into_iter().map(|i| i.window_id).collect()
    }

    /// Number of live windows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    /// Whether no window is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn raise(&mut self, id: WindowId) {
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        self.z_top = self.z_top.saturating_add(1);
        win.stacking = self.z_top;
        self.active = Some(id);
        self.events
            .publish(ShellEvent::WindowFocused { window_id: id });
    }

    fn restore(&mut self, id: WindowId) {
        let Some(win) = self.windows.get_mut(&id) else {
            return;
        };
        if win.visibility == Visibility::Visible {
            return;
        }
        win.visibility = Visibility::Visible;
        self.active = Some(id);
        debug!(window_id = %id, "Window restored");
        self.events
            .publish(ShellEvent::WindowRestored { window_id: id });
    }
}

fn jitter(rng: &mut StdRng, bound: f64) -> f64 {
    if bound > 0.0 {
        rng.gen_range(0.0..bound)
    } else {
        0.0
    }
}

fn clamp_offset(value: f64, max: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max.max(0.0))
}
