//! The boundary to whatever renders app windows.
//!
//! When a window is created the host builds a duplex channel and hands the
//! process half to a [`SurfaceHost`], which is expected to load the app's
//! entry URL and connect it to that channel. When the window closes the host
//! tells the surface host to drop it.

use tokio::sync::mpsc;
use tracing::debug;
use webdesk_core::{AppId, SurfaceId, WindowId};
use webdesk_rpc::ProcessChannel;

/// A rendering surface the host asks to be materialized.
#[derive(Debug)]
pub struct SurfaceAttachment {
    /// Surface identity, stamped on every frame the process sends.
    pub surface_id: SurfaceId,
    /// Window hosting the surface.
    pub window_id: WindowId,
    /// App the surface runs.
    pub app_id: AppId,
    /// URL the surface should load.
    pub entry_url: String,
    /// Process end of the RPC channel.
    pub channel: ProcessChannel,
}

/// Renders surfaces for the host.
///
/// Called from the host's control loop, so implementations must not block.
pub trait SurfaceHost: Send + Sync {
    /// Materialize a new surface.
    fn attach(&mut self, attachment: SurfaceAttachment);

    /// Tear a surface down. Called exactly once per attached surface.
    fn detach(&mut self, surface_id: SurfaceId, window_id: WindowId);
}

/// What a [`ChannelSurfaceHost`] forwards to the embedder.
#[derive(Debug)]
pub enum SurfaceEvent {
    /// A surface should be created.
    Attached(SurfaceAttachment),
    /// A surface should be removed.
    Detached {
        /// The surface.
        surface_id: SurfaceId,
        /// The window it lived in.
        window_id: WindowId,
    },
}

/// A [`SurfaceHost`] that forwards every request over a channel.
#[derive(Debug, Clone)]
pub struct ChannelSurfaceHost {
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl ChannelSurfaceHost {
    /// Create the host and the receiver the embedder drains.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SurfaceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl SurfaceHost for ChannelSurfaceHost {
    fn attach(&mut self, attachment: SurfaceAttachment) {
        let surface_id = attachment.surface_id;
        if self.tx.send(SurfaceEvent::Attached(attachment)).is_err() {
            debug!(surface_id = %surface_id, "Surface receiver gone, attach dropped");
        }
    }

    fn detach(&mut self, surface_id: SurfaceId, window_id: WindowId) {
        if self
            .tx
            .send(SurfaceEvent::Detached {
                surface_id,
                window_id,
            })
            .is_err()
        {
            debug!(surface_id = %surface_id, "Surface receiver gone, detach dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use webdesk_rpc::duplex;

    use super::*;

    #[tokio::test]
    async fn test_channel_host_forwards_attach_and_detach() {
        let (mut host, mut rx) = ChannelSurfaceHost::new();
        let (frames_tx, _frames_rx) = mpsc::unbounded_channel();
        let surface_id = SurfaceId::new();
        let window_id = WindowId::new();
        let (_link, channel) = duplex(surface_id, frames_tx);

        host.attach(SurfaceAttachment {
            surface_id,
            window_id,
            app_id: AppId::from("clock"),
            entry_url: "./apps/clock/index.html".to_owned(),
            channel,
        });
        host.detach(surface_id, window_id);

        match rx.recv().await.unwrap() {
            SurfaceEvent::Attached(a) => {
                assert_eq!(a.surface_id, surface_id);
                assert_eq!(a.app_id.as_str(), "clock");
            },
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(
            rx.recv().await.unwrap(),
            SurfaceEvent::Detached { window_id: w, .. } if w == window_id
        ));
    }

    #[test]
    fn test_channel_host_survives_dropped_receiver() {
        let (mut host, rx) = ChannelSurfaceHost::new();
        drop(rx);
        host.detach(SurfaceId::new(), WindowId::new());
    }
}
