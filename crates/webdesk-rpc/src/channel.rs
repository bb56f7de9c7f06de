//! Per-process duplex channels.
//!
//! All processes share one fan-in queue towards the host, so the host's
//! control loop sees a single ordered stream of [`InboundFrame`]s. Each
//! frame is stamped with the [`SurfaceId`] it came from by the
//! [`FrameSender`] held on the process side; the process cannot forge it.
//! Frames towards a process go over that process's own queue via
//! [`HostLink`].

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::trace;
use webdesk_core::SurfaceId;

use crate::frame::Frame;

/// A raw frame received by the host, tagged with its origin.
#[derive(Debug, Clone)]
pub struct InboundFrame {
    /// Surface the frame was posted from.
    pub source: SurfaceId,
    /// Undecoded payload.
    pub payload: Value,
}

/// Host end of one process's channel.
#[derive(Debug, Clone)]
pub struct HostLink {
    surface_id: SurfaceId,
    to_process: mpsc::UnboundedSender<Value>,
}

impl HostLink {
    /// Surface this link talks to.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Post a frame to the process.
    ///
    /// Returns `false` when the process side is gone. The host never waits
    /// on a process, so a closed channel is not an error.
    pub fn send(&self, frame: &Frame) -> bool {
        let delivered = self.to_process.send(frame.encode()).is_ok();
        if !delivered {
            trace!(surface_id = %self.surface_id, "Process channel closed, frame dropped");
        }
        delivered
    }

    /// Whether the process side has hung up.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.to_process.is_closed()
    }
}

/// Process-side sender that stamps every frame with its surface id.
#[derive(Debug, Clone)]
pub struct FrameSender {
    surface_id: SurfaceId,
    to_host: mpsc::UnboundedSender<InboundFrame>,
}

impl FrameSender {
    /// Surface this sender stamps frames with.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Post a decoded frame to the host.
    ///
    /// # Errors
    ///
    /// Returns the payload back if the host is no longer listening.
    pub fn send(&self, frame: &Frame) -> Result<(), Value> {
        self.send_raw(frame.encode())
    }

    /// Post an arbitrary JSON value to the host. Used to exercise the host's
    /// handling of malformed input.
    ///
    /// # Errors
    ///
    /// Returns the payload back if the host is no longer listening.
    pub fn send_raw(&self, payload: Value) -> Result<(), Value> {
        self.to_host
            .send(InboundFrame {
                source: self.surface_id,
                payload,
            })
            .map_err(|e| e.0.payload)
    }
}

/// Process end of the channel: what a rendering surface is handed.
#[derive(Debug)]
pub struct ProcessChannel {
    /// Sends frames to the host.
    pub outbound: FrameSender,
    /// Receives raw frames from the host.
    pub inbound: mpsc::UnboundedReceiver<Value>,
}

impl ProcessChannel {
    /// Surface this channel belongs to.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.outbound.surface_id
    }
}

/// Create the duplex pair for a new surface.
///
/// `to_host` is the host's shared fan-in queue.
#[must_use]
pub fn duplex(
    surface_id: SurfaceId,
    to_host: mpsc::UnboundedSender<InboundFrame>,
) -> (HostLink, ProcessChannel) {
    let (to_process, inbound) = mpsc::unbounded_channel();
    (
        HostLink {
            surface_id,
            to_process,
        },
        ProcessChannel {
            outbound: FrameSender {
                surface_id,
                to_host,
            },
            inbound,
        },
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use webdesk_core::CallId;

    use super::*;

    #[tokio::test]
    async fn test_frames_are_stamped_with_source() {
        let (host_tx, mut host_rx) = mpsc::unbounded_channel();
        let surface = SurfaceId::new();
        let (_link, channel) = duplex(surface, host_tx);

        let frame = Frame::request(CallId::from("a"), "shell.alert", json!({}));
        channel.outbound.send(&frame).unwrap();

        let inbound = host_rx.recv().await.unwrap();
        assert_eq!(inbound.source, surface);
        assert_eq!(Frame::decode(&inbound.payload).unwrap(), frame);
    }

    #[tokio::test]
    async fn test_host_link_reaches_process() {
        let (host_tx, _host_rx) = mpsc::unbounded_channel();
        let (link, mut channel) = duplex(SurfaceId::new(), host_tx);

        let reply = Frame::reply(CallId::from("a"), Ok(json!(true)));
        assert!(link.send(&reply));
        let raw = channel.inbound.recv().await.unwrap();
        assert_eq!(Frame::decode(&raw).unwrap(), reply);
    }

    #[tokio::test]
    async fn test_send_to_dropped_process_reports_false() {
        let (host_tx, _host_rx) = mpsc::unbounded_channel();
        let (link, channel) = duplex(SurfaceId::new(), host_tx);
        drop(channel);
        assert!(link.is_closed());
        assert!(!link.send(&Frame::reply(CallId::from("a"), Ok(json!(1)))));
    }
}
