//! Process-side RPC client.
//!
//! Every outstanding call lives in a pending table keyed by [`CallId`] with
//! its deadline. Exactly one of two things retires an entry: the matching
//! reply (delivered by the background pump) or the deadline (observed by the
//! caller). Whoever removes the entry from the table wins; the loser finds
//! nothing and does nothing. Replies for unknown ids, including late replies
//! for timed-out calls, are dropped.
//!
//! A call future dropped before it resolves takes its entry with it, so the
//! table only holds calls someone is still waiting on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};
use webdesk_core::{CallId, RpcError, SurfaceId};

use crate::channel::{FrameSender, ProcessChannel};
use crate::frame::Frame;

/// How long a call waits for its reply unless configured otherwise.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(5);

type Outcome = Result<Value, RpcError>;

/// A call that has been sent and not yet retired.
struct PendingCall {
    tx: oneshot::Sender<Outcome>,
    deadline: Instant,
}

type PendingTable = Arc<Mutex<HashMap<CallId, PendingCall>>>;

fn lock(pending: &PendingTable) -> MutexGuard<'_, HashMap<CallId, PendingCall>> {
    pending.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Retires a call's entry when the call future goes away, however it ends.
struct PendingGuard<'a> {
    pending: &'a PendingTable,
    id: CallId,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if lock(self.pending).remove(&self.id).is_some() {
            trace!(call_id = %self.id, "Abandoned call retired");
        }
    }
}

/// Client an app uses to call host operations.
pub struct RpcClient {
    outbound: FrameSender,
    pending: PendingTable,
    timeout: Duration,
    pump: JoinHandle<()>,
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient")
            .field("surface_id", &self.outbound.surface_id())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RpcClient {
    /// Start a client on `channel` with the default timeout.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(channel: ProcessChannel) -> Self {
        Self::with_timeout(channel, DEFAULT_CALL_TIMEOUT)
    }

    /// Start a client on `channel` whose calls fail after `timeout`.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn with_timeout(channel: ProcessChannel, timeout: Duration) -> Self {
        let pending: PendingTable = Arc::new(Mutex::new(HashMap::new()));
        let pump = tokio::spawn(pump_replies(channel.inbound, Arc::clone(&pending)));
        Self {
            outbound: channel.outbound,
            pending,
            timeout,
            pump,
        }
    }

    /// Surface this client is attached to.
    #[must_use]
    pub fn surface_id(&self) -> SurfaceId {
        self.outbound.surface_id()
    }

    /// The per-call timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Call `method` on the host and wait for its reply.
    ///
    /// # Errors
    ///
    /// Returns the host's structured error, a `Timeout` error if no reply
    /// arrives before the deadline, or an `Internal` error if the host
    /// channel is already closed.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = CallId::generate();
        let deadline = Instant::now()
            .checked_add(self.timeout)
            .unwrap_or_else(Instant::now);
        let (tx, mut rx) = oneshot::channel();
        lock(&self.pending).insert(id.clone(), PendingCall { tx, deadline });
        let _guard = PendingGuard {
            pending: &self.pending,
            id: id.clone(),
        };

        trace!(call_id = %id, method, "Issuing call");
        if self
            .outbound
            .send(&Frame::request(id.clone(), method, params))
            .is_err()
        {
            return Err(RpcError::internal("host channel closed"));
        }

        match tokio::time::timeout_at(deadline, &mut rx).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => Err(RpcError::internal("client shut down")),
            Err(_) => {
                let timed_out = lock(&self.pending).remove(&id).is_some();
                if timed_out {
                    debug!(call_id = %id, method, "Call timed out");
                    Err(RpcError::timeout(method))
                } else {
                    // The pump retired the entry first and has already sent.
                    rx.try_recv()
                        .unwrap_or_else(|_| Err(RpcError::internal("client shut down")))
                }
            },
        }
    }

    /// Number of calls still waiting for a reply or a deadline.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        lock(&self.pending).len()
    }

    /// The earliest deadline among outstanding calls.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        lock(&self.pending).values().map(|p| p.deadline).min()
    }

    /// Post a raw value to the host, bypassing frame encoding.
    ///
    /// # Errors
    ///
    /// Returns the value back if the host channel is closed.
    pub fn send_raw(&self, payload: Value) -> Result<(), Value> {
        self.outbound.send_raw(payload)
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

/// Route inbound replies to their pending calls until the host hangs up.
///
/// Outstanding entries are left in the table when the channel closes; their
/// callers still resolve through the deadline.
async fn pump_replies(mut inbound: mpsc::UnboundedReceiver<Value>, pending: PendingTable) {
    while let Some(raw) = inbound.recv().await {
        let reply = match Frame::decode(&raw) {
            Ok(Frame::Reply(reply)) => reply,
            Ok(Frame::Request(req)) => {
                trace!(call_id = %req.id, method = %req.method, "Ignoring host-initiated request");
                continue;
            },
            Err(e) => {
                trace!(error = %e, "Dropping malformed frame");
                continue;
            },
        };

        let call = lock(&pending).remove(&reply.id);
        if let Some(call) = call {
            // The receiver may already be gone if the caller was dropped.
            let _ = call.tx.send(reply.outcome);
        } else {
            debug!(call_id = %reply.id, "Dropping reply with no pending call");
        }
    }
    trace!("Host channel closed, reply pump exiting");
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use webdesk_core::ErrorCode;

    use super::*;
    use crate::channel::{HostLink, InboundFrame, duplex};

    fn setup(timeout: Duration) -> (RpcClient, HostLink, mpsc::UnboundedReceiver<InboundFrame>) {
        let (host_tx, host_rx) = mpsc::unbounded_channel();
        let (link, channel) = duplex(SurfaceId::new(), host_tx);
        (RpcClient::with_timeout(channel, timeout), link, host_rx)
    }

    async fn next_request(host_rx: &mut mpsc::UnboundedReceiver<InboundFrame>) -> crate::Request {
        match Frame::decode(&host_rx.recv().await.unwrap().payload).unwrap() {
            Frame::Request(req) => req,
            Frame::Reply(_) => panic!("expected request"),
        }
    }

    #[tokio::test]
    async fn test_call_resolves_with_reply() {
        let (client, link, mut host_rx) = setup(DEFAULT_CALL_TIMEOUT);
        let host = tokio::spawn(async move {
            let req = next_request(&mut host_rx).await;
            assert_eq!(req.method, "storage.get");
            link.send(&Frame::reply(req.id, Ok(json!("value"))));
        });

        let result = client.call("storage.get", json!({"key": "k"})).await;
        assert_eq!(result.unwrap(), json!("value"));
        host.await.unwrap();
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_error_reply_is_surfaced() {
        let (client, link, mut host_rx) = setup(DEFAULT_CALL_TIMEOUT);
        tokio::spawn(async move {
            let req = next_request(&mut host_rx).await;
            link.send(&Frame::reply(
                req.id,
                Err(RpcError::new(ErrorCode::PermissionDenied, "denied")),
            ));
        });

        let err = client.call("registry.install", json!({})).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
    }

    #[tokio::test]
    async fn test_out_of_order_replies_are_demultiplexed() {
        let (client, link, mut host_rx) = setup(DEFAULT_CALL_TIMEOUT);
        tokio::spawn(async move {
            let first = next_request(&mut host_rx).await;
            let second = next_request(&mut host_rx).await;
            link.send(&Frame::reply(second.id, Ok(json!(second.method))));
            link.send(&Frame::reply(first.id, Ok(json!(first.method))));
        });

        let (a, b) = tokio::join!(client.call("first", Value::Null), client.call("second", Value::Null));
        assert_eq!(a.unwrap(), json!("first"));
        assert_eq!(b.unwrap(), json!("second"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_once_and_late_reply_is_dropped() {
        let (client, link, mut host_rx) = setup(Duration::from_secs(5));

        let err = client.call("shell.alert", Value::Null).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Timeout);
        assert_eq!(client.pending_calls(), 0);

        // Reply after the deadline: no pending entry, nothing delivered.
        let req = next_request(&mut host_rx).await;
        link.send(&Frame::reply(req.id, Ok(json!(true))));
        tokio::task::yield_now().await;
        assert_eq!(client.pending_calls(), 0);

        // The client still works for new calls.
        let client = Arc::new(client);
        let c = Arc::clone(&client);
        let call = tokio::spawn(async move { c.call("shell.alert", Value::Null).await });
        let req = next_request(&mut host_rx).await;
        link.send(&Frame::reply(req.id, Ok(json!(true))));
        assert_eq!(call.await.unwrap().unwrap(), json!(true));
    }

    #[tokio::test]
    async fn test_unmatched_and_malformed_frames_are_ignored() {
        let (client, link, mut host_rx) = setup(DEFAULT_CALL_TIMEOUT);
        tokio::spawn(async move {
            let req = next_request(&mut host_rx).await;
            link.send(&Frame::reply(CallId::from("nobody"), Ok(json!(0))));
            link.send(&Frame::request(CallId::from("x"), "ping", Value::Null));
            link.send(&Frame::reply(req.id.clone(), Ok(json!(1))));
            link.send(&Frame::reply(req.id, Ok(json!(2))));
        });

        assert_eq!(client.call("m", Value::Null).await.unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_closed_host_fails_immediately() {
        let (client, _link, host_rx) = setup(DEFAULT_CALL_TIMEOUT);
        drop(host_rx);
        let err = client.call("shell.alert", Value::Null).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Internal);
        assert_eq!(client.pending_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_process_teardown_leaves_calls_to_their_deadline() {
        let (client, link, mut host_rx) = setup(Duration::from_secs(5));
        let client = Arc::new(client);
        let c = Arc::clone(&client);
        let call = tokio::spawn(async move { c.call("storage.quota", Value::Null).await });

        let _ = next_request(&mut host_rx).await;
        drop(link);
        assert!(client.next_deadline().is_some());

        let err = call.await.unwrap().unwrap_err();
        assert_eq!(err.code, ErrorCode::Timeout);
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_call_leaves_no_pending_entry() {
        let (client, link, mut host_rx) = setup(Duration::from_secs(5));

        let outer = tokio::time::timeout(
            Duration::from_secs(1),
            client.call("storage.list", Value::Null),
        )
        .await;
        assert!(outer.is_err());
        assert_eq!(client.pending_calls(), 0);
        assert_eq!(client.next_deadline(), None);

        // The host still answers the abandoned call; the reply goes nowhere.
        let req = next_request(&mut host_rx).await;
        link.send(&Frame::reply(req.id, Ok(json!([]))));
        tokio::task::yield_now().await;
        assert_eq!(client.pending_calls(), 0);
    }
}
