//! WebDesk RPC - the message channel between the host and each process.
//!
//! Every process owns exactly one logical duplex channel to the host. Both
//! directions carry JSON frames tagged `"OS_RPC"`; an explicit role marker
//! tells requests (`app->os`) from replies (`os->app`).
//!
//! # Components
//!
//! - [`frame`]: decoding and encoding of wire frames. Anything that does not
//!   fit the protocol is rejected with a [`FrameError`] and dropped by the
//!   caller.
//! - [`channel`]: the duplex pair created for every window. Frames going to
//!   the host are stamped with the sending surface's id so the host can
//!   resolve the sender without trusting the frame body.
//! - [`client`]: the process-side [`RpcClient`], which correlates replies by
//!   call id and fails calls locally after a deadline.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod channel;
pub mod client;
pub mod error;
pub mod frame;

pub use channel::{FrameSender, HostLink, InboundFrame, ProcessChannel, duplex};
pub use client::{DEFAULT_CALL_TIMEOUT, RpcClient};
pub use error::{FrameError, FrameResult};
pub use frame::{Frame, PROTOCOL_TAG, Reply, Request, Role};
