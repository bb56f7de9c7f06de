//! WebDesk Core - Foundation types shared by every WebDesk host crate.
//!
//! This crate provides:
//! - Identifiers for apps, windows, rendering surfaces, processes and calls
//! - Window geometry
//! - The structured error taxonomy carried across the RPC boundary
//!
//! It has no knowledge of the host's components. Every other crate builds
//! on these types so that a `WindowId` minted by the window manager is the
//! same type the capability gate and the event bus speak.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod geometry;
pub mod ids;

pub use error::{ErrorCode, RpcError};
pub use geometry::Rect;
pub use ids::{AppId, CallId, ProcessId, SurfaceId, WindowId};
