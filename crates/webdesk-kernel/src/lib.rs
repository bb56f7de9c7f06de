//! WebDesk Kernel - windows, processes and the capability-gated RPC host.
//!
//! The kernel owns one [`Desktop`]: the app registry, the live windows, the
//! process table and the storage provider. Everything that changes it runs
//! on a single control loop ([`Kernel::run`]) that takes one input at a
//! time:
//!
//! - auth events from the [`IdentityProvider`] (a sign-out tears the desktop
//!   down and ends the loop),
//! - commands from the shell chrome through a [`KernelHandle`],
//! - request frames from processes, which go through the capability gate.
//!
//! Processes never touch host state directly. Each one talks to the host
//! over its own channel, and the gate checks the app's permissions and
//! storage quota before any side effect.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use webdesk_kernel::{ChannelSurfaceHost, HostConfig, InMemoryIdentityProvider, Kernel};
//! use webdesk_storage::MemoryKvStore;
//!
//! # async fn demo() -> Result<(), webdesk_kernel::KernelError> {
//! let identity = Arc::new(InMemoryIdentityProvider::signed_in("u1", "ada"));
//! let (surfaces, _surface_events) = ChannelSurfaceHost::new();
//! let (kernel, handle) = Kernel::boot(
//!     HostConfig::default(),
//!     identity,
//!     Arc::new(MemoryKvStore::new()),
//!     Box::new(surfaces),
//! )
//! .await?;
//!
//! tokio::spawn(kernel.run());
//! let process = handle.launch("notes").await?;
//! println!("notes running as {}", process.id);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![allow(clippy::module_name_repetitions)]

pub mod prelude;

pub mod config;
pub mod desktop;
pub mod error;
pub mod kernel;
pub mod process;
pub mod session;
pub mod surface;
pub mod window;

mod gate;
mod handle;

pub use config::{HostConfig, WindowGeometry};
pub use desktop::Desktop;
pub use error::{KernelError, KernelResult};
pub use handle::KernelHandle;
pub use kernel::{ExitReason, Kernel};
pub use process::{Process, ProcessManager};
pub use session::{
    AuthEvent, IdentityError, IdentityProvider, IdentityResult, InMemoryIdentityProvider,
    ProfileUpdate, Session, UserProfile,
};
pub use surface::{ChannelSurfaceHost, SurfaceAttachment, SurfaceEvent, SurfaceHost};
pub use window::{FocusOptions, Visibility, Window, WindowInfo, WindowManager};
