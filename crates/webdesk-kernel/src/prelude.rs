//! Prelude module - commonly used types for convenient import.
//!
//! Use `use webdesk_kernel::prelude::*;` to import all essential types.

// Errors
pub use crate::{KernelError, KernelResult};

// Boot and control
pub use crate::{ExitReason, HostConfig, Kernel, KernelHandle};

// Host context
pub use crate::{Desktop, FocusOptions, Process, WindowInfo};

// Collaborators
pub use crate::{ChannelSurfaceHost, IdentityProvider, InMemoryIdentityProvider, SurfaceHost};
