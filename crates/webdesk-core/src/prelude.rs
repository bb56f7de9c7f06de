//! Prelude module - commonly used types for convenient import.
//!
//! Use `use webdesk_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{ErrorCode, RpcError};

// Identifiers
pub use crate::{AppId, CallId, ProcessId, SurfaceId, WindowId};

// Geometry
pub use crate::Rect;
