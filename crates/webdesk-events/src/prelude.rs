//! Prelude module - commonly used types for convenient import.
//!
//! Use `use webdesk_events::prelude::*;` to import all essential types.

pub use crate::{EventBus, EventReceiver, ShellEvent};
