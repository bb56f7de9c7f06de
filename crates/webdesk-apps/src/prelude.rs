//! Prelude module - commonly used types for convenient import.
//!
//! Use `use webdesk_apps::prelude::*;` to import all essential types.

pub use crate::{RegistryError, RegistryResult};

pub use crate::{AppManifest, Permission};

pub use crate::{AppRegistry, builtin_manifests};
