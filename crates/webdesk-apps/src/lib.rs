//! WebDesk Apps - the catalog of runnable applications.
//!
//! This crate provides:
//! - [`AppManifest`]: the descriptor of an app (identity, entry point,
//!   requested permissions) and its validation
//! - [`builtin_manifests`]: the fixed seed of apps shipped with the host
//! - [`AppRegistry`]: builtins plus the persisted set of installed apps
//!
//! Builtin ids are reserved. They can be neither overridden by an install
//! nor removed by an uninstall, and the builtin list is never persisted.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod builtins;
pub mod error;
pub mod manifest;
pub mod registry;

pub use builtins::builtin_manifests;
pub use error::{RegistryError, RegistryResult};
pub use manifest::{AppManifest, Permission};
pub use registry::{AppRegistry, INSTALLED_KEY};
