//! WebDesk Storage - string-keyed persistence for the desktop host.
//!
//! The host treats persistence as an external collaborator reachable through
//! the [`KvStore`] trait. On top of it this crate layers:
//!
//! - [`ScopedKvStore`]: a view pre-bound to one namespace, with JSON helpers
//! - [`AppStorage`]: the per-app view the capability gate uses, metered
//!   against a soft byte quota
//!
//! [`MemoryKvStore`] is always available for tests and for embedders without
//! a persistent backend.
//!
//! # Namespaces
//!
//! Apps live under `app:{app_id}`. Host-owned state (the installed app
//! collection) lives under [`SYSTEM_NAMESPACE`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod kv;
pub mod metered;

pub use error::{StorageError, StorageResult};
pub use kv::{KvStore, MemoryKvStore, ScopedKvStore};
pub use metered::{AppStorage, QuotaReport, app_namespace};

/// Namespace holding host-owned records.
pub const SYSTEM_NAMESPACE: &str = "system";
