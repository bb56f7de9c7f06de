//! Prelude module - commonly used types for convenient import.
//!
//! Use `use webdesk_storage::prelude::*;` to import all essential types.

pub use crate::{StorageError, StorageResult};

pub use crate::{KvStore, MemoryKvStore, ScopedKvStore};

pub use crate::{AppStorage, QuotaReport, SYSTEM_NAMESPACE, app_namespace};
