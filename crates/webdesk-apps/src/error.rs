//! Registry error types.

use thiserror::Error;
use webdesk_core::{ErrorCode, RpcError};
use webdesk_storage::StorageError;

/// Errors from manifest validation and registry mutations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A manifest failed validation.
    #[error("{0}")]
    InvalidManifest(String),

    /// The operation targets a reserved builtin id.
    #[error("{0}")]
    BuiltinConflict(String),

    /// No installed app has this id.
    #[error("App not installed")]
    NotInstalled(String),

    /// Persisting the installed collection failed.
    #[error("failed to persist installed apps: {0}")]
    Storage(#[from] StorageError),
}

impl RegistryError {
    /// The wire error code for this error.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidManifest(_) => ErrorCode::InvalidManifest,
            Self::BuiltinConflict(_) => ErrorCode::BuiltinConflict,
            Self::NotInstalled(_) => ErrorCode::NotInstalled,
            Self::Storage(_) => ErrorCode::Internal,
        }
    }
}

impl From<RegistryError> for RpcError {
    fn from(err: RegistryError) -> Self {
        RpcError::new(err.code(), err.to_string())
    }
}

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;
