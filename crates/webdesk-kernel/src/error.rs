//! Kernel error types.

use thiserror::Error;
use webdesk_apps::RegistryError;
use webdesk_core::{AppId, ErrorCode, RpcError, WindowId};
use webdesk_storage::StorageError;

use crate::session::IdentityError;

/// Errors raised by host operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// No active session at boot.
    #[error("No active session")]
    Unauthenticated,

    /// The session has no user profile.
    #[error("User profile unavailable")]
    ProfileUnavailable,

    /// The requested app is neither builtin nor installed.
    #[error("App not found: {0}")]
    AppNotFound(AppId),

    /// The window does not exist or has already been closed.
    #[error("Window not found: {0}")]
    WindowNotFound(WindowId),

    /// A geometry update was rejected.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The storage provider failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The identity collaborator failed.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// The kernel loop has stopped and can no longer take commands.
    #[error("Kernel is not running")]
    Stopped,
}

impl From<KernelError> for RpcError {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::Registry(e) => e.into(),
            KernelError::Storage(e) => e.into(),
            KernelError::AppNotFound(_) => Self::new(ErrorCode::AppNotFound, err.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

/// Result type for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;
