//! Storage error types.

use webdesk_core::{ErrorCode, RpcError};

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The storage provider failed.
    #[error("storage error: {0}")]
    Internal(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The namespace or key is invalid.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A write would push the namespace past its soft quota.
    #[error("Soft quota exceeded: {projected} bytes projected, limit is {limit}")]
    QuotaExceeded {
        /// Total the namespace would hold after the write.
        projected: u64,
        /// The soft limit in bytes.
        limit: u64,
    },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for RpcError {
    fn from(err: StorageError) -> Self {
        let code = match &err {
            StorageError::QuotaExceeded { .. } => ErrorCode::QuotaExceeded,
            StorageError::InvalidKey(_) => ErrorCode::InvalidParams,
            StorageError::Internal(_) | StorageError::Serialization(_) => ErrorCode::Internal,
        };
        RpcError::new(code, err.to_string())
    }
}
