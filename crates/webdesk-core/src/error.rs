//! Error taxonomy carried across the host/process boundary.
//!
//! Host components keep their own `thiserror` enums. At the RPC boundary
//! every failure is flattened into an [`RpcError`], which serializes as
//! `{"code": "...", "message": "..."}`.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error code of an RPC failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// A manifest is missing a required field or has a malformed one.
    InvalidManifest,
    /// The operation would override or remove a builtin app.
    BuiltinConflict,
    /// No installed app has the given id.
    NotInstalled,
    /// The calling app lacks the permission token for the method family.
    PermissionDenied,
    /// A storage write would push the app past its soft quota.
    QuotaExceeded,
    /// The method name is not served by the host.
    UnknownMethod,
    /// No reply arrived before the call deadline.
    Timeout,
    /// The requested app id is unknown to the registry.
    AppNotFound,
    /// Request params are missing or have the wrong shape.
    InvalidParams,
    /// The host failed internally (storage provider, closed channel).
    Internal,
}

impl ErrorCode {
    /// The wire spelling of the code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidManifest => "InvalidManifest",
            Self::BuiltinConflict => "BuiltinConflict",
            Self::NotInstalled => "NotInstalled",
            Self::PermissionDenied => "PermissionDenied",
            Self::QuotaExceeded => "QuotaExceeded",
            Self::UnknownMethod => "UnknownMethod",
            Self::Timeout => "Timeout",
            Self::AppNotFound => "AppNotFound",
            Self::InvalidParams => "InvalidParams",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error delivered in a reply frame.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct RpcError {
    /// Machine-readable code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
}

impl RpcError {
    /// Create an error with the given code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The caller waited past its deadline.
    #[must_use]
    pub fn timeout(method: &str) -> Self {
        Self::new(ErrorCode::Timeout, format!("No response to {method}"))
    }

    /// The method is not served.
    #[must_use]
    pub fn unknown_method(method: &str) -> Self {
        Self::new(ErrorCode::UnknownMethod, format!("Unknown method {method}"))
    }

    /// Params could not be interpreted.
    #[must_use]
    pub fn invalid_params(method: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::InvalidParams,
            format!("Invalid params for {method}: {reason}"),
        )
    }

    /// An internal host failure.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}
