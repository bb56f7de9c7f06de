//! Frame decoding errors.

use thiserror::Error;

/// Why an inbound value was not accepted as a protocol frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The value is not a JSON object.
    #[error("frame is not an object")]
    NotAnObject,

    /// The protocol tag is missing or differs from `OS_RPC`.
    #[error("unexpected protocol tag")]
    WrongTag,

    /// The role marker is missing or not one of the two known roles.
    #[error("unknown role: {0}")]
    UnknownRole(String),

    /// A required field is absent.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// A field is present but has the wrong shape.
    #[error("invalid field: {0}")]
    InvalidField(&'static str),
}

/// Result type for frame decoding.
pub type FrameResult<T> = Result<T, FrameError>;
