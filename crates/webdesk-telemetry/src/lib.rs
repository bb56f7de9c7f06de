//! WebDesk Telemetry - logging setup for the desktop host.
//!
//! Host crates only ever emit `tracing` events. This crate decides where
//! they go: a level filter plus per-crate directives, one of four output
//! formats, and stdout, stderr or a rolling file.
//!
//! # Example
//!
//! ```rust,no_run
//! use webdesk_telemetry::{LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), webdesk_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Json)
//!     .with_directive("webdesk_rpc=trace");
//!
//! setup_logging(&config)?;
//! tracing::info!("desktop booting");
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod error;
mod logging;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{
    FileLogConfig, FileRotation, LogConfig, LogFormat, LogTarget, setup_default_logging,
    setup_logging,
};
