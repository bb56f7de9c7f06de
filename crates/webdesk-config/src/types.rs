//! Configuration struct definitions.
//!
//! Every section derives `Default` with the same values as the embedded
//! `defaults.toml`, so a partially written file deserializes cleanly.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host-wide limits.
    pub host: HostSection,
    /// Window placement and sizing.
    pub windows: WindowsSection,
    /// Logging and tracing.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// HostSection
// ---------------------------------------------------------------------------

/// Host-wide limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    /// Per-app soft storage quota in bytes.
    pub storage_quota_bytes: u64,
    /// RPC call timeout in milliseconds.
    pub rpc_timeout_ms: u64,
    /// Version string reported at boot.
    pub version: String,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            storage_quota_bytes: 524_288,
            rpc_timeout_ms: 5_000,
            version: "0.3.0".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// WindowsSection
// ---------------------------------------------------------------------------

/// Window placement and sizing, in content-area pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowsSection {
    /// Width of a new window.
    pub default_width: f64,
    /// Height of a new window.
    pub default_height: f64,
    /// Smallest width a resize may produce.
    pub min_width: f64,
    /// Smallest height a resize may produce.
    pub min_height: f64,
    /// Base left offset of a new window.
    pub origin_left: f64,
    /// Base top offset of a new window.
    pub origin_top: f64,
    /// Upper bound of the random left offset added to `origin_left`.
    pub jitter_left: f64,
    /// Upper bound of the random top offset added to `origin_top`.
    pub jitter_top: f64,
    /// Initial content area width.
    pub content_width: f64,
    /// Initial content area height.
    pub content_height: f64,
}

impl Default for WindowsSection {
    fn default() -> Self {
        Self {
            default_width: 800.0,
            default_height: 550.0,
            min_width: 320.0,
            min_height: 200.0,
            origin_left: 100.0,
            origin_top: 80.0,
            jitter_left: 200.0,
            jitter_top: 100.0,
            content_width: 1280.0,
            content_height: 800.0,
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global log level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate tracing directives (e.g. `["webdesk_rpc=trace"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
