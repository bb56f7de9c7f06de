//! Post-merge configuration validation.
//!
//! Validates that deserialized [`Config`](crate::Config) values are within
//! acceptable ranges and that cross-field invariants hold.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Longest allowed RPC timeout (10 minutes).
const MAX_RPC_TIMEOUT_MS: u64 = 600_000;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_host(config)?;
    validate_windows(config)?;
    validate_logging(config)?;
    Ok(())
}

fn error(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn validate_host(config: &Config) -> ConfigResult<()> {
    let h = &config.host;

    if h.storage_quota_bytes == 0 {
        return Err(error(
            "host.storage_quota_bytes",
            "storage quota must be greater than zero",
        ));
    }

    if h.rpc_timeout_ms == 0 || h.rpc_timeout_ms > MAX_RPC_TIMEOUT_MS {
        return Err(error(
            "host.rpc_timeout_ms",
            format!("rpc_timeout_ms must be between 1 and {MAX_RPC_TIMEOUT_MS}"),
        ));
    }

    Ok(())
}

fn validate_windows(config: &Config) -> ConfigResult<()> {
    let w = &config.windows;

    let dimensions = [
        ("windows.default_width", w.default_width),
        ("windows.default_height", w.default_height),
        ("windows.min_width", w.min_width),
        ("windows.min_height", w.min_height),
        ("windows.content_width", w.content_width),
        ("windows.content_height", w.content_height),
    ];
    for (field, value) in dimensions {
        if !value.is_finite() || value <= 0.0 {
            return Err(error(field, "must be a finite positive number"));
        }
    }

    let offsets = [
        ("windows.origin_left", w.origin_left),
        ("windows.origin_top", w.origin_top),
        ("windows.jitter_left", w.jitter_left),
        ("windows.jitter_top", w.jitter_top),
    ];
    for (field, value) in offsets {
        if !value.is_finite() || value < 0.0 {
            return Err(error(field, "must be a finite non-negative number"));
        }
    }

    if w.default_width < w.min_width || w.default_height < w.min_height {
        return Err(error(
            "windows.default_width",
            format!(
                "default size {}x{} is below the minimum {}x{}",
                w.default_width, w.default_height, w.min_width, w.min_height
            ),
        ));
    }

    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let l = &config.logging;

    if !matches!(
        l.level.to_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        return Err(error(
            "logging.level",
            format!(
                "invalid log level '{}'; expected one of: trace, debug, info, warn, error",
                l.level
            ),
        ));
    }

    if !matches!(
        l.format.to_lowercase().as_str(),
        "pretty" | "compact" | "json" | "full"
    ) {
        return Err(error(
            "logging.format",
            format!(
                "invalid log format '{}'; expected one of: pretty, compact, json, full",
                l.format
            ),
        ));
    }

    Ok(())
}
