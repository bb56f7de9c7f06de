//! Runtime configuration derived from the layered `webdesk-config` tree.

use std::time::Duration;

use webdesk_config::{Config, WindowsSection};
use webdesk_core::Rect;
use webdesk_telemetry::LogConfig;

/// Window placement rules.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowGeometry {
    /// Size of a new window.
    pub default_width: f64,
    /// Size of a new window.
    pub default_height: f64,
    /// Resize floor.
    pub min_width: f64,
    /// Resize floor.
    pub min_height: f64,
    /// Base offset of a new window.
    pub origin_left: f64,
    /// Base offset of a new window.
    pub origin_top: f64,
    /// Upper bound of the random offset added to `origin_left`.
    pub jitter_left: f64,
    /// Upper bound of the random offset added to `origin_top`.
    pub jitter_top: f64,
    /// Initial content area.
    pub content_area: Rect,
}

impl Default for WindowGeometry {
    fn default() -> Self {
        Self::from(&WindowsSection::default())
    }
}

impl From<&WindowsSection> for WindowGeometry {
    fn from(w: &WindowsSection) -> Self {
        Self {
            default_width: w.default_width,
            default_height: w.default_height,
            min_width: w.min_width,
            min_height: w.min_height,
            origin_left: w.origin_left,
            origin_top: w.origin_top,
            jitter_left: w.jitter_left,
            jitter_top: w.jitter_top,
            content_area: Rect::from_size(w.content_width, w.content_height),
        }
    }
}

/// Everything the host needs at boot.
#[derive(Debug, Clone, PartialEq)]
pub struct HostConfig {
    /// Per-app soft storage quota in bytes.
    pub storage_quota_bytes: u64,
    /// How long a process waits for a reply before failing the call.
    pub rpc_timeout: Duration,
    /// Version string logged at boot.
    pub version: String,
    /// Window placement rules.
    pub windows: WindowGeometry,
    /// Logging setup for the embedder to install.
    pub logging: LogConfig,
    /// Fixed seed for window placement. `None` draws from entropy.
    pub placement_seed: Option<u64>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for HostConfig {
    fn from(config: &Config) -> Self {
        Self {
            storage_quota_bytes: config.host.storage_quota_bytes,
            rpc_timeout: Duration::from_millis(config.host.rpc_timeout_ms),
            version: config.host.version.clone(),
            windows: WindowGeometry::from(&config.windows),
            logging: LogConfig::from(&config.logging),
            placement_seed: None,
        }
    }
}

impl HostConfig {
    /// Pin window placement to a seed.
    #[must_use]
    pub fn with_placement_seed(mut self, seed: u64) -> Self {
        self.placement_seed = Some(seed);
        self
    }

    /// Override the storage quota.
    #[must_use]
    pub fn with_storage_quota(mut self, bytes: u64) -> Self {
        self.storage_quota_bytes = bytes;
        self
    }

    /// Override the call timeout.
    #[must_use]
    pub fn with_rpc_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_config_defaults() {
        let host = HostConfig::default();
        assert_eq!(host.storage_quota_bytes, 524_288);
        assert_eq!(host.rpc_timeout, Duration::from_secs(5));
        assert_eq!(host.windows.default_width, 800.0);
        assert_eq!(host.windows.min_height, 200.0);
        assert_eq!(host.windows.content_area, Rect::from_size(1280.0, 800.0));
        assert!(host.placement_seed.is_none());
    }

    #[test]
    fn test_from_config_copies_overrides() {
        let mut config = Config::default();
        config.host.storage_quota_bytes = 10;
        config.host.rpc_timeout_ms = 250;
        config.windows.content_width = 640.0;
        config.logging.level = "debug".to_owned();

        let host = HostConfig::from(&config);
        assert_eq!(host.storage_quota_bytes, 10);
        assert_eq!(host.rpc_timeout, Duration::from_millis(250));
        assert_eq!(host.windows.content_area.width, 640.0);
        assert_eq!(host.logging.level, "debug");
    }

    #[test]
    fn test_builders() {
        let host = HostConfig::default()
            .with_placement_seed(7)
            .with_storage_quota(64)
            .with_rpc_timeout(Duration::from_millis(10));
        assert_eq!(host.placement_seed, Some(7));
        assert_eq!(host.storage_quota_bytes, 64);
        assert_eq!(host.rpc_timeout, Duration::from_millis(10));
    }
}
