//! Apps shipped with the host.

use crate::manifest::{AppManifest, Permission};

const ICON_BASE: &str = "https://cdn.jsdelivr.net/gh/tabler/tabler-icons/icons";

fn builtin(id: &str, name: &str, icon: &str, description: &str) -> AppManifest {
    let mut manifest = AppManifest::new(
        id,
        name,
        format!("{ICON_BASE}/{icon}.svg"),
        format!("./apps/{id}/index.html"),
    )
    .with_description(description);
    manifest.builtin = true;
    manifest
}

/// The fixed seed of builtin apps, in display order.
#[must_use]
pub fn builtin_manifests() -> Vec<AppManifest> {
    vec![
        builtin("clock", "Clock", "clock", "Simple digital clock."),
        builtin("notes", "Notes", "note", "Minimal notes using OS storage.")
            .with_permission(Permission::Storage),
        builtin("appstore", "App Store", "shopping-bag", "Install and remove apps.")
            .with_permission(Permission::Registry)
            .with_permission(Permission::Storage),
    ]
}
