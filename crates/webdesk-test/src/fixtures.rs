//! Test fixtures for manifests and tracing.

use serde_json::{Value, json};
use webdesk_apps::{AppManifest, Permission};

/// The third-party calculator used throughout the docs: no permissions.
#[must_use]
pub fn calc_manifest() -> AppManifest {
    AppManifest::new("calc", "Calc", "x", "./calc.html")
}

/// A third-party app with the given permissions.
#[must_use]
pub fn manifest_with(id: &str, permissions: &[Permission]) -> AppManifest {
    permissions.iter().cloned().fold(
        AppManifest::new(id, id.to_uppercase(), "app", format!("./apps/{id}/index.html")),
        AppManifest::with_permission,
    )
}

/// The calculator manifest as untyped JSON, the way `registry.install`
/// receives it.
#[must_use]
pub fn calc_manifest_value() -> Value {
    json!({
        "id": "calc",
        "name": "Calc",
        "icon": "x",
        "entryUrl": "./calc.html",
        "permissions": [],
    })
}

/// Manifests that must be refused, each paired with the field the error
/// message names.
#[must_use]
pub fn invalid_manifests() -> Vec<(&'static str, Value)> {
    let with = |field: &str, value: Option<Value>| {
        let mut raw = calc_manifest_value();
        if let Some(obj) = raw.as_object_mut() {
            match value {
                Some(v) => obj.insert(field.to_owned(), v),
                None => obj.remove(field),
            };
        }
        raw
    };
    vec![
        ("id", with("id", None)),
        ("id", with("id", Some(json!("")))),
        ("name", with("name", None)),
        ("icon", with("icon", Some(Value::Null))),
        ("entryUrl", with("entryUrl", None)),
        ("entryUrl", with("entryUrl", Some(json!(7)))),
        ("permissions", with("permissions", None)),
        ("permissions", with("permissions", Some(json!("storage")))),
    ]
}

/// Install a test tracing subscriber that honours `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
