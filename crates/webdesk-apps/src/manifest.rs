//! App manifest types and validation.
//!
//! A manifest arrives either from Rust code (builtins, tests) or as an
//! untyped JSON object from an app calling `registry.install`. Both paths
//! go through the same rules:
//!
//! - `id`, `name`, `icon`, `entryUrl` and `permissions` must be present and
//!   not null or empty
//! - `permissions` must be an array of strings (duplicates collapse)
//! - `id` must not be all whitespace
//!
//! `description` is optional.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use webdesk_core::AppId;

use crate::error::{RegistryError, RegistryResult};

/// Fields every manifest must carry, in the order they are checked.
const REQUIRED_FIELDS: [&str; 5] = ["id", "name", "icon", "entryUrl", "permissions"];

/// A permission token naming a host operation family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Permission {
    /// Access to `storage.*`.
    Storage,
    /// Access to `registry.*`.
    Registry,
    /// A token the host does not know. It grants nothing but is preserved.
    Other(String),
}

impl Permission {
    /// The token as it appears in a manifest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Storage => "storage",
            Self::Registry => "registry",
            Self::Other(token) => token,
        }
    }
}

impl From<String> for Permission {
    fn from(token: String) -> Self {
        match token.as_str() {
            "storage" => Self::Storage,
            "registry" => Self::Registry,
            _ => Self::Other(token),
        }
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        match permission {
            Permission::Other(token) => token,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor of an installable application.
///
/// Serializes to the public manifest format; the builtin flag is internal
/// and never leaves the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppManifest {
    /// Unique app id.
    pub id: AppId,
    /// Display name.
    pub name: String,
    /// Icon reference (URL or path).
    pub icon: String,
    /// Optional one-line description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URL the app's window loads.
    pub entry_url: String,
    /// Permission tokens the app is granted.
    pub permissions: Vec<Permission>,
    /// Whether this is a builtin app.
    #[serde(skip)]
    pub builtin: bool,
}

impl AppManifest {
    /// Create a manifest for a non-builtin app with no permissions.
    #[must_use]
    pub fn new(
        id: impl Into<AppId>,
        name: impl Into<String>,
        icon: impl Into<String>,
        entry_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            description: None,
            entry_url: entry_url.into(),
            permissions: Vec::new(),
            builtin: false,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Grant a permission.
    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        if !self.permissions.contains(&permission) {
            self.permissions.push(permission);
        }
        self
    }

    /// Whether the manifest grants `permission`.
    #[must_use]
    pub fn has_permission(&self, permission: &Permission) -> bool {
        self.permissions.contains(permission)
    }

    /// Parse and validate an untyped manifest.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidManifest`] naming the first rule the
    /// value breaks.
    pub fn from_value(raw: &Value) -> RegistryResult<Self> {
        let obj = raw
            .as_object()
            .ok_or_else(|| invalid("Manifest missing \"id\""))?;

        for field in REQUIRED_FIELDS {
            match obj.get(field) {
                None | Some(Value::Null) => return Err(missing(field)),
                Some(Value::String(s)) if s.is_empty() => return Err(missing(field)),
                _ => {},
            }
        }
        let permissions = match obj.get("permissions") {
            Some(Value::Array(items)) => items,
            _ => return Err(invalid("\"permissions\" must be an array")),
        };
        for field in ["id", "name", "icon", "entryUrl"] {
            if !obj.get(field).is_some_and(Value::is_string) {
                return Err(invalid(format!("\"{field}\" must be a string")));
            }
        }
        if !permissions.iter().all(Value::is_string) {
            return Err(invalid("\"permissions\" must contain only strings"));
        }
        if let Some(description) = obj.get("description") {
            if !description.is_null() && !description.is_string() {
                return Err(invalid("\"description\" must be a string"));
            }
        }

        let mut manifest: Self = serde_json::from_value(raw.clone())
            .map_err(|e| invalid(format!("Malformed manifest: {e}")))?;
        manifest.builtin = false;
        manifest.normalize();
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check the typed manifest against the validation rules.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidManifest`] naming the first broken rule.
    pub fn validate(&self) -> RegistryResult<()> {
        let fields = [
            ("id", self.id.as_str()),
            ("name", self.name.as_str()),
            ("icon", self.icon.as_str()),
            ("entryUrl", self.entry_url.as_str()),
        ];
        for (field, value) in fields {
            if value.is_empty() {
                return Err(missing(field));
            }
        }
        if self.id.as_str().trim().is_empty() {
            return Err(invalid("Invalid id"));
        }
        Ok(())
    }

    /// Collapse duplicate permission tokens, keeping first occurrence.
    fn normalize(&mut self) {
        let mut seen = Vec::with_capacity(self.permissions.len());
        self.permissions.retain(|p| {
            if seen.contains(p) {
                false
            } else {
                seen.push(p.clone());
                true
            }
        });
    }

    /// Whether `query` matches the name or description, ignoring case.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
    }
}

fn invalid(message: impl Into<String>) -> RegistryError {
    RegistryError::InvalidManifest(message.into())
}

fn missing(field: &str) -> RegistryError {
    invalid(format!("Manifest missing \"{field}\""))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn calc() -> Value {
        json!({
            "id": "calc", "name": "Calc", "icon": "x",
            "entryUrl": "./calc.html", "permissions": []
        })
    }

    fn error_message(raw: &Value) -> String {
        match AppManifest::from_value(raw).unwrap_err() {
            RegistryError::InvalidManifest(msg) => msg,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parses_minimal_manifest() {
        let m = AppManifest::from_value(&calc()).unwrap();
        assert_eq!(m.id.as_str(), "calc");
        assert_eq!(m.entry_url, "./calc.html");
        assert!(m.permissions.is_empty());
        assert!(m.description.is_none());
        assert!(!m.builtin);
    }

    #[test]
    fn test_each_required_field_is_checked() {
        for field in REQUIRED_FIELDS {
            let mut raw = calc();
            raw.as_object_mut().unwrap().remove(field);
            assert_eq!(error_message(&raw), format!("Manifest missing \"{field}\""));

            raw[field] = Value::Null;
            assert_eq!(error_message(&raw), format!("Manifest missing \"{field}\""));
        }
    }

    #[test]
    fn test_empty_string_counts_as_missing() {
        let mut raw = calc();
        raw["icon"] = json!("");
        assert_eq!(error_message(&raw), "Manifest missing \"icon\"");
    }

    #[test]
    fn test_permissions_must_be_array_of_strings() {
        let mut raw = calc();
        raw["permissions"] = json!("storage");
        assert_eq!(error_message(&raw), "\"permissions\" must be an array");

        raw["permissions"] = json!(["storage", 3]);
        assert_eq!(error_message(&raw), "\"permissions\" must contain only strings");
    }

    #[test]
    fn test_whitespace_id_is_rejected() {
        let mut raw = calc();
        raw["id"] = json!("   ");
        assert_eq!(error_message(&raw), "Invalid id");
    }

    #[test]
    fn test_non_object_is_rejected() {
        assert!(AppManifest::from_value(&json!(null)).is_err());
        assert!(AppManifest::from_value(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_duplicate_permissions_collapse() {
        let mut raw = calc();
        raw["permissions"] = json!(["storage", "storage", "camera"]);
        let m = AppManifest::from_value(&raw).unwrap();
        assert_eq!(
            m.permissions,
            vec![Permission::Storage, Permission::Other("camera".into())]
        );
    }

    #[test]
    fn test_builtin_flag_cannot_be_smuggled_in() {
        let mut raw = calc();
        raw["builtin"] = json!(true);
        raw["_builtin"] = json!(true);
        assert!(!AppManifest::from_value(&raw).unwrap().builtin);
    }

    #[test]
    fn test_serialized_form_omits_internal_fields() {
        let mut m = AppManifest::from_value(&calc()).unwrap();
        m.builtin = true;
        assert_eq!(serde_json::to_value(&m).unwrap(), calc());
    }

    #[test]
    fn test_matches_name_or_description() {
        let m = AppManifest::new("notes", "Notes", "i", "./n.html")
            .with_description("Minimal notes using OS storage.");
        assert!(m.matches("NOTE"));
        assert!(m.matches("storage"));
        assert!(m.matches(""));
        assert!(!m.matches("clock"));
    }
}
