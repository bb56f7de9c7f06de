//! Environment variable fallbacks.
//!
//! Env vars are **fallback**, not override: they are only applied to fields
//! that no config file set (the embedded defaults do not count).

use std::collections::HashMap;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Mapping from environment variable name to config field path.
struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: ValueKind,
}

#[derive(Clone, Copy)]
enum ValueKind {
    Integer,
    String,
}

/// All supported `WEBDESK_*` env var mappings.
const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "WEBDESK_LOG_LEVEL",
        field_path: "logging.level",
        kind: ValueKind::String,
    },
    EnvMapping {
        var_name: "WEBDESK_STORAGE_QUOTA_BYTES",
        field_path: "host.storage_quota_bytes",
        kind: ValueKind::Integer,
    },
    EnvMapping {
        var_name: "WEBDESK_RPC_TIMEOUT_MS",
        field_path: "host.rpc_timeout_ms",
        kind: ValueKind::Integer,
    },
];

/// Apply environment variable fallbacks to fields no config file set.
///
/// Returns the number of env vars applied.
pub fn apply_env_fallbacks<S: ::std::hash::BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        if let Some(val) = env_vars.get(mapping.var_name) {
            debug!(
                var = mapping.var_name,
                field = mapping.field_path,
                "applying env var fallback"
            );
            set_field(merged, mapping.field_path, coerce(mapping.kind, val));
            sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
            count = count.saturating_add(1);
        }
    }

    count
}

/// Coerce a raw env string. Unparseable integers stay strings so that
/// deserialization reports them against the right field.
fn coerce(kind: ValueKind, val: &str) -> toml::Value {
    match kind {
        ValueKind::Integer => val
            .trim()
            .parse::<i64>()
            .map_or_else(|_| toml::Value::String(val.to_owned()), toml::Value::Integer),
        ValueKind::String => toml::Value::String(val.to_owned()),
    }
}

/// Set a dotted-path field, creating intermediate tables as needed.
fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let Some((parents, leaf)) = path.rsplit_once('.') else {
        if let Some(table) = root.as_table_mut() {
            table.insert(path.to_owned(), value);
        }
        return;
    };

    let mut current = root;
    for segment in parents.split('.') {
        let Some(table) = current.as_table_mut() else {
            return;
        };
        current = table
            .entry(segment.to_owned())
            .or_insert(toml::Value::Table(toml::map::Map::new()));
    }
    if let Some(table) = current.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

/// Collect all current environment variables into a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn test_env_fills_fields_left_at_defaults() {
        let mut merged: toml::Value = toml::from_str("[host]\nrpc_timeout_ms = 5000\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("host.rpc_timeout_ms".into(), ConfigLayer::Defaults);

        let env = make_env(&[("WEBDESK_RPC_TIMEOUT_MS", "250"), ("WEBDESK_LOG_LEVEL", "debug")]);
        let applied = apply_env_fallbacks(&mut merged, &mut sources, &env);

        assert_eq!(applied, 2);
        assert_eq!(merged["host"]["rpc_timeout_ms"].as_integer(), Some(250));
        assert_eq!(merged["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(
            sources.get("logging.level"),
            Some(&ConfigLayer::Environment)
        );
    }

    #[test]
    fn test_env_never_overrides_a_file() {
        let mut merged: toml::Value = toml::from_str("[host]\nrpc_timeout_ms = 900\n").unwrap();
        let mut sources = FieldSources::new();
        sources.insert("host.rpc_timeout_ms".into(), ConfigLayer::User);

        let env = make_env(&[("WEBDESK_RPC_TIMEOUT_MS", "250")]);
        assert_eq!(apply_env_fallbacks(&mut merged, &mut sources, &env), 0);
        assert_eq!(merged["host"]["rpc_timeout_ms"].as_integer(), Some(900));
    }

    #[test]
    fn test_non_numeric_integer_stays_string() {
        assert_eq!(
            coerce(ValueKind::Integer, "lots"),
            toml::Value::String("lots".into())
        );
        assert_eq!(coerce(ValueKind::Integer, " 42 "), toml::Value::Integer(42));
    }
}
