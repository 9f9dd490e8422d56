//! Environment variable fallbacks.
//!
//! Environment variables fill in fields that no config file set. They never
//! override a value written in a file, but they do replace built-in
//! defaults.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::merge::{ConfigLayer, FieldSources};

/// Environment variable name and the dotted field it feeds.
const ENV_MAPPINGS: &[(&str, &str)] = &[
    ("TOLLGATE_BRIDGE_PATH", "bridge.path"),
    ("TOLLGATE_LOG_LEVEL", "logging.level"),
    ("TOLLGATE_LOG_FORMAT", "logging.format"),
];

/// Apply fallbacks for fields that are unset or still at their default.
///
/// Returns the number of variables applied. Empty values are ignored.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> usize {
    let mut count: usize = 0;

    for (var_name, field_path) in ENV_MAPPINGS {
        let set_by_file = sources
            .get(*field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }

        let Some(val) = env_vars.get(*var_name).filter(|v| !v.trim().is_empty()) else {
            continue;
        };

        debug!(var = var_name, field = field_path, "applying env var fallback");
        set_string_field(merged, field_path, val);
        sources.insert((*field_path).to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    count
}

/// Collect the current process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Set `section.field` to a string, creating the section table if needed.
fn set_string_field(root: &mut toml::Value, path: &str, val: &str) {
    let Some((section, field)) = path.split_once('.') else {
        return;
    };
    let Some(root_table) = root.as_table_mut() else {
        return;
    };
    let section_val = root_table
        .entry(section.to_owned())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = section_val.as_table_mut() {
        table.insert(field.to_owned(), toml::Value::String(val.to_owned()));
    }
}
