//! Config file discovery and layered loading.
//!
//! `Config::load()`:
//! 1. Parse the embedded `defaults.toml`
//! 2. Merge `~/.tollgate/config.toml` (user)
//! 3. Merge `{root}/.tollgate/config.toml` (workspace)
//! 4. Apply `TOLLGATE_*` env fallbacks for fields no file set
//! 5. Deserialize, derive the bridge path if still unset, validate

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources, deep_merge_tracking, record_leaves};
use crate::show::ResolvedConfig;
use crate::types::Config;
use crate::validate;

/// Embedded default configuration.
const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Maximum allowed config file size (1 MiB).
const MAX_CONFIG_FILE_SIZE: u64 = 1_048_576;

/// Name of the per-user and per-workspace state directory.
pub const TOLLGATE_DIR: &str = ".tollgate";

/// Config file name inside [`TOLLGATE_DIR`].
pub const CONFIG_FILE: &str = "config.toml";

/// Bridge document name inside the user's [`TOLLGATE_DIR`].
pub const BRIDGE_FILE: &str = "prompt-bridge.json";

/// Load the layered configuration.
///
/// `tollgate_home_override` replaces `~/.tollgate` (the directory itself,
/// not its parent).
///
/// # Errors
///
/// Returns a [`ConfigError`] if a file is unreadable, oversized or
/// malformed, or the merged configuration fails validation.
pub fn load(
    workspace_root: Option<&Path>,
    tollgate_home_override: Option<&Path>,
) -> ConfigResult<ResolvedConfig> {
    let tollgate_home = match tollgate_home_override {
        Some(dir) => dir.to_path_buf(),
        None => home_directory()?.join(TOLLGATE_DIR),
    };
    load_layers(workspace_root, &tollgate_home, &collect_env_vars())
}

pub(crate) fn load_layers(
    workspace_root: Option<&Path>,
    tollgate_home: &Path,
    env_vars: &HashMap<String, String>,
) -> ConfigResult<ResolvedConfig> {
    let mut merged: toml::Value =
        toml::from_str(DEFAULTS_TOML).map_err(|e| ConfigError::ParseError {
            path: "<embedded defaults>".to_owned(),
            source: e,
        })?;

    let mut field_sources = FieldSources::new();
    let mut loaded_files = Vec::new();
    record_leaves(&merged, "", ConfigLayer::Defaults, &mut field_sources);

    let user_path = tollgate_home.join(CONFIG_FILE);
    if let Some(overlay) = try_load_file(&user_path)? {
        deep_merge_tracking(&mut merged, &overlay, "", ConfigLayer::User, &mut field_sources);
        info!(path = %user_path.display(), "loaded user config");
        loaded_files.push(user_path.display().to_string());
    }

    if let Some(root) = workspace_root {
        let ws_path = root.join(TOLLGATE_DIR).join(CONFIG_FILE);
        if let Some(overlay) = try_load_file(&ws_path)? {
            deep_merge_tracking(
                &mut merged,
                &overlay,
                "",
                ConfigLayer::Workspace,
                &mut field_sources,
            );
            info!(path = %ws_path.display(), "loaded workspace config");
            loaded_files.push(ws_path.display().to_string());
        }
    }

    let env_count = apply_env_fallbacks(&mut merged, &mut field_sources, env_vars);
    if env_count > 0 {
        debug!(count = env_count, "applied environment variable fallbacks");
    }

    let mut config: Config =
        merged
            .try_into()
            .map_err(|e: toml::de::Error| ConfigError::ParseError {
                path: "<merged config>".to_owned(),
                source: e,
            })?;

    if config.bridge.path.is_none() {
        config.bridge.path = Some(tollgate_home.join(BRIDGE_FILE));
        field_sources.insert("bridge.path".to_owned(), ConfigLayer::Derived);
    }

    validate::validate(&config)?;

    Ok(ResolvedConfig {
        config,
        field_sources,
        loaded_files,
    })
}

/// Load a config from one file, without layering or env fallbacks.
///
/// Missing sections take their built-in defaults; `bridge.path` stays
/// unset unless the file sets it.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed, or
/// fails validation.
pub fn load_file(path: &Path) -> ConfigResult<Config> {
    let content = read_bounded(path)?;
    let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;

    validate::validate(&config)?;
    Ok(config)
}

/// `~/.tollgate/prompt-bridge.json`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDir`] if the home directory is unknown.
pub fn default_bridge_path() -> ConfigResult<PathBuf> {
    Ok(home_directory()?.join(TOLLGATE_DIR).join(BRIDGE_FILE))
}

/// Try to load a file, returning `None` if it does not exist.
///
/// Reads once and checks the size afterwards, so there is no window
/// between a metadata check and the read.
fn try_load_file(path: &Path) -> ConfigResult<Option<toml::Value>> {
    let content = match read_bounded(path) {
        Ok(c) => c,
        Err(ConfigError::ReadError { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!(path = %path.display(), "config file not found, skipping");
            return Ok(None);
        },
        Err(e) => return Err(e),
    };

    let value: toml::Value = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(Some(value))
}

fn read_bounded(path: &Path) -> ConfigResult<String> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.display().to_string(),
        source: e,
    })?;

    let size = u64::try_from(content.len()).unwrap_or(u64::MAX);
    if size > MAX_CONFIG_FILE_SIZE {
        return Err(ConfigError::ValidationError {
            field: path.display().to_string(),
            message: format!(
                "config file is {size} bytes, exceeding the {MAX_CONFIG_FILE_SIZE} byte limit"
            ),
        });
    }
    Ok(content)
}

/// Determine the user's home directory.
fn home_directory() -> ConfigResult<PathBuf> {
    directories::BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .ok_or(ConfigError::NoHomeDir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_defaults_deserialize_to_default_config() {
        let config: Config = toml::from_str(DEFAULTS_TOML).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_without_files() {
        let home = tempfile::tempdir().unwrap();
        let resolved = load_layers(None, home.path(), &HashMap::new()).unwrap();

        assert!(resolved.loaded_files.is_empty());
        assert_eq!(
            resolved.config.bridge.path,
            Some(home.path().join(BRIDGE_FILE))
        );
        assert_eq!(
            resolved.field_sources.get("bridge.path"),
            Some(&ConfigLayer::Derived)
        );
        assert_eq!(
            resolved.field_sources.get("display.max_depth"),
            Some(&ConfigLayer::Defaults)
        );
    }

    #[test]
    fn test_workspace_overrides_user() {
        let home = tempfile::tempdir().unwrap();
        let ws = tempfile::tempdir().unwrap();
        write(
            &home.path().join(CONFIG_FILE),
            "[display]\nmax_depth = 2\nmax_string_len = 64\n",
        );
        write(
            &ws.path().join(TOLLGATE_DIR).join(CONFIG_FILE),
            "[display]\nmax_depth = 3\n",
        );

        let resolved = load_layers(Some(ws.path()), home.path(), &HashMap::new()).unwrap();
        assert_eq!(resolved.config.display.max_depth, 3);
        assert_eq!(resolved.config.display.max_string_len, 64);
        assert_eq!(resolved.loaded_files.len(), 2);
        assert_eq!(
            resolved.field_sources.get("display.max_depth"),
            Some(&ConfigLayer::Workspace)
        );
    }

    #[test]
    fn test_env_fallback_only_for_unset_fields() {
        let home = tempfile::tempdir().unwrap();
        write(&home.path().join(CONFIG_FILE), "[logging]\nlevel = \"warn\"\n");
        let env: HashMap<String, String> = [
            ("TOLLGATE_LOG_LEVEL", "trace"),
            ("TOLLGATE_LOG_FORMAT", "json"),
            ("TOLLGATE_BRIDGE_PATH", "/srv/tollgate/bridge.json"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_owned(), v.to_owned()))
        .collect();

        let resolved = load_layers(None, home.path(), &env).unwrap();
        assert_eq!(resolved.config.logging.level, "warn");
        assert_eq!(resolved.config.logging.format, "json");
        assert_eq!(
            resolved.config.bridge.path,
            Some(PathBuf::from("/srv/tollgate/bridge.json"))
        );
    }

    #[test]
    fn test_tool_rules_parse() {
        let home = tempfile::tempdir().unwrap();
        write(
            &home.path().join(CONFIG_FILE),
            r#"
            [policy]
            allowlist = ["readFile"]

            [[policy.tools]]
            name = "deleteFile"
            risk_class = "high"
            max_depth = 1

            [[policy.tools]]
            name = "login"
            require_approval = true
            redact = [{ key = "otp", replacement = "***" }]
            "#,
        );

        let config = load_layers(None, home.path(), &HashMap::new()).unwrap().config;
        assert_eq!(config.policy.allowlist, vec!["readFile"]);
        assert_eq!(config.policy.tools.len(), 2);
        assert_eq!(config.policy.tools[0].risk_class.as_deref(), Some("high"));
        let redact = config.policy.tools[1].redact.as_ref().unwrap();
        assert_eq!(redact[0].replacement.as_deref(), Some("***"));
    }

    #[test]
    fn test_invalid_merged_config_rejected() {
        let home = tempfile::tempdir().unwrap();
        write(&home.path().join(CONFIG_FILE), "[bridge]\npoll_interval_ms = 0\n");

        let err = load_layers(None, home.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let home = tempfile::tempdir().unwrap();
        write(&home.path().join(CONFIG_FILE), "[display\nmax_depth = ");

        let err = load_layers(None, home.path(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_load_file_nonexistent() {
        let result = load_file(Path::new("/nonexistent/config.toml"));
        assert!(matches!(result, Err(ConfigError::ReadError { .. })));
    }

    #[test]
    fn test_load_file_single_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tollgate.toml");
        write(&path, "[policy]\ndefault_require_approval = false\n");

        let config = load_file(&path).unwrap();
        assert!(!config.policy.default_require_approval);
        assert_eq!(config.display.max_object_keys, 50);
        assert!(config.bridge.path.is_none());
    }

    #[test]
    fn test_oversized_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("huge.toml");
        let data = "x = \"".to_owned() + &"a".repeat(1_100_000) + "\"";
        std::fs::write(&file_path, data).unwrap();

        let result = try_load_file(&file_path);
        assert!(
            matches!(result, Err(ConfigError::ValidationError { .. })),
            "expected ValidationError for oversized config, got: {result:?}"
        );
    }
}
