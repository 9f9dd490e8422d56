//! Bridge from `tollgate_config::Config` to domain types.
//!
//! The config crate has no dependencies on other tollgate crates, so every
//! conversion into policy, display, bridge and logging types happens here,
//! once, at startup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};

use tollgate_approval::{
    ApprovalPolicy, DisplayOptions, DisplayOverrides, RedactionRule, ToolRule,
};
use tollgate_bridge::{BridgeOptions, PromptBridge};
use tollgate_config::{BridgeSection, Config, DisplaySection, RedactEntry, ToolSection};
use tollgate_core::RiskClass;
use tollgate_telemetry::{FileRotation, LogConfig, LogFormat, LogTarget};

/// File name prefix for rolling log files.
const LOG_FILE_PREFIX: &str = "tollgate";

/// Convert `[display]` to default display options.
#[must_use]
pub fn to_display_options(display: &DisplaySection) -> DisplayOptions {
    DisplayOptions {
        max_depth: display.max_depth,
        max_string_len: display.max_string_len,
        max_array_len: display.max_array_len,
        max_object_keys: display.max_object_keys,
        rules: display
            .redact_keys
            .iter()
            .map(|key| RedactionRule::new(key.as_str()))
            .collect(),
    }
}

fn to_rules(entries: &[RedactEntry]) -> Vec<RedactionRule> {
    entries
        .iter()
        .map(|entry| match &entry.replacement {
            Some(replacement) => RedactionRule::new(entry.key.as_str()).with_replacement(replacement.as_str()),
            None => RedactionRule::new(entry.key.as_str()),
        })
        .collect()
}

fn to_tool_rule(section: &ToolSection) -> Result<ToolRule> {
    let mut rule = ToolRule::new(section.name.as_str()).with_display(DisplayOverrides {
        max_depth: section.max_depth,
        max_string_len: section.max_string_len,
        max_array_len: section.max_array_len,
        max_object_keys: section.max_object_keys,
        rules: section.redact.as_deref().map(to_rules),
    });
    if let Some(required) = section.require_approval {
        rule = rule.require_approval(required);
    }
    if let Some(risk) = &section.risk_class {
        let risk: RiskClass = risk
            .parse()
            .map_err(|e: String| anyhow!(e))
            .with_context(|| format!("policy rule for '{}'", section.name))?;
        rule = rule.risk_class(risk);
    }
    Ok(rule)
}

/// Convert `[policy]` and `[display]` to an [`ApprovalPolicy`].
///
/// # Errors
///
/// Returns an error if a tool rule names an unknown risk class.
pub fn to_policy(cfg: &Config) -> Result<ApprovalPolicy> {
    let mut policy = ApprovalPolicy::new(cfg.policy.default_require_approval)
        .with_display_defaults(to_display_options(&cfg.display));
    policy.allowlist.extend(cfg.policy.allowlist.iter().cloned());
    policy.denylist.extend(cfg.policy.denylist.iter().cloned());
    for section in &cfg.policy.tools {
        policy = policy.with_rule(to_tool_rule(section)?);
    }
    Ok(policy)
}

/// Convert `[bridge]` timings to lock options.
#[must_use]
pub fn to_bridge_options(bridge: &BridgeSection) -> BridgeOptions {
    BridgeOptions {
        lock_timeout: Duration::from_millis(bridge.lock_timeout_ms),
        lock_retry_interval: Duration::from_millis(bridge.lock_retry_ms),
    }
}

/// Resolve the bridge document path: explicit override, then config, then
/// `~/.tollgate/prompt-bridge.json`.
///
/// # Errors
///
/// Returns an error if no path is configured and the home directory is
/// unknown.
pub fn bridge_path(cfg: &Config, override_path: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path.or_else(|| cfg.bridge.path.clone()) {
        return Ok(path);
    }
    tollgate_config::loader::default_bridge_path().context("resolving default bridge path")
}

/// Open the configured bridge.
///
/// # Errors
///
/// See [`bridge_path`].
pub fn to_bridge(cfg: &Config, override_path: Option<PathBuf>) -> Result<PromptBridge> {
    Ok(PromptBridge::with_options(
        bridge_path(cfg, override_path)?,
        to_bridge_options(&cfg.bridge),
    ))
}

/// How long `ask` waits by default.
#[must_use]
pub fn response_timeout(bridge: &BridgeSection) -> Duration {
    Duration::from_millis(bridge.response_timeout_ms)
}

/// Pause between response checks.
#[must_use]
pub fn poll_interval(bridge: &BridgeSection) -> Duration {
    Duration::from_millis(bridge.poll_interval_ms)
}

/// Convert `[logging]` to a [`LogConfig`]. Unknown formats fall back to
/// compact, unknown rotations to daily, and a file target without a
/// directory to stderr; validation has already rejected all three for
/// loaded configs.
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let logging = &cfg.logging;
    let format = logging
        .format
        .parse::<LogFormat>()
        .unwrap_or(LogFormat::Compact);
    let mut log = LogConfig::new(logging.level.as_str()).with_format(format);

    match (logging.target.to_ascii_lowercase().as_str(), &logging.directory) {
        ("file", Some(dir)) => {
            let rotation = logging.rotation.parse::<FileRotation>().unwrap_or_default();
            log = log.with_file_logging(dir, LOG_FILE_PREFIX, rotation);
        },
        ("stdout", _) => log = log.with_target(LogTarget::Stdout),
        _ => log = log.with_target(LogTarget::Stderr),
    }

    for directive in &logging.directives {
        log = log.with_directive(directive.as_str());
    }
    log
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_approval::policy::MatchSource;

    #[test]
    fn test_default_config_matches_default_policy() {
        let policy = to_policy(&Config::default()).unwrap();
        assert_eq!(policy, ApprovalPolicy::default());
    }

    #[test]
    fn test_policy_conversion() {
        let mut cfg = Config::default();
        cfg.policy.allowlist = vec!["readFile".into()];
        cfg.policy.denylist = vec!["deleteFile".into()];
        cfg.policy.tools.push(ToolSection {
            name: "login".into(),
            risk_class: Some("high".into()),
            max_depth: Some(1),
            redact: Some(vec![RedactEntry {
                key: "otp".into(),
                replacement: Some("***".into()),
            }]),
            ..ToolSection::default()
        });

        let policy = to_policy(&cfg).unwrap();
        assert_eq!(policy.match_tool_with_source("readFile").1, MatchSource::Allowlist);
        assert_eq!(policy.match_tool_with_source("deleteFile").1, MatchSource::Denylist);

        let (verdict, source) = policy.match_tool_with_source("login");
        assert_eq!(source, MatchSource::ToolRule);
        assert_eq!(verdict.risk_class, RiskClass::High);
        assert_eq!(verdict.display_options.max_depth, 1);
        assert_eq!(verdict.display_options.rules.len(), 1);
        assert_eq!(verdict.display_options.rules[0].key, "otp");
    }

    #[test]
    fn test_unknown_risk_class_is_error() {
        let mut cfg = Config::default();
        cfg.policy.tools.push(ToolSection {
            name: "x".into(),
            risk_class: Some("severe".into()),
            ..ToolSection::default()
        });
        let err = to_policy(&cfg).unwrap_err();
        assert!(format!("{err:#}").contains("policy rule for 'x'"));
    }

    #[test]
    fn test_bridge_path_precedence() {
        let mut cfg = Config::default();
        cfg.bridge.path = Some(PathBuf::from("/cfg/bridge.json"));

        assert_eq!(
            bridge_path(&cfg, Some(PathBuf::from("/cli/bridge.json"))).unwrap(),
            PathBuf::from("/cli/bridge.json")
        );
        assert_eq!(bridge_path(&cfg, None).unwrap(), PathBuf::from("/cfg/bridge.json"));
    }

    #[test]
    fn test_bridge_options() {
        let cfg = Config::default();
        let options = to_bridge_options(&cfg.bridge);
        assert_eq!(options, BridgeOptions::default());
        assert_eq!(poll_interval(&cfg.bridge), Duration::from_millis(250));
        assert_eq!(response_timeout(&cfg.bridge), Duration::from_secs(300));
    }

    #[test]
    fn test_log_config() {
        let mut cfg = Config::default();
        cfg.logging.format = "json".into();
        cfg.logging.directives = vec!["tollgate_bridge=debug".into()];
        let log = to_log_config(&cfg);
        assert_eq!(log.format, LogFormat::Json);
        assert_eq!(log.directives, vec!["tollgate_bridge=debug"]);
        assert_eq!(log.target, LogTarget::Stderr);
    }

    #[test]
    fn test_log_config_file_target() {
        let mut cfg = Config::default();
        cfg.logging.target = "file".into();
        cfg.logging.directory = Some(PathBuf::from("/var/log/tollgate"));
        cfg.logging.rotation = "hourly".into();

        let log = to_log_config(&cfg);
        assert_eq!(log.target, LogTarget::File(PathBuf::from("/var/log/tollgate")));
        assert_eq!(log.rotation, FileRotation::Hourly);
        assert_eq!(log.file_prefix, "tollgate");
        assert!(!log.ansi);
    }

    #[test]
    fn test_log_config_stdout_target() {
        let mut cfg = Config::default();
        cfg.logging.target = "stdout".into();
        assert_eq!(to_log_config(&cfg).target, LogTarget::Stdout);
    }
}
