//! Post-merge configuration validation.
//!
//! Checks ranges and cross-field invariants on a deserialized
//! [`Config`](crate::Config). The first problem found is returned.

use std::collections::HashSet;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, ToolSection};

/// Accepted `risk_class` spellings.
const RISK_CLASSES: &[&str] = &["low", "medium", "high"];

/// Accepted `logging.format` spellings.
const LOG_FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Accepted `logging.target` spellings.
const LOG_TARGETS: &[&str] = &["stderr", "stdout", "file"];

/// Accepted `logging.rotation` spellings.
const LOG_ROTATIONS: &[&str] = &["daily", "hourly", "never"];

/// Validate a merged configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_policy(config)?;
    validate_display(config)?;
    validate_bridge(config)?;
    validate_logging(config)?;
    Ok(())
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

fn validate_policy(config: &Config) -> ConfigResult<()> {
    let mut seen = HashSet::new();
    for (index, tool) in config.policy.tools.iter().enumerate() {
        let field = format!("policy.tools[{index}]");
        if tool.name.trim().is_empty() {
            return Err(invalid(format!("{field}.name"), "tool name must not be empty"));
        }
        if !seen.insert(tool.name.as_str()) {
            return Err(invalid(
                format!("{field}.name"),
                format!("tool '{}' has more than one rule", tool.name),
            ));
        }
        validate_tool(&field, tool)?;
    }
    Ok(())
}

fn validate_tool(field: &str, tool: &ToolSection) -> ConfigResult<()> {
    if let Some(risk) = &tool.risk_class
        && !RISK_CLASSES.contains(&risk.as_str())
    {
        return Err(invalid(
            format!("{field}.risk_class"),
            format!("unknown risk class '{risk}'; expected low, medium or high"),
        ));
    }

    let limits = [
        ("max_string_len", tool.max_string_len),
        ("max_array_len", tool.max_array_len),
        ("max_object_keys", tool.max_object_keys),
    ];
    for (name, value) in limits {
        if value == Some(0) {
            return Err(invalid(format!("{field}.{name}"), "must be at least 1"));
        }
    }

    if let Some(entries) = &tool.redact
        && entries.iter().any(|e| e.key.is_empty())
    {
        return Err(invalid(format!("{field}.redact"), "redaction key must not be empty"));
    }
    Ok(())
}

fn validate_display(config: &Config) -> ConfigResult<()> {
    let d = &config.display;
    let limits = [
        ("display.max_string_len", d.max_string_len),
        ("display.max_array_len", d.max_array_len),
        ("display.max_object_keys", d.max_object_keys),
    ];
    for (field, value) in limits {
        if value == 0 {
            return Err(invalid(field, "must be at least 1"));
        }
    }
    if d.redact_keys.iter().any(String::is_empty) {
        return Err(invalid("display.redact_keys", "redaction key must not be empty"));
    }
    Ok(())
}

fn validate_bridge(config: &Config) -> ConfigResult<()> {
    let b = &config.bridge;
    if b.lock_timeout_ms == 0 {
        return Err(invalid("bridge.lock_timeout_ms", "must be at least 1"));
    }
    if b.lock_retry_ms == 0 || b.lock_retry_ms >= b.lock_timeout_ms {
        return Err(invalid(
            "bridge.lock_retry_ms",
            format!(
                "must be at least 1 and below lock_timeout_ms ({})",
                b.lock_timeout_ms
            ),
        ));
    }
    if b.poll_interval_ms == 0 {
        return Err(invalid("bridge.poll_interval_ms", "must be at least 1"));
    }
    if b.response_timeout_ms == 0 {
        return Err(invalid("bridge.response_timeout_ms", "must be at least 1"));
    }
    if b.path.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
        return Err(invalid("bridge.path", "must not be empty"));
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let format = config.logging.format.to_ascii_lowercase();
    if !LOG_FORMATS.contains(&format.as_str()) {
        return Err(invalid(
            "logging.format",
            format!(
                "unknown format '{}'; expected pretty, compact, json or full",
                config.logging.format
            ),
        ));
    }
    if config.logging.level.trim().is_empty() {
        return Err(invalid("logging.level", "must not be empty"));
    }
    let target = config.logging.target.to_ascii_lowercase();
    if !LOG_TARGETS.contains(&target.as_str()) {
        return Err(invalid(
            "logging.target",
            format!(
                "unknown target '{}'; expected stderr, stdout or file",
                config.logging.target
            ),
        ));
    }
    let rotation = config.logging.rotation.to_ascii_lowercase();
    if !LOG_ROTATIONS.contains(&rotation.as_str()) {
        return Err(invalid(
            "logging.rotation",
            format!(
                "unknown rotation '{}'; expected daily, hourly or never",
                config.logging.rotation
            ),
        ));
    }
    match &config.logging.directory {
        Some(dir) if dir.as_os_str().is_empty() => {
            return Err(invalid("logging.directory", "must not be empty"));
        },
        None if target == "file" => {
            return Err(invalid("logging.directory", "required when target is 'file'"));
        },
        _ => {},
    }
    Ok(())
}
