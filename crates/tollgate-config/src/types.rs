//! Configuration types.
//!
//! Nothing here depends on other tollgate crates. The CLI converts these
//! mirrors into policy, display, bridge and logging types at startup. Every
//! struct implements [`Default`] with the same values as `defaults.toml`, so
//! a bare `[section]` header yields a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which tools need approval and how they are shown.
    pub policy: PolicySection,
    /// Default display bounds and redaction keys.
    pub display: DisplaySection,
    /// Prompt bridge location and timing.
    pub bridge: BridgeSection,
    /// Log level, format and directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// Approval policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySection {
    /// Fallback for tools no other rule mentions.
    pub default_require_approval: bool,
    /// Tools that never need approval.
    pub allowlist: Vec<String>,
    /// Tools that always need approval.
    pub denylist: Vec<String>,
    /// Per-tool rules.
    pub tools: Vec<ToolSection>,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            default_require_approval: true,
            allowlist: Vec::new(),
            denylist: Vec::new(),
            tools: Vec::new(),
        }
    }
}

/// One `[[policy.tools]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSection {
    /// Exact tool name.
    pub name: String,
    /// Override the approval requirement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_approval: Option<bool>,
    /// `low`, `medium` or `high`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_class: Option<String>,
    /// Override `display.max_depth`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    /// Override `display.max_string_len`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_string_len: Option<usize>,
    /// Override `display.max_array_len`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_array_len: Option<usize>,
    /// Override `display.max_object_keys`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_object_keys: Option<usize>,
    /// Replace the default redaction keys for this tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redact: Option<Vec<RedactEntry>>,
}

/// A key to scrub from displayed arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactEntry {
    /// Exact object key.
    pub key: String,
    /// Text shown instead of the value. Defaults to `[REDACTED]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// Default bounds for the display copy of tool arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Nesting depth before values are replaced with a marker.
    pub max_depth: usize,
    /// Characters kept from each string.
    pub max_string_len: usize,
    /// Elements kept from each array.
    pub max_array_len: usize,
    /// Keys kept from each object.
    pub max_object_keys: usize,
    /// Keys whose values are always redacted.
    pub redact_keys: Vec<String>,
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_string_len: 256,
            max_array_len: 20,
            max_object_keys: 50,
            redact_keys: [
                "password",
                "secret",
                "token",
                "apiKey",
                "api_key",
                "authorization",
                "Authorization",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// Prompt bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeSection {
    /// Document path. Filled with `<home>/.tollgate/prompt-bridge.json` by
    /// the layered loader when no layer sets it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Give up acquiring the lock after this many milliseconds.
    pub lock_timeout_ms: u64,
    /// Pause between lock attempts.
    pub lock_retry_ms: u64,
    /// Pause between response checks while waiting.
    pub poll_interval_ms: u64,
    /// How long an asker waits for an answer.
    pub response_timeout_ms: u64,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            path: None,
            lock_timeout_ms: 5_000,
            lock_retry_ms: 25,
            poll_interval_ms: 250,
            response_timeout_ms: 300_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level filter.
    pub level: String,
    /// `pretty`, `compact`, `json` or `full`.
    pub format: String,
    /// Extra `target=level` directives.
    pub directives: Vec<String>,
    /// `stderr`, `stdout` or `file`.
    pub target: String,
    /// Log directory when `target = "file"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
    /// `daily`, `hourly` or `never`; only used for file output.
    pub rotation: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "pretty".to_owned(),
            directives: Vec::new(),
            target: "stderr".to_owned(),
            directory: None,
            rotation: "daily".to_owned(),
        }
    }
}
