//! Display-safe rendering of tool arguments.
//!
//! [`prepare_for_display`] walks an arbitrary argument tree and produces a
//! copy that is bounded in depth and size and has secrets replaced. The
//! result is what approval prompts show to a human and what events may log.
//!
//! # Rules
//!
//! - Values nested deeper than `max_depth` become [`DEPTH_MARKER`].
//! - Strings longer than `max_string_len` characters are cut and suffixed
//!   with [`STRING_TRUNCATION_SUFFIX`].
//! - Arrays keep their first `max_array_len` items, plus one marker item
//!   when anything was dropped.
//! - Objects keep their first `max_object_keys` entries in enumeration
//!   order, plus `"__truncated": true` when anything was dropped. Only the
//!   walker emits that key: an input key equal to [`OBJECT_TRUNCATION_KEY`],
//!   or starting with [`KEY_ESCAPE`], is shown with one more [`KEY_ESCAPE`]
//!   in front.
//! - A retained key equal to a [`RedactionRule`] key (case-sensitive) shows
//!   the rule's replacement; the original value is never walked.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default replacement for redacted values.
pub const REDACTED: &str = "[REDACTED]";

/// Replaces any value nested beyond `max_depth`.
pub const DEPTH_MARKER: &str = "[Truncated: max depth]";

/// Appended to strings cut at `max_string_len`.
pub const STRING_TRUNCATION_SUFFIX: &str = "...[truncated]";

/// Key merged into objects that had entries dropped.
pub const OBJECT_TRUNCATION_KEY: &str = "__truncated";

/// Prefixed to input keys that would otherwise read as the truncation flag.
pub const KEY_ESCAPE: char = '\\';

/// Shown in place of a value that cannot be represented at all.
pub const UNSERIALIZABLE: &str = "[Unserializable]";

/// Keys redacted when no rule list is configured.
const DEFAULT_REDACTED_KEYS: &[&str] = &[
    "password",
    "secret",
    "token",
    "apiKey",
    "api_key",
    "authorization",
    "Authorization",
];

/// Replace the value stored under an exact key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedactionRule {
    /// Key to match, case-sensitive.
    pub key: String,
    /// Replacement text. Defaults to [`REDACTED`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
}

impl RedactionRule {
    /// Redact `key` with the default marker.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            replacement: None,
        }
    }

    /// Use a custom replacement.
    #[must_use]
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    fn replacement_value(&self) -> Value {
        Value::String(
            self.replacement
                .clone()
                .unwrap_or_else(|| REDACTED.to_string()),
        )
    }
}

/// Limits and redaction rules applied by [`prepare_for_display`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    /// Maximum nesting depth; the root value sits at depth 0.
    pub max_depth: usize,
    /// Maximum string length in characters.
    pub max_string_len: usize,
    /// Maximum number of array items shown.
    pub max_array_len: usize,
    /// Maximum number of object entries shown.
    pub max_object_keys: usize,
    /// Ordered redaction rules; the first rule matching a key wins.
    pub rules: Vec<RedactionRule>,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            max_depth: 4,
            max_string_len: 256,
            max_array_len: 20,
            max_object_keys: 50,
            rules: default_rules(),
        }
    }
}

impl DisplayOptions {
    /// Replace the rule list.
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<RedactionRule>) -> Self {
        self.rules = rules;
        self
    }

    fn rule_for(&self, key: &str) -> Option<&RedactionRule> {
        self.rules.iter().find(|rule| rule.key == key)
    }
}

/// The rules used when nothing else is configured.
#[must_use]
pub fn default_rules() -> Vec<RedactionRule> {
    DEFAULT_REDACTED_KEYS
        .iter()
        .map(|key| RedactionRule::new(*key))
        .collect()
}

/// How the walker sees a value.
enum ArgShape<'a> {
    Scalar(&'a Value),
    Text(&'a str),
    Sequence(&'a [Value]),
    Keyed(&'a Map<String, Value>),
}

impl<'a> ArgShape<'a> {
    fn of(value: &'a Value) -> Self {
        match value {
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::Sequence(items),
            Value::Object(map) => Self::Keyed(map),
            Value::Null | Value::Bool(_) | Value::Number(_) => Self::Scalar(value),
        }
    }
}

/// Produce a bounded, redacted copy of `value`.
///
/// Never fails. Every branch of the output was produced by the walker, so
/// nothing from an unvisited subtree can leak through.
#[must_use]
pub fn prepare_for_display(value: &Value, options: &DisplayOptions) -> Value {
    walk(value, 0, options)
}

/// Serialize an arbitrary host value and prepare it for display.
///
/// Values the serializer rejects (for example maps with non-string keys)
/// render as [`UNSERIALIZABLE`].
#[must_use]
pub fn display_safe<T: Serialize + ?Sized>(value: &T, options: &DisplayOptions) -> Value {
    match serde_json::to_value(value) {
        Ok(v) => prepare_for_display(&v, options),
        Err(e) => {
            tracing::debug!(error = %e, "value is not serializable for display");
            Value::String(UNSERIALIZABLE.to_string())
        },
    }
}

fn walk(value: &Value, depth: usize, options: &DisplayOptions) -> Value {
    if depth > options.max_depth {
        return Value::String(DEPTH_MARKER.to_string());
    }

    let child_depth = depth.saturating_add(1);
    match ArgShape::of(value) {
        ArgShape::Scalar(v) => v.clone(),
        ArgShape::Text(s) => Value::String(truncate_string(s, options.max_string_len)),
        ArgShape::Sequence(items) => {
            let mut out: Vec<Value> = items
                .iter()
                .take(options.max_array_len)
                .map(|item| walk(item, child_depth, options))
                .collect();
            let dropped = items.len().saturating_sub(options.max_array_len);
            if dropped > 0 {
                out.push(Value::String(format!("[Truncated: {dropped} more items]")));
            }
            Value::Array(out)
        },
        ArgShape::Keyed(map) => {
            let mut out = Map::new();
            for (key, child) in map.iter().take(options.max_object_keys) {
                let shown = match options.rule_for(key) {
                    Some(rule) => rule.replacement_value(),
                    None => walk(child, child_depth, options),
                };
                out.insert(display_key(key), shown);
            }
            if map.len() > options.max_object_keys {
                out.insert(OBJECT_TRUNCATION_KEY.to_string(), Value::Bool(true));
            }
            Value::Object(out)
        },
    }
}

/// Keep caller keys out of the walker's namespace.
fn display_key(key: &str) -> String {
    if key == OBJECT_TRUNCATION_KEY || key.starts_with(KEY_ESCAPE) {
        format!("{KEY_ESCAPE}{key}")
    } else {
        key.to_string()
    }
}

fn truncate_string(s: &str, max_len: usize) -> String {
    match s.char_indices().nth(max_len) {
        Some((cut, _)) => format!("{}{STRING_TRUNCATION_SUFFIX}", &s[..cut]),
        None => s.to_string(),
    }
}
