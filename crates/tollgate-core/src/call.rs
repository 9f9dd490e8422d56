//! The tool call value passed through the gate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, argument-bearing request for a side-effecting action.
///
/// Calls are treated as immutable. The gate never edits a call in place;
/// substituting arguments produces a new call via [`ToolCall::with_args`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Name of the tool being invoked.
    pub tool_name: String,
    /// Opaque structured arguments.
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    /// Create a new tool call.
    #[must_use]
    pub fn new(tool_name: impl Into<String>, args: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            args,
        }
    }

    /// Derive a call for the same tool with `args` fully replacing the original.
    #[must_use]
    pub fn with_args(&self, args: Value) -> Self {
        Self {
            tool_name: self.tool_name.clone(),
            args,
        }
    }
}
