//! Fixtures for common types.

use serde_json::{Value, json};

use tollgate_approval::{ApprovalPolicy, ApprovalRequest, DisplayOptions, ToolRule, TraceId};
use tollgate_core::{RiskClass, Timestamp, ToolCall};

/// A call to `tool_name` with a small argument object.
#[must_use]
pub fn test_call(tool_name: &str) -> ToolCall {
    ToolCall::new(tool_name, json!({"path": "/tmp/example.txt"}))
}

/// A call to `tool_name` with the given arguments.
#[must_use]
pub fn test_call_with(tool_name: &str, args: Value) -> ToolCall {
    ToolCall::new(tool_name, args)
}

/// A policy that gates by default, never gates `readFile`, always gates
/// `deleteFile`, and marks `shell` high risk.
#[must_use]
pub fn test_policy() -> ApprovalPolicy {
    ApprovalPolicy::new(true)
        .with_allowed("readFile")
        .with_denied("deleteFile")
        .with_rule(ToolRule::new("shell").risk_class(RiskClass::High))
        .with_display_defaults(DisplayOptions::default())
}

/// A medium-risk request for `tool_name`.
#[must_use]
pub fn test_request(tool_name: &str) -> ApprovalRequest {
    ApprovalRequest {
        trace_id: TraceId::new(),
        tool_name: tool_name.to_owned(),
        summary: format!("Run tool '{tool_name}'"),
        risk_class: RiskClass::Medium,
        display_args: json!({"path": "/tmp/example.txt"}),
        created_at: Timestamp::now(),
    }
}
