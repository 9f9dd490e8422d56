//! Approval request and decision types.
//!
//! An [`ApprovalRequest`] is built once per gated call and handed to the
//! decision adapter. The adapter answers with exactly one
//! [`ApprovalDecision`]. Neither outlives the call; the only trace they leave
//! is the emitted events.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use tollgate_core::{RiskClass, Timestamp};

use crate::error::{ApprovalError, ApprovalResult};

/// Correlates one request, its decision, and the resulting execution.
///
/// Freshly generated for every gated call and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(pub Uuid);

impl TraceId {
    /// Create a new random trace ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request for a human decision on one tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    /// Unique trace id.
    pub trace_id: TraceId,
    /// The tool the agent wants to run.
    pub tool_name: String,
    /// Human-readable one-liner.
    pub summary: String,
    /// Severity label from the policy.
    pub risk_class: RiskClass,
    /// Bounded, redacted copy of the arguments.
    pub display_args: Value,
    /// When the request was created.
    pub created_at: Timestamp,
}

impl fmt::Display for ApprovalRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.risk_class, self.summary, self.trace_id)
    }
}

/// The human's answer to an [`ApprovalRequest`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "decision")]
pub enum ApprovalDecision {
    /// Run the call, optionally with replacement arguments.
    Approve {
        /// Arguments that fully replace the original ones. Never merged.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        override_args: Option<Value>,
    },
    /// Do not run the call.
    Deny {
        /// Optional explanation shown to the agent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
}

impl ApprovalDecision {
    /// Approve with the original arguments.
    #[must_use]
    pub fn approve() -> Self {
        Self::Approve {
            override_args: None,
        }
    }

    /// Approve with replacement arguments.
    #[must_use]
    pub fn approve_with_args(args: Value) -> Self {
        Self::Approve {
            override_args: Some(args),
        }
    }

    /// Deny with a reason.
    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self::Deny {
            reason: Some(reason.into()),
        }
    }

    /// Deny without a reason.
    #[must_use]
    pub fn deny_silently() -> Self {
        Self::Deny { reason: None }
    }

    /// Check if this decision approves the call.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve { .. })
    }

    /// Get the denial reason, if this is a denial that has one.
    #[must_use]
    pub fn denial_reason(&self) -> Option<&str> {
        match self {
            Self::Deny { reason } => reason.as_deref(),
            Self::Approve { .. } => None,
        }
    }

    /// Parse a decision received over a wire.
    ///
    /// Accepts exactly `{"decision": "approve"[, "override_args": <any>]}`
    /// or `{"decision": "deny"[, "reason": <string|null>]}`. Anything else
    /// is an [`ApprovalError::InvalidDecision`]; nothing is guessed.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidDecision`] for any other shape.
    pub fn from_value(value: &Value) -> ApprovalResult<Self> {
        let Value::Object(map) = value else {
            return Err(invalid(format!("expected an object, got {}", kind_of(value))));
        };

        let tag = match map.get("decision") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => {
                return Err(invalid(format!(
                    "'decision' must be a string, got {}",
                    kind_of(other)
                )));
            },
            None => return Err(invalid("missing 'decision' field".to_string())),
        };

        let allowed: &[&str] = match tag {
            "approve" => &["decision", "override_args"],
            "deny" => &["decision", "reason"],
            other => {
                return Err(invalid(format!(
                    "unknown decision '{other}'; expected 'approve' or 'deny'"
                )));
            },
        };
        if let Some(extra) = map.keys().find(|k| !allowed.contains(&k.as_str())) {
            return Err(invalid(format!("unexpected field '{extra}' in {tag} decision")));
        }

        if tag == "approve" {
            let override_args = match map.get("override_args") {
                None | Some(Value::Null) => None,
                Some(args) => Some(args.clone()),
            };
            return Ok(Self::Approve { override_args });
        }

        let reason = match map.get("reason") {
            None | Some(Value::Null) => None,
            Some(Value::String(reason)) => Some(reason.clone()),
            Some(other) => {
                return Err(invalid(format!(
                    "'reason' must be a string, got {}",
                    kind_of(other)
                )));
            },
        };
        Ok(Self::Deny { reason })
    }

    /// Check the decision before the gate acts on it.
    ///
    /// An `override_args` of `null` means "no override". A blank reason is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Currently infallible for typed decisions; returns `Result` so adapters
    /// that construct decisions from untrusted parts share one checkpoint.
    pub fn validated(self) -> ApprovalResult<Self> {
        Ok(match self {
            Self::Approve {
                override_args: Some(Value::Null),
            } => Self::approve(),
            Self::Deny {
                reason: Some(reason),
            } if reason.trim().is_empty() => Self::deny_silently(),
            other => other,
        })
    }
}

fn invalid(message: String) -> ApprovalError {
    ApprovalError::InvalidDecision(message)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
