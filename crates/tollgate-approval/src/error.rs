use crate::request::TraceId;

/// Errors raised by the approval gate.
///
/// Executor failures never appear here: the gate returns them to the caller
/// untouched, so a human rejection ([`ApprovalError::Denied`]) is always
/// distinguishable from a failing tool.
#[derive(Debug, thiserror::Error)]
pub enum ApprovalError {
    /// A human denied the call; the executor was not invoked.
    #[error("approval denied for tool '{tool_name}' ({trace_id}): {}", reason.as_deref().unwrap_or("no reason given"))]
    Denied {
        /// Trace id of the request that was denied.
        trace_id: TraceId,
        /// The tool that was denied.
        tool_name: String,
        /// Optional human-supplied reason.
        reason: Option<String>,
    },

    /// The decision adapter returned something that is neither a well-formed
    /// approval nor a well-formed denial.
    #[error("invalid approval decision: {0}")]
    InvalidDecision(String),

    /// The decision adapter itself failed before producing a decision.
    #[error("approval handler failed: {0}")]
    HandlerFailed(String),
}

impl ApprovalError {
    /// Trace id carried by a denial, if this is one.
    #[must_use]
    pub fn trace_id(&self) -> Option<&TraceId> {
        match self {
            Self::Denied { trace_id, .. } => Some(trace_id),
            Self::InvalidDecision(_) | Self::HandlerFailed(_) => None,
        }
    }

    /// Check if this error is a human denial.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(self, Self::Denied { .. })
    }
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;
