//! Approval gate: turns a call, a policy verdict and a human decision into
//! either an execution or a denial.
//!
//! # Flow
//!
//! 1. Look the tool up in the [`ApprovalPolicy`].
//! 2. No approval required -> run the executor directly. No request, no events.
//! 3. Otherwise build an [`ApprovalRequest`] with redacted display args and
//!    emit `approval_requested`.
//! 4. Suspend until the [`ApprovalHandler`] answers.
//! 5. Deny -> emit `approval_denied`, fail with [`ApprovalError::Denied`].
//! 6. Approve -> emit `approval_approved`, run the executor with
//!    `override_args` (if any) fully replacing the original args.
//!
//! The gate keeps no state between calls. Clones share the same read-only
//! policy and adapters, so one gate can serve many concurrent calls.

use serde_json::json;
use std::future::Future;
use std::sync::Arc;

use tollgate_core::{Timestamp, ToolCall};
use tracing::debug;

use crate::error::ApprovalError;
use crate::events::{APPROVAL_APPROVED, APPROVAL_DENIED, APPROVAL_REQUESTED, EventSink};
use crate::handler::ApprovalHandler;
use crate::policy::{ApprovalPolicy, PolicyMatch};
use crate::redact::prepare_for_display;
use crate::request::{ApprovalDecision, ApprovalRequest, TraceId};

type SummaryFn = dyn Fn(&ToolCall) -> String + Send + Sync;

/// Gates tool execution behind a human decision.
#[derive(Clone)]
pub struct ApprovalGate {
    policy: Arc<ApprovalPolicy>,
    handler: Arc<dyn ApprovalHandler>,
    sink: Option<Arc<dyn EventSink>>,
    summarize: Option<Arc<SummaryFn>>,
}

impl ApprovalGate {
    /// Create a gate for `policy` that asks `handler` for decisions.
    #[must_use]
    pub fn new(policy: ApprovalPolicy, handler: Arc<dyn ApprovalHandler>) -> Self {
        Self {
            policy: Arc::new(policy),
            handler,
            sink: None,
            summarize: None,
        }
    }

    /// Emit events to `sink`.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the default `Run tool '<name>'` summary.
    #[must_use]
    pub fn with_summary<F>(mut self, summarize: F) -> Self
    where
        F: Fn(&ToolCall) -> String + Send + Sync + 'static,
    {
        self.summarize = Some(Arc::new(summarize));
        self
    }

    /// The policy this gate enforces.
    #[must_use]
    pub fn policy(&self) -> &ApprovalPolicy {
        &self.policy
    }

    /// Run `executor` on `call` once the policy, and a human if needed, allow it.
    ///
    /// The executor's own result or error is returned unchanged. Gate
    /// failures are converted into the caller's error type through
    /// `From<ApprovalError>`.
    ///
    /// # Errors
    ///
    /// - [`ApprovalError::Denied`] when the human denies the call.
    /// - [`ApprovalError::InvalidDecision`] or [`ApprovalError::HandlerFailed`]
    ///   when the adapter misbehaves or fails.
    /// - Whatever the executor returns.
    pub async fn execute_with_approval<T, E, F, Fut>(
        &self,
        call: ToolCall,
        executor: F,
    ) -> Result<T, E>
    where
        F: FnOnce(ToolCall) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<ApprovalError>,
    {
        let verdict = self.policy.match_tool(&call.tool_name);
        if !verdict.require_approval {
            return executor(call).await;
        }

        let request = self.build_request(&call, &verdict);
        let trace_id = request.trace_id.clone();
        self.emit_info(
            APPROVAL_REQUESTED,
            &json!({
                "traceId": trace_id,
                "toolName": call.tool_name,
                "riskClass": verdict.risk_class,
            }),
        );
        debug!(trace_id = %trace_id, tool = %call.tool_name, "awaiting approval decision");

        let decision = self
            .handler
            .request_approval(request)
            .await
            .and_then(ApprovalDecision::validated)?;

        match decision {
            ApprovalDecision::Deny { reason } => {
                self.emit_warn(
                    APPROVAL_DENIED,
                    &json!({
                        "traceId": trace_id,
                        "toolName": call.tool_name,
                        "reason": reason,
                    }),
                );
                Err(ApprovalError::Denied {
                    trace_id,
                    tool_name: call.tool_name,
                    reason,
                }
                .into())
            },
            ApprovalDecision::Approve { override_args } => {
                self.emit_info(
                    APPROVAL_APPROVED,
                    &json!({
                        "traceId": trace_id,
                        "toolName": call.tool_name,
                        "argsOverridden": override_args.is_some(),
                    }),
                );
                let approved = match override_args {
                    Some(args) => call.with_args(args),
                    None => call,
                };
                executor(approved).await
            },
        }
    }

    /// Build the request a human will see for `call`.
    #[must_use]
    pub fn build_request(&self, call: &ToolCall, verdict: &PolicyMatch) -> ApprovalRequest {
        let summary = match &self.summarize {
            Some(summarize) => summarize(call),
            None => format!("Run tool '{}'", call.tool_name),
        };
        ApprovalRequest {
            trace_id: TraceId::new(),
            tool_name: call.tool_name.clone(),
            summary,
            risk_class: verdict.risk_class,
            display_args: prepare_for_display(&call.args, &verdict.display_options),
            created_at: Timestamp::now(),
        }
    }

    fn emit_info(&self, event: &str, payload: &serde_json::Value) {
        if let Some(sink) = &self.sink {
            sink.info(event, payload);
        }
    }

    fn emit_warn(&self, event: &str, payload: &serde_json::Value) {
        if let Some(sink) = &self.sink {
            sink.warn(event, payload);
        }
    }
}

impl std::fmt::Debug for ApprovalGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalGate")
            .field("policy", &self.policy)
            .field("has_sink", &self.sink.is_some())
            .finish_non_exhaustive()
    }
}
