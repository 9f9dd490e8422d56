//! A decision adapter that routes approval requests through the bridge.
//!
//! The request becomes a prompt whose `details` carry the redacted request.
//! A responder in another process answers it, and the answer is translated
//! back into an [`ApprovalDecision`]:
//!
//! | action    | decision |
//! |-----------|----------|
//! | `accept`  | approve; an object answer with `override_args` replaces the arguments |
//! | `decline` | deny, with the answer text as reason |
//! | `cancel`  | deny with reason `cancelled` |

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use tollgate_approval::{ApprovalDecision, ApprovalError, ApprovalHandler, ApprovalRequest, ApprovalResult};

use crate::bridge::{PromptBridge, run_blocking};
use crate::document::{Prompt, PromptAction, PromptResponse, Question};
use crate::error::BridgeError;

/// Default time a responder has to answer.
pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(300);
/// Default pause between response checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Reason recorded when the responder dismisses the prompt.
pub const CANCELLED_REASON: &str = "cancelled";

/// [`ApprovalHandler`] backed by a [`PromptBridge`].
#[derive(Debug, Clone)]
pub struct BridgeApprovalHandler {
    bridge: PromptBridge,
    timeout: Duration,
    poll_interval: Duration,
}

impl BridgeApprovalHandler {
    /// Create a handler with the default timeout and poll interval.
    #[must_use]
    pub fn new(bridge: PromptBridge) -> Self {
        Self {
            bridge,
            timeout: DEFAULT_RESPONSE_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// How long to wait for the responder.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How often to check for an answer.
    #[must_use]
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// The underlying bridge.
    #[must_use]
    pub fn bridge(&self) -> &PromptBridge {
        &self.bridge
    }

    async fn ask(&self, request: &ApprovalRequest) -> Result<PromptResponse, BridgeError> {
        let details = serde_json::to_value(request)?;
        let prompt = Prompt::with_id(
            request.trace_id.to_string(),
            Question::new(format!("Approve? {request}")).with_details(details),
        );
        let prompt_id = prompt.id.clone();

        let bridge = self.bridge.clone();
        run_blocking(move || bridge.enqueue(prompt)).await?;
        debug!(prompt_id = %prompt_id, tool = %request.tool_name, "approval prompt enqueued");

        match self
            .bridge
            .wait_for_response(&prompt_id, self.timeout, self.poll_interval)
            .await
        {
            Err(e @ BridgeError::ResponseTimeout { .. }) => {
                let bridge = self.bridge.clone();
                let id = prompt_id.clone();
                match run_blocking(move || bridge.take_or_withdraw(&id)).await {
                    Ok(Some(response)) => Ok(response),
                    Ok(None) => Err(e),
                    Err(withdraw_err) => {
                        warn!(prompt_id = %prompt_id, error = %withdraw_err, "failed to withdraw expired prompt");
                        Err(e)
                    },
                }
            },
            other => other,
        }
    }
}

#[async_trait]
impl ApprovalHandler for BridgeApprovalHandler {
    async fn request_approval(&self, request: ApprovalRequest) -> ApprovalResult<ApprovalDecision> {
        let response = self
            .ask(&request)
            .await
            .map_err(|e| ApprovalError::HandlerFailed(e.to_string()))?;
        decision_from_response(&response)
    }
}

/// Translate a bridge answer into an approval decision.
///
/// # Errors
///
/// [`ApprovalError::InvalidDecision`] when an accepting answer is an object
/// with fields other than `override_args`.
pub fn decision_from_response(response: &PromptResponse) -> ApprovalResult<ApprovalDecision> {
    match response.action {
        PromptAction::Accept => match &response.answer {
            Value::Object(map) if !map.is_empty() => {
                let mut decision = map.clone();
                decision.insert("decision".to_string(), Value::String("approve".into()));
                ApprovalDecision::from_value(&Value::Object(decision))
            },
            _ => Ok(ApprovalDecision::approve()),
        },
        PromptAction::Decline => Ok(match &response.answer {
            Value::Null => ApprovalDecision::deny_silently(),
            Value::String(text) if text.trim().is_empty() => ApprovalDecision::deny_silently(),
            Value::String(text) => ApprovalDecision::deny(text.clone()),
            other => ApprovalDecision::deny(other.to_string()),
        }),
        PromptAction::Cancel => Ok(ApprovalDecision::deny(CANCELLED_REASON)),
    }
}
