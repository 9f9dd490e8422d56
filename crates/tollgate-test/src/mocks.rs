//! Test doubles for the approval seams.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tollgate_approval::{
    ApprovalDecision, ApprovalError, ApprovalHandler, ApprovalRequest, ApprovalResult, EventSink,
};

/// Decision adapter that replays a queue of scripted answers and records
/// every request it sees.
///
/// Uses `std::sync::Mutex` so scripting works without a runtime. Once the
/// queue is empty the fallback decision is returned.
#[derive(Debug, Clone)]
pub struct ScriptedHandler {
    script: Arc<Mutex<VecDeque<ApprovalResult<ApprovalDecision>>>>,
    requests: Arc<Mutex<Vec<ApprovalRequest>>>,
    fallback: ApprovalDecision,
}

impl Default for ScriptedHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedHandler {
    /// An empty script that denies once exhausted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            fallback: ApprovalDecision::deny("script exhausted"),
        }
    }

    /// Queue a decision.
    #[must_use]
    pub fn then(self, decision: ApprovalDecision) -> Self {
        self.push(Ok(decision));
        self
    }

    /// Queue an adapter failure.
    #[must_use]
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.push(Err(ApprovalError::HandlerFailed(message.into())));
        self
    }

    /// Decision used once the script runs out.
    #[must_use]
    pub fn with_fallback(mut self, decision: ApprovalDecision) -> Self {
        self.fallback = decision;
        self
    }

    /// Queue a decision on a shared handle.
    pub fn push(&self, outcome: ApprovalResult<ApprovalDecision>) {
        if let Ok(mut guard) = self.script.lock() {
            guard.push_back(outcome);
        }
    }

    /// Requests received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<ApprovalRequest> {
        self.requests.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Number of requests received.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|g| g.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ApprovalHandler for ScriptedHandler {
    async fn request_approval(&self, request: ApprovalRequest) -> ApprovalResult<ApprovalDecision> {
        if let Ok(mut guard) = self.requests.lock() {
            guard.push(request);
        }
        let next = self.script.lock().ok().and_then(|mut g| g.pop_front());
        next.unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

/// Approves every request with the original arguments.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApproveHandler;

#[async_trait]
impl ApprovalHandler for AutoApproveHandler {
    async fn request_approval(&self, _request: ApprovalRequest) -> ApprovalResult<ApprovalDecision> {
        Ok(ApprovalDecision::approve())
    }
}

/// Denies every request with a fixed reason.
#[derive(Debug, Clone, Default)]
pub struct AutoDenyHandler {
    reason: Option<String>,
}

impl AutoDenyHandler {
    /// Deny with `reason`.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
impl ApprovalHandler for AutoDenyHandler {
    async fn request_approval(&self, _request: ApprovalRequest) -> ApprovalResult<ApprovalDecision> {
        Ok(ApprovalDecision::Deny {
            reason: self.reason.clone(),
        })
    }
}

/// Severity an event was emitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    /// Via [`EventSink::info`].
    Info,
    /// Via [`EventSink::warn`].
    Warn,
}

/// One captured event.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Severity.
    pub level: EventLevel,
    /// Event name.
    pub name: String,
    /// Structured payload.
    pub payload: Value,
}

/// Event sink that keeps everything it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<RecordedEvent>>>,
}

impl RecordingSink {
    /// An empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All events, in emission order.
    #[must_use]
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// Event names, in emission order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.name).collect()
    }

    /// Payload of the first event named `name`.
    #[must_use]
    pub fn payload_of(&self, name: &str) -> Option<Value> {
        self.events()
            .into_iter()
            .find(|e| e.name == name)
            .map(|e| e.payload)
    }

    fn record(&self, level: EventLevel, name: &str, payload: &Value) {
        if let Ok(mut guard) = self.events.lock() {
            guard.push(RecordedEvent {
                level,
                name: name.to_owned(),
                payload: payload.clone(),
            });
        }
    }
}

impl EventSink for RecordingSink {
    fn info(&self, event: &str, payload: &Value) {
        self.record(EventLevel::Info, event, payload);
    }

    fn warn(&self, event: &str, payload: &Value) {
        self.record(EventLevel::Warn, event, payload);
    }
}
