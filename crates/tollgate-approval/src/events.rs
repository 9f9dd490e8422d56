//! Structured event emission for gated calls.
//!
//! The gate reports what happened through an optional [`EventSink`]. With no
//! sink configured the events are dropped. [`TracingEventSink`] forwards them
//! to `tracing`, which is what the CLI wires up.

use serde_json::Value;

/// A gated call is waiting on a human.
pub const APPROVAL_REQUESTED: &str = "approval_requested";
/// A human approved a gated call.
pub const APPROVAL_APPROVED: &str = "approval_approved";
/// A human denied a gated call.
pub const APPROVAL_DENIED: &str = "approval_denied";

/// Receives gate events.
pub trait EventSink: Send + Sync {
    /// Informational event.
    fn info(&self, event: &str, payload: &Value);

    /// Event worth attention.
    fn warn(&self, event: &str, payload: &Value);
}

/// Forwards events to `tracing` under the `tollgate::events` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn info(&self, event: &str, payload: &Value) {
        tracing::info!(target: "tollgate::events", event, %payload, "gate event");
    }

    fn warn(&self, event: &str, payload: &Value) {
        tracing::warn!(target: "tollgate::events", event, %payload, "gate event");
    }
}
