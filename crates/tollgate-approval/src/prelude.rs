//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tollgate_approval::prelude::*;` to import all essential types.

// Errors
pub use crate::{ApprovalError, ApprovalResult};

// Gate and adapters
pub use crate::{ApprovalGate, ApprovalHandler, EventSink, FnHandler, TracingEventSink};

// Policy
pub use crate::{ApprovalPolicy, DisplayOverrides, PolicyMatch, ToolRule};

// Display
pub use crate::{DisplayOptions, RedactionRule, prepare_for_display};

// Requests and decisions
pub use crate::{ApprovalDecision, ApprovalRequest, TraceId};
