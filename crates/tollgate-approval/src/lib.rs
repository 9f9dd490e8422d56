//! Tollgate Approval - human-in-the-loop gating of tool calls.
//!
//! This crate decides whether a tool call needs a human, shows the human a
//! safe rendering of the call, and executes or refuses the call based on
//! the answer.
//!
//! # Components
//!
//! - **Redaction** ([`redact`]): depth/size-bounded, secret-scrubbed display copies
//! - **Policy** ([`policy`]): allowlist, denylist, per-tool rules, default
//! - **Gate** ([`gate`]): policy lookup, suspension for a decision, execute or deny
//! - **Handler** ([`handler`]): the decision adapter seam supplied by the host
//! - **Events** ([`events`]): optional structured event sink
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use futures::FutureExt;
//! use serde_json::json;
//! use tollgate_approval::{ApprovalDecision, ApprovalError, ApprovalGate, ApprovalPolicy, FnHandler};
//! use tollgate_core::ToolCall;
//!
//! # tokio_test_block_on(async {
//! let handler = FnHandler::new(|_request| async { Ok(ApprovalDecision::deny("no")) }.boxed());
//! let gate = ApprovalGate::new(ApprovalPolicy::new(true), Arc::new(handler));
//!
//! let result: Result<(), ApprovalError> = gate
//!     .execute_with_approval(ToolCall::new("deleteFile", json!({})), |_call| async { Ok(()) })
//!     .await;
//! assert!(result.unwrap_err().is_denied());
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     futures::executor::block_on(f)
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

/// Error types and results for the approval gate.
pub mod error;
pub mod events;
pub mod gate;
pub mod handler;
pub mod policy;
pub mod redact;
pub mod request;

pub use error::{ApprovalError, ApprovalResult};
pub use events::{EventSink, TracingEventSink};
pub use gate::ApprovalGate;
pub use handler::{ApprovalHandler, FnHandler};
pub use policy::{ApprovalPolicy, DisplayOverrides, MatchSource, PolicyMatch, ToolRule};
pub use redact::{DisplayOptions, RedactionRule, display_safe, prepare_for_display};
pub use request::{ApprovalDecision, ApprovalRequest, TraceId};
