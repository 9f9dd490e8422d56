//! Tollgate Test - shared test utilities.
//!
//! Scripted decision adapters, a recording event sink, and fixtures, for
//! use as a dev-dependency.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tollgate_approval::{ApprovalDecision, ApprovalGate};
//! use tollgate_test::{ScriptedHandler, test_call, test_policy};
//!
//! #[tokio::test]
//! async fn denied_call_never_runs() {
//!     let handler = ScriptedHandler::new().then(ApprovalDecision::deny("no"));
//!     let gate = ApprovalGate::new(test_policy(), Arc::new(handler));
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod prelude;

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

/// Route `tracing` output through the test harness's captured writer.
///
/// Honors `RUST_LOG`; defaults to `debug` for tollgate crates. Safe to call
/// from every test.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,tollgate=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
