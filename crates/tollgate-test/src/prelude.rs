//! Prelude module - commonly used test utilities.
//!
//! Use `use tollgate_test::prelude::*;` in tests.

pub use crate::{AutoApproveHandler, AutoDenyHandler, RecordingSink, ScriptedHandler};

pub use crate::{test_call, test_call_with, test_policy, test_request};

pub use crate::init_test_tracing;
