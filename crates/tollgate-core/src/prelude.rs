//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tollgate_core::prelude::*;` to import all essential types.

pub use crate::{RiskClass, Timestamp, ToolCall};
