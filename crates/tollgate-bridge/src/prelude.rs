//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tollgate_bridge::prelude::*;` to import all essential types.

pub use crate::{BridgeError, BridgeResult};

pub use crate::{BridgeApprovalHandler, BridgeOptions, PromptBridge};

pub use crate::{Prompt, PromptAction, PromptResponse, Question};
