//! Tollgate Bridge - a file-backed, single-slot prompt mailbox.
//!
//! One process asks a question by enqueueing a [`Prompt`]; another process,
//! sharing nothing but a filesystem path, lists pending prompts and submits
//! a [`PromptResponse`]. The asker polls until the answer appears and
//! consumes it.
//!
//! At most one prompt may be unanswered at a time across the whole
//! document. Mutations run inside a lock directory created next to the
//! document (`<path>.lock`) and finish with an atomic rename, so a crash
//! loses at most one mutation and never leaves a half-written file.
//!
//! ```no_run
//! use std::time::Duration;
//! use serde_json::json;
//! use tollgate_bridge::{Prompt, PromptBridge, PromptResponse, Question};
//!
//! # async fn demo() -> tollgate_bridge::BridgeResult<()> {
//! let bridge = PromptBridge::new("/tmp/prompt-bridge.json");
//! let prompt = Prompt::new(Question::new("Which branch?"));
//! let id = prompt.id.clone();
//! bridge.enqueue(prompt)?;
//!
//! // Elsewhere: bridge.submit_response(PromptResponse::accept(&id, json!("main")))?;
//! # let _ = PromptResponse::accept(id.clone(), json!("main"));
//! let answer = bridge
//!     .wait_for_response(&id, Duration::from_secs(60), Duration::from_millis(250))
//!     .await?;
//! println!("{}", answer.answer);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod bridge;
pub mod document;
/// Bridge error types.
pub mod error;
pub mod handler;
pub mod lock;

pub use bridge::{BridgeOptions, DEFAULT_LOCK_RETRY, DEFAULT_LOCK_TIMEOUT, PromptBridge};
pub use document::{
    BridgeDocument, DOCUMENT_VERSION, Prompt, PromptAction, PromptResponse, Question,
};
pub use error::{BridgeError, BridgeResult};
pub use handler::{
    BridgeApprovalHandler, DEFAULT_POLL_INTERVAL, DEFAULT_RESPONSE_TIMEOUT, decision_from_response,
};
pub use lock::{DirLock, LOCK_SUFFIX, lock_path_for};
