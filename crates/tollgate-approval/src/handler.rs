//! The decision adapter seam.
//!
//! The gate never decides on its own. It hands each [`ApprovalRequest`] to
//! an [`ApprovalHandler`] supplied by the host: a terminal prompt, a UI
//! callback, the prompt bridge, or a scripted test double.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;

use crate::error::ApprovalResult;
use crate::request::{ApprovalDecision, ApprovalRequest};

/// Produces a human decision for an approval request.
///
/// Implementations may take arbitrarily long. The gate imposes no timeout;
/// an adapter that wants one enforces it itself and reports expiry as an
/// error (or as a denial).
///
/// # Example
///
/// ```rust,ignore
/// use tollgate_approval::{ApprovalDecision, ApprovalHandler, ApprovalRequest, ApprovalResult};
///
/// struct AlwaysAsk;
///
/// #[async_trait::async_trait]
/// impl ApprovalHandler for AlwaysAsk {
///     async fn request_approval(&self, request: ApprovalRequest) -> ApprovalResult<ApprovalDecision> {
///         // Present to the user...
///         Ok(ApprovalDecision::deny("not today"))
///     }
/// }
/// ```
#[async_trait]
pub trait ApprovalHandler: Send + Sync {
    /// Present the request and wait for exactly one decision.
    async fn request_approval(&self, request: ApprovalRequest) -> ApprovalResult<ApprovalDecision>;
}

type DecisionFn =
    dyn Fn(ApprovalRequest) -> BoxFuture<'static, ApprovalResult<ApprovalDecision>> + Send + Sync;

/// Adapts an async closure into an [`ApprovalHandler`].
#[derive(Clone)]
pub struct FnHandler {
    decide: Arc<DecisionFn>,
}

impl FnHandler {
    /// Wrap `decide`.
    pub fn new<F>(decide: F) -> Self
    where
        F: Fn(ApprovalRequest) -> BoxFuture<'static, ApprovalResult<ApprovalDecision>>
            + Send
            + Sync
            + 'static,
    {
        Self {
            decide: Arc::new(decide),
        }
    }
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

#[async_trait]
impl ApprovalHandler for FnHandler {
    async fn request_approval(&self, request: ApprovalRequest) -> ApprovalResult<ApprovalDecision> {
        (self.decide)(request).await
    }
}
