use std::path::PathBuf;

/// Errors that can occur while operating on the prompt bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The lock directory could not be created before the timeout.
    ///
    /// A crashed holder leaves the directory behind; it must be removed by
    /// hand before the bridge is usable again.
    #[error("timed out after {waited_ms}ms waiting for bridge lock {}", lock_path.display())]
    LockTimeout {
        /// The lock directory.
        lock_path: PathBuf,
        /// How long acquisition was retried.
        waited_ms: u64,
    },

    /// A different prompt is already waiting for an answer.
    #[error("prompt bridge is busy: prompt '{pending_id}' is still pending")]
    CapacityExceeded {
        /// Id of the prompt occupying the slot.
        pending_id: String,
    },

    /// No response arrived before the deadline. The prompt stays pending.
    #[error("no response to prompt '{prompt_id}' within {timeout_ms}ms")]
    ResponseTimeout {
        /// The prompt that was waited on.
        prompt_id: String,
        /// The wait budget.
        timeout_ms: u64,
    },

    /// Filesystem failure other than a missing document.
    #[error("bridge I/O error at {}: {source}", path.display())]
    Io {
        /// The path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document could not be serialized.
    #[error("failed to serialize bridge document: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A blocking bridge task panicked or was cancelled.
    #[error("bridge task failed: {0}")]
    Join(String),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;
