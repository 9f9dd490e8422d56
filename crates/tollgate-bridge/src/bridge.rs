//! The file-backed prompt mailbox.
//!
//! Every mutation is a read-modify-write of the whole document inside the
//! directory lock, finished by an atomic rename. Readers that skip the lock
//! (`list_pending`, `get_prompt`) always see either the old or the new
//! document, never a torn one.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::document::{BridgeDocument, Prompt, PromptResponse};
use crate::error::{BridgeError, BridgeResult};
use crate::lock::{DirLock, lock_path_for};

/// Default bound on lock acquisition.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
/// Default pause between lock attempts.
pub const DEFAULT_LOCK_RETRY: Duration = Duration::from_millis(25);

/// Tuning for lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Give up acquiring the lock after this long.
    pub lock_timeout: Duration,
    /// Sleep between acquisition attempts.
    pub lock_retry_interval: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            lock_retry_interval: DEFAULT_LOCK_RETRY,
        }
    }
}

/// Handle to a bridge document on disk.
///
/// Cheap to clone. Any number of handles, in any number of processes, may
/// point at the same path; the lock directory is their only coordination.
#[derive(Debug, Clone)]
pub struct PromptBridge {
    path: PathBuf,
    lock_path: PathBuf,
    options: BridgeOptions,
}

impl PromptBridge {
    /// Open a bridge at `path` with default options. Nothing touches the
    /// filesystem until the first operation.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_options(path, BridgeOptions::default())
    }

    /// Open a bridge with explicit lock tuning.
    #[must_use]
    pub fn with_options(path: impl Into<PathBuf>, options: BridgeOptions) -> Self {
        let path = path.into();
        let lock_path = lock_path_for(&path);
        Self {
            path,
            lock_path,
            options,
        }
    }

    /// The document path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The lock directory path.
    #[must_use]
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// The lock tuning in effect.
    #[must_use]
    pub fn options(&self) -> BridgeOptions {
        self.options
    }

    /// Put a prompt into the single pending slot.
    ///
    /// Re-enqueueing a prompt with the same id replaces it in place.
    ///
    /// # Errors
    ///
    /// [`BridgeError::CapacityExceeded`] if a different prompt is still
    /// unanswered, plus lock and I/O failures.
    pub fn enqueue(&self, prompt: Prompt) -> BridgeResult<()> {
        self.update(|doc| {
            if let Some(busy) = doc.pending().into_iter().find(|p| p.id != prompt.id) {
                return Err(BridgeError::CapacityExceeded {
                    pending_id: busy.id.clone(),
                });
            }
            match doc.prompts.iter_mut().find(|p| p.id == prompt.id) {
                Some(existing) => {
                    debug!(prompt_id = %prompt.id, "re-enqueued prompt");
                    *existing = prompt;
                },
                None => {
                    debug!(prompt_id = %prompt.id, "enqueued prompt");
                    doc.prompts.push(prompt);
                },
            }
            Ok(((), true))
        })
    }

    /// Unanswered prompts, oldest first.
    ///
    /// # Errors
    ///
    /// I/O failures other than a missing document.
    pub fn list_pending(&self) -> BridgeResult<Vec<Prompt>> {
        let doc = self.read_document()?;
        Ok(doc.pending().into_iter().cloned().collect())
    }

    /// Look up a prompt, answered or not.
    ///
    /// # Errors
    ///
    /// I/O failures other than a missing document.
    pub fn get_prompt(&self, prompt_id: &str) -> BridgeResult<Option<Prompt>> {
        let doc = self.read_document()?;
        Ok(doc.prompt(prompt_id).cloned())
    }

    /// Record an answer.
    ///
    /// Returns `false` and leaves the document untouched when the prompt is
    /// unknown or already answered; the first answer wins.
    ///
    /// # Errors
    ///
    /// Lock and I/O failures.
    pub fn submit_response(&self, response: PromptResponse) -> BridgeResult<bool> {
        self.update(|doc| {
            if doc.prompt(&response.prompt_id).is_none() {
                debug!(prompt_id = %response.prompt_id, "response for unknown prompt rejected");
                return Ok((false, false));
            }
            if doc.has_response(&response.prompt_id) {
                debug!(prompt_id = %response.prompt_id, "prompt already answered");
                return Ok((false, false));
            }
            info!(
                prompt_id = %response.prompt_id,
                action = %response.action,
                "response submitted"
            );
            doc.responses.push(response);
            Ok((true, true))
        })
    }

    /// Consume the answer to `prompt_id` if one is on file.
    ///
    /// On success the prompt and its answer are both removed.
    ///
    /// # Errors
    ///
    /// Lock and I/O failures.
    pub fn try_take_response(&self, prompt_id: &str) -> BridgeResult<Option<PromptResponse>> {
        self.take_response_within(prompt_id, self.options.lock_timeout)
    }

    fn take_response_within(
        &self,
        prompt_id: &str,
        lock_budget: Duration,
    ) -> BridgeResult<Option<PromptResponse>> {
        self.update_within(lock_budget, |doc| {
            let taken = doc.take_response(prompt_id);
            let changed = taken.is_some();
            if changed {
                debug!(prompt_id, "response consumed");
            }
            Ok((taken, changed))
        })
    }

    /// Remove a prompt and any answer to it. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Lock and I/O failures.
    pub fn withdraw(&self, prompt_id: &str) -> BridgeResult<bool> {
        self.update(|doc| {
            let before = doc.prompts.len();
            doc.prompts.retain(|p| p.id != prompt_id);
            let removed = doc.prompts.len() != before;
            if removed {
                doc.responses.retain(|r| r.prompt_id != prompt_id);
                debug!(prompt_id, "prompt withdrawn");
            }
            Ok((removed, removed))
        })
    }

    /// Consume the answer to `prompt_id` if one arrived, otherwise withdraw
    /// the prompt. One critical section, so an answer submitted before this
    /// call is never discarded.
    ///
    /// # Errors
    ///
    /// Lock and I/O failures.
    pub fn take_or_withdraw(&self, prompt_id: &str) -> BridgeResult<Option<PromptResponse>> {
        self.update(|doc| {
            if let Some(response) = doc.take_response(prompt_id) {
                debug!(prompt_id, "late response consumed instead of withdrawing");
                return Ok((Some(response), true));
            }
            let before = doc.prompts.len();
            doc.prompts.retain(|p| p.id != prompt_id);
            let removed = doc.prompts.len() != before;
            if removed {
                debug!(prompt_id, "unanswered prompt withdrawn");
            }
            Ok((None, removed))
        })
    }

    /// Poll until `prompt_id` is answered, then consume and return the
    /// answer.
    ///
    /// The document is checked at least once. Each check runs on the
    /// blocking pool; between checks the task sleeps for `poll_interval`
    /// (at least 1ms). A check never waits on the lock past the deadline.
    ///
    /// # Errors
    ///
    /// [`BridgeError::ResponseTimeout`] when the deadline passes, including
    /// while the lock is held elsewhere; the prompt stays pending. Lock
    /// timeouts before the deadline and I/O failures abort the wait.
    pub async fn wait_for_response(
        &self,
        prompt_id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> BridgeResult<PromptResponse> {
        let poll_interval = poll_interval.max(Duration::from_millis(1));
        // `None` only when the timeout overflows the clock: wait forever.
        let deadline = tokio::time::Instant::now().checked_add(timeout);

        let timed_out = || BridgeError::ResponseTimeout {
            prompt_id: prompt_id.to_string(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        };
        let expired = |at: tokio::time::Instant| deadline.is_some_and(|d| at >= d);

        loop {
            let lock_budget = deadline.map_or(self.options.lock_timeout, |d| {
                self.options
                    .lock_timeout
                    .min(d.saturating_duration_since(tokio::time::Instant::now()))
            });
            let bridge = self.clone();
            let id = prompt_id.to_string();
            match run_blocking(move || bridge.take_response_within(&id, lock_budget)).await {
                Ok(Some(response)) => return Ok(response),
                Ok(None) => {},
                Err(BridgeError::LockTimeout { .. }) if expired(tokio::time::Instant::now()) => {
                    debug!(prompt_id, "bridge lock still held at response deadline");
                    return Err(timed_out());
                },
                Err(e) => return Err(e),
            }

            let now = tokio::time::Instant::now();
            if expired(now) {
                return Err(timed_out());
            }
            let pause = deadline.map_or(poll_interval, |d| {
                poll_interval.min(d.saturating_duration_since(now))
            });
            tokio::time::sleep(pause).await;
        }
    }

    /// Read-modify-write under the lock. The closure returns its result
    /// and whether the document changed; unchanged documents are not
    /// rewritten.
    fn update<T, F>(&self, f: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut BridgeDocument) -> BridgeResult<(T, bool)>,
    {
        self.update_within(self.options.lock_timeout, f)
    }

    /// [`update`](Self::update) with an explicit bound on lock acquisition.
    fn update_within<T, F>(&self, lock_budget: Duration, f: F) -> BridgeResult<T>
    where
        F: FnOnce(&mut BridgeDocument) -> BridgeResult<(T, bool)>,
    {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| BridgeError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let _guard = DirLock::acquire(
            &self.lock_path,
            lock_budget,
            self.options.lock_retry_interval,
        )?;

        let mut doc = self.read_document()?;
        let (out, changed) = f(&mut doc)?;
        if changed {
            self.write_document(&doc)?;
        }
        Ok(out)
    }

    fn read_document(&self) -> BridgeResult<BridgeDocument> {
        match std::fs::read(&self.path) {
            Ok(bytes) => Ok(BridgeDocument::decode(
                &bytes,
                &self.path.display().to_string(),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BridgeDocument::default()),
            Err(source) => Err(BridgeError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    /// Caller must hold the lock.
    fn write_document(&self, doc: &BridgeDocument) -> BridgeResult<()> {
        let body = serde_json::to_vec_pretty(doc)?;
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let io_err = |source: std::io::Error| BridgeError::Io {
            path: self.path.clone(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
        tmp.write_all(&body).map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&self.path).map_err(|e| io_err(e.error))?;

        debug!(
            path = %self.path.display(),
            prompts = doc.prompts.len(),
            responses = doc.responses.len(),
            "saved bridge document"
        );
        Ok(())
    }
}

/// Run a blocking bridge operation off the async executor.
pub(crate) async fn run_blocking<T, F>(f: F) -> BridgeResult<T>
where
    F: FnOnce() -> BridgeResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BridgeError::Join(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{PromptAction, Question};
    use serde_json::json;
    use std::sync::Arc;

    fn bridge_in(dir: &tempfile::TempDir) -> PromptBridge {
        PromptBridge::with_options(
            dir.path().join("bridge.json"),
            BridgeOptions {
                lock_timeout: Duration::from_millis(500),
                lock_retry_interval: Duration::from_millis(5),
            },
        )
    }

    #[test]
    fn test_missing_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        assert!(bridge.list_pending().unwrap().is_empty());
        assert!(bridge.get_prompt("nope").unwrap().is_none());
    }

    #[test]
    fn test_enqueue_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = PromptBridge::new(dir.path().join("a").join("b").join("bridge.json"));
        bridge.enqueue(Prompt::with_id("p1", Question::new("hi"))).unwrap();
        assert!(bridge.path().is_file());
        assert!(!bridge.lock_path().exists());
    }

    #[test]
    fn test_single_slot_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);

        bridge.enqueue(Prompt::with_id("p1", Question::new("first"))).unwrap();
        let err = bridge
            .enqueue(Prompt::with_id("p2", Question::new("second")))
            .unwrap_err();
        assert!(matches!(err, BridgeError::CapacityExceeded { ref pending_id } if pending_id == "p1"));

        assert!(bridge.submit_response(PromptResponse::accept("p1", json!("ok"))).unwrap());
        bridge.enqueue(Prompt::with_id("p2", Question::new("second"))).unwrap();

        let pending: Vec<String> = bridge.list_pending().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(pending, vec!["p2".to_string()]);
    }

    #[test]
    fn test_reenqueue_same_id_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);

        bridge.enqueue(Prompt::with_id("p1", Question::new("old"))).unwrap();
        bridge.enqueue(Prompt::with_id("p1", Question::new("new"))).unwrap();

        let pending = bridge.list_pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].question.message, "new");
    }

    #[test]
    fn test_submit_unknown_prompt_leaves_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();
        let before = std::fs::read(bridge.path()).unwrap();

        let accepted = bridge
            .submit_response(PromptResponse::accept("ghost", json!("x")))
            .unwrap();
        assert!(!accepted);
        assert_eq!(std::fs::read(bridge.path()).unwrap(), before);
    }

    #[test]
    fn test_first_answer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();

        assert!(bridge.submit_response(PromptResponse::accept("p1", json!("first"))).unwrap());
        assert!(
            !bridge
                .submit_response(PromptResponse::new("p1", PromptAction::Decline, json!("second")))
                .unwrap()
        );

        let taken = bridge.try_take_response("p1").unwrap().unwrap();
        assert_eq!(taken.answer, json!("first"));
        assert!(bridge.get_prompt("p1").unwrap().is_none());
    }

    #[test]
    fn test_try_take_without_answer_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();
        assert!(bridge.try_take_response("p1").unwrap().is_none());
        assert_eq!(bridge.list_pending().unwrap().len(), 1);
    }

    #[test]
    fn test_withdraw_frees_the_slot() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();

        assert!(bridge.withdraw("p1").unwrap());
        assert!(!bridge.withdraw("p1").unwrap());
        bridge.enqueue(Prompt::with_id("p2", Question::new("q"))).unwrap();
    }

    #[test]
    fn test_corrupt_document_self_heals() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        std::fs::write(bridge.path(), b"\x00garbage").unwrap();

        assert!(bridge.list_pending().unwrap().is_empty());
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();
        assert_eq!(bridge.list_pending().unwrap().len(), 1);
    }

    #[test]
    fn test_stale_lock_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        std::fs::create_dir(bridge.lock_path()).unwrap();

        let err = bridge
            .enqueue(Prompt::with_id("p1", Question::new("q")))
            .unwrap_err();
        assert!(matches!(err, BridgeError::LockTimeout { .. }));

        // Reads do not take the lock.
        assert!(bridge.list_pending().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_wait_times_out_and_keeps_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();

        let err = bridge
            .wait_for_response("p1", Duration::from_millis(60), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ResponseTimeout { timeout_ms: 60, .. }));
        assert_eq!(bridge.list_pending().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_wait_deadline_bounds_a_held_lock() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = PromptBridge::with_options(
            dir.path().join("bridge.json"),
            BridgeOptions {
                lock_timeout: Duration::from_secs(5),
                lock_retry_interval: Duration::from_millis(5),
            },
        );
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();
        std::fs::create_dir(bridge.lock_path()).unwrap();

        let started = std::time::Instant::now();
        let err = bridge
            .wait_for_response("p1", Duration::from_millis(100), Duration::from_millis(10))
            .await
            .unwrap_err();
        let waited = started.elapsed();
        std::fs::remove_dir(bridge.lock_path()).unwrap();

        assert!(matches!(err, BridgeError::ResponseTimeout { timeout_ms: 100, .. }));
        assert!(waited < Duration::from_secs(2), "waited {waited:?}");
        assert_eq!(bridge.list_pending().unwrap().len(), 1);
    }

    #[test]
    fn test_take_or_withdraw_prefers_a_late_answer() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();
        assert!(bridge.submit_response(PromptResponse::accept("p1", json!("yes"))).unwrap());

        let taken = bridge.take_or_withdraw("p1").unwrap().unwrap();
        assert_eq!(taken.answer, json!("yes"));
        assert!(bridge.get_prompt("p1").unwrap().is_none());
    }

    #[test]
    fn test_take_or_withdraw_removes_unanswered_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let bridge = bridge_in(&dir);
        bridge.enqueue(Prompt::with_id("p1", Question::new("q"))).unwrap();

        assert!(bridge.take_or_withdraw("p1").unwrap().is_none());
        assert!(bridge.get_prompt("p1").unwrap().is_none());
        assert!(bridge.take_or_withdraw("p1").unwrap().is_none());
        bridge.enqueue(Prompt::with_id("p2", Question::new("q"))).unwrap();
    }

    #[tokio::test]
    async fn test_wait_returns_answer_from_other_handle() {
        let dir = tempfile::tempdir().unwrap();
        let asker = bridge_in(&dir);
        let responder = Arc::new(bridge_in(&dir));
        asker.enqueue(Prompt::with_id("p1", Question::new("name?"))).unwrap();

        let r = Arc::clone(&responder);
        let answer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(40));
            r.submit_response(PromptResponse::accept("p1", json!("Ada")))
        });

        let response = asker
            .wait_for_response("p1", Duration::from_secs(5), Duration::from_millis(10))
            .await
            .unwrap();
        assert!(answer.join().unwrap().unwrap());
        assert_eq!(response.answer, json!("Ada"));
        assert!(responder.list_pending().unwrap().is_empty());
        assert!(responder.get_prompt("p1").unwrap().is_none());
    }
}
