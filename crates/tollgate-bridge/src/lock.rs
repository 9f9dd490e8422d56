//! Cross-process mutual exclusion built on atomic directory creation.
//!
//! `create_dir` either creates the directory or fails with `AlreadyExists`,
//! on every platform and on network filesystems that lack advisory locks.
//! Holding the lock means owning the directory; dropping the guard removes
//! it. There is no lease: a holder that crashes leaves the directory behind
//! and every later acquisition times out until it is removed by hand.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{BridgeError, BridgeResult};

/// Suffix appended to the document path to form the lock directory.
pub const LOCK_SUFFIX: &str = ".lock";

/// Lock directory path for a bridge document.
#[must_use]
pub fn lock_path_for(document: &Path) -> PathBuf {
    let mut name = OsString::from(document.as_os_str());
    name.push(LOCK_SUFFIX);
    PathBuf::from(name)
}

/// Guard for a held directory lock. Released on drop.
#[derive(Debug)]
pub struct DirLock {
    path: PathBuf,
}

impl DirLock {
    /// Acquire the lock, retrying every `retry` until `timeout` has elapsed.
    ///
    /// Blocks the calling thread; async callers go through
    /// `spawn_blocking`.
    ///
    /// # Errors
    ///
    /// [`BridgeError::LockTimeout`] when the directory still exists at the
    /// deadline, [`BridgeError::Io`] for any other creation failure.
    pub fn acquire(path: &Path, timeout: Duration, retry: Duration) -> BridgeResult<Self> {
        let started = Instant::now();
        let mut attempts: u32 = 0;
        loop {
            match std::fs::create_dir(path) {
                Ok(()) => {
                    if attempts > 0 {
                        debug!(lock = %path.display(), attempts, "acquired contended bridge lock");
                    }
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                },
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    let waited = started.elapsed();
                    if waited >= timeout {
                        return Err(BridgeError::LockTimeout {
                            lock_path: path.to_path_buf(),
                            waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                        });
                    }
                    attempts = attempts.saturating_add(1);
                    std::thread::sleep(retry.min(timeout.saturating_sub(waited)));
                },
                Err(source) => {
                    return Err(BridgeError::Io {
                        path: path.to_path_buf(),
                        source,
                    });
                },
            }
        }
    }

    /// The lock directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to release bridge lock");
        }
    }
}
