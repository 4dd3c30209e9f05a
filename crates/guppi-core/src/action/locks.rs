//! Non-reentrancy guarding for shell actions.
//!
//! Many tasks from many connections may race on the same action name, so the
//! in-flight set is mutex-guarded. This is the only mutable state shared
//! across the dispatch core.

use std::collections::HashSet;
use std::sync::Mutex;

/// The set of shell-action names currently executing.
///
/// Concurrent triggers for a busy action are dropped, not queued: a failed
/// [`acquire`](Self::acquire) means the caller skips execution entirely.
#[derive(Debug, Default)]
pub struct RunLocks {
    held: Mutex<HashSet<String>>,
}

impl RunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to mark `name` as in flight.
    ///
    /// Returns `None` when a previous run of the same action still holds the
    /// lock. On success the returned guard releases the lock when dropped,
    /// on success and failure paths alike.
    pub fn acquire(&self, name: &str) -> Option<RunLockGuard<'_>> {
        if !self.held.lock().unwrap().insert(name.to_string()) {
            return None;
        }
        Some(RunLockGuard {
            locks: self,
            name: name.to_string(),
        })
    }

    /// Whether `name` is currently marked as in flight.
    pub fn is_held(&self, name: &str) -> bool {
        self.held.lock().unwrap().contains(name)
    }
}

/// Releases the owning action's in-flight marker on drop.
#[derive(Debug)]
pub struct RunLockGuard<'a> {
    locks: &'a RunLocks,
    name: String,
}

impl Drop for RunLockGuard<'_> {
    fn drop(&mut self) {
        self.locks.held.lock().unwrap().remove(&self.name);
    }
}
