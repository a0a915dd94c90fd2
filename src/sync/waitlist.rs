/*!
 * Wait List
 * Ordered set of threads blocked on one object
 */

use crate::core::types::ThreadIndex;

/// Threads blocked on an object, in the order they blocked
///
/// # Performance
/// - Bounded by the thread limit, so linear scans stay within a cache line or two
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WaitList {
    threads: Vec<ThreadIndex>,
}

impl WaitList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a thread; a thread already present keeps its position
    pub fn push(&mut self, thread: ThreadIndex) {
        if !self.threads.contains(&thread) {
            self.threads.push(thread);
        }
    }

    /// Remove a thread; returns whether it was present
    pub fn remove(&mut self, thread: ThreadIndex) -> bool {
        match self.threads.iter().position(|&t| t == thread) {
            Some(pos) => {
                self.threads.remove(pos);
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, thread: ThreadIndex) -> bool {
        self.threads.contains(&thread)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.threads.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.threads.is_empty()
    }

    /// Waiters in block order
    pub fn iter(&self) -> impl Iterator<Item = ThreadIndex> + '_ {
        self.threads.iter().copied()
    }

    pub fn clear(&mut self) {
        self.threads.clear();
    }

    /// Earliest-blocked thread accepted by `eligible`
    pub fn next_to_wake(&self, eligible: impl Fn(ThreadIndex) -> bool) -> Option<ThreadIndex> {
        self.threads.iter().copied().find(|&t| eligible(t))
    }
}
