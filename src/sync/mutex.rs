/*!
 * Mutex
 */

use super::waitlist::WaitList;
use crate::core::types::ThreadIndex;

/// Recursive mutex payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mutex {
    pub owner: Option<ThreadIndex>,
    pub lock_count: u32,
    pub waitlist: WaitList,
}

impl Mutex {
    /// New mutex, optionally already held once by `owner`
    pub fn new(owner: Option<ThreadIndex>) -> Self {
        Self {
            owner,
            lock_count: u32::from(owner.is_some()),
            waitlist: WaitList::new(),
        }
    }

    /// Free, or already held by `thread` (recursive acquisition)
    #[inline]
    pub fn is_available_to(&self, thread: ThreadIndex) -> bool {
        self.owner.map_or(true, |owner| owner == thread)
    }

    pub fn lock(&mut self, thread: ThreadIndex) {
        self.owner = Some(thread);
        self.lock_count += 1;
    }

    /// Drop one level of ownership; returns true once the mutex is free
    pub fn unlock(&mut self) -> bool {
        self.lock_count = self.lock_count.saturating_sub(1);
        if self.lock_count == 0 {
            self.owner = None;
        }
        self.owner.is_none()
    }
}
