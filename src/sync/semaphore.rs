/*!
 * Semaphore
 */

use super::waitlist::WaitList;

/// Counting semaphore payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Semaphore {
    pub available: i32,
    pub maximum: i32,
    pub waitlist: WaitList,
}

impl Semaphore {
    pub fn new(initial: i32, maximum: i32) -> Self {
        Self {
            available: initial,
            maximum,
            waitlist: WaitList::new(),
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.available > 0
    }

    /// Whether releasing `count` more slots stays within the maximum
    #[inline]
    pub fn can_release(&self, count: i32) -> bool {
        count >= 0 && (self.available as i64 + count as i64) <= self.maximum as i64
    }
}
