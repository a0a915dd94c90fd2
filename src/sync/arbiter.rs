/*!
 * Address Arbiter
 * Futex-style blocking on guest memory words
 */

/// Address arbiter payload
///
/// Carries no state of its own: waiters are threads in `WaitArbiter` status
/// keyed by the guest address they block on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddressArbiter;

/// ArbitrateAddress operation selector (r2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ArbitrationType {
    Signal = 0,
    WaitIfLess = 1,
    DecrementAndWaitIfLess = 2,
    WaitIfLessWithTimeout = 3,
    DecrementAndWaitIfLessWithTimeout = 4,
}

impl ArbitrationType {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::Signal),
            1 => Some(Self::WaitIfLess),
            2 => Some(Self::DecrementAndWaitIfLess),
            3 => Some(Self::WaitIfLessWithTimeout),
            4 => Some(Self::DecrementAndWaitIfLessWithTimeout),
            _ => None,
        }
    }

    #[inline]
    pub const fn decrements(self) -> bool {
        matches!(
            self,
            Self::DecrementAndWaitIfLess | Self::DecrementAndWaitIfLessWithTimeout
        )
    }

    #[inline]
    pub const fn has_timeout(self) -> bool {
        matches!(
            self,
            Self::WaitIfLessWithTimeout | Self::DecrementAndWaitIfLessWithTimeout
        )
    }
}
