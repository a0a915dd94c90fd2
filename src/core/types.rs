/*!
 * Core Types
 * Common types used across the kernel
 */

use serde::{Deserialize, Serialize};

/// Guest-visible object handle (index into the object table)
pub type Handle = u32;

/// Index into the kernel thread array
pub type ThreadIndex = usize;

/// Absolute ARM11 cycle count
pub type Tick = u64;

/// 32-bit guest virtual address
pub type GuestAddr = u32;

/// Guest thread priority (lower value = scheduled first)
pub type Priority = u32;

/// Common result type for kernel operations
pub type KernelResult<T> = Result<T, super::errors::KernelError>;

/// Outcome reported to the guest through its result register
pub type GuestResult<T = ()> = Result<T, super::result::ResultCode>;

/// Policy governing how an event or timer clears its signalled state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ResetType {
    /// Cleared when a single waiter is woken
    OneShot = 0,
    /// Stays signalled until explicitly cleared
    Sticky = 1,
    /// Wakes current waiters, then clears immediately
    Pulse = 2,
}

impl ResetType {
    /// Decode the raw value passed in a guest register
    #[inline]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::OneShot),
            1 => Some(Self::Sticky),
            2 => Some(Self::Pulse),
            _ => None,
        }
    }

    #[inline]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneShot => "OneShot",
            Self::Sticky => "Sticky",
            Self::Pulse => "Pulse",
        }
    }
}

/// Join two guest registers into a signed 64-bit value (`lo | hi << 32`)
#[inline(always)]
pub const fn join_s64(lo: u32, hi: u32) -> i64 {
    ((hi as u64) << 32 | lo as u64) as i64
}
