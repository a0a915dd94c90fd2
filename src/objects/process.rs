/*!
 * Processes and Resource Limits
 * Per-process limit tables and live resource counters
 */

use crate::core::config::ResourceLimitCategory;
use crate::core::errors::KernelError;
use crate::core::types::{Handle, KernelResult};
use serde::{Deserialize, Serialize};

/// Limitable resources, numbered as the guest names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum ResourceType {
    Priority = 0,
    Commit = 1,
    Thread = 2,
    Event = 3,
    Mutex = 4,
    Semaphore = 5,
    Timer = 6,
    SharedMemory = 7,
    AddressArbiter = 8,
    CpuTime = 9,
}

pub const RESOURCE_TYPE_COUNT: usize = 10;

impl ResourceType {
    pub const ALL: [ResourceType; RESOURCE_TYPE_COUNT] = [
        Self::Priority,
        Self::Commit,
        Self::Thread,
        Self::Event,
        Self::Mutex,
        Self::Semaphore,
        Self::Timer,
        Self::SharedMemory,
        Self::AddressArbiter,
        Self::CpuTime,
    ];

    #[inline]
    pub fn from_raw(raw: u32) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Commit => "commit",
            Self::Thread => "threads",
            Self::Event => "events",
            Self::Mutex => "mutexes",
            Self::Semaphore => "semaphores",
            Self::Timer => "timers",
            Self::SharedMemory => "shared memory blocks",
            Self::AddressArbiter => "address arbiters",
            Self::CpuTime => "cpu time",
        }
    }
}

// Maxima per category, indexed by ResourceType
const APPLICATION_LIMITS: [u64; RESOURCE_TYPE_COUNT] =
    [0x18, 0x0400_0000, 0x20, 0x20, 0x20, 0x8, 0x8, 0x20, 0x2, 0x1E];
const SYSTEM_APPLET_LIMITS: [u64; RESOURCE_TYPE_COUNT] =
    [0x4, 0x05E0_0000, 0x1D, 0xB, 0x8, 0x4, 0x4, 0x8, 0x3, 0x2710];
const LIBRARY_APPLET_LIMITS: [u64; RESOURCE_TYPE_COUNT] =
    [0x4, 0x0060_0000, 0xE, 0x8, 0x8, 0x4, 0x4, 0x8, 0x1, 0x2710];
const OTHER_LIMITS: [u64; RESOURCE_TYPE_COUNT] =
    [0x4, 0x0218_0000, 0xE1, 0x108, 0x25, 0x43, 0x2C, 0x1F, 0x2D, 0x3E8];

/// Resource limit object payload
///
/// Counters for Priority and CpuTime are not tracked here; the kernel derives
/// them from thread state and configuration when queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLimits {
    category: ResourceLimitCategory,
    current: [u64; RESOURCE_TYPE_COUNT],
}

impl ResourceLimits {
    pub fn new(category: ResourceLimitCategory) -> Self {
        Self {
            category,
            current: [0; RESOURCE_TYPE_COUNT],
        }
    }

    /// Maximum value for a resource in this table's category
    pub fn max(&self, resource: ResourceType) -> u64 {
        let table = match self.category {
            ResourceLimitCategory::Application => &APPLICATION_LIMITS,
            ResourceLimitCategory::SystemApplet => &SYSTEM_APPLET_LIMITS,
            ResourceLimitCategory::LibraryApplet => &LIBRARY_APPLET_LIMITS,
            ResourceLimitCategory::Other => &OTHER_LIMITS,
        };
        table[resource as usize]
    }

    #[inline]
    pub fn current(&self, resource: ResourceType) -> u64 {
        self.current[resource as usize]
    }

    /// Charge `amount` units, failing fatally if the maximum would be exceeded
    pub fn acquire(&mut self, resource: ResourceType, amount: u64) -> KernelResult<()> {
        let max = self.max(resource);
        let slot = &mut self.current[resource as usize];
        let next = slot.saturating_add(amount);
        if next > max {
            return Err(KernelError::ResourceLimitExceeded(
                format!("{} (max {:#X}, requested {:#X})", resource.as_str(), max, next).into(),
            ));
        }
        *slot = next;
        Ok(())
    }

    pub fn release(&mut self, resource: ResourceType, amount: u64) {
        let slot = &mut self.current[resource as usize];
        *slot = slot.saturating_sub(amount);
    }
}

/// Process object payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Process {
    pub id: u32,
    pub resource_limit: Handle,
}
