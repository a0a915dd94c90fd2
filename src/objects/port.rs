/*!
 * Ports, Sessions and Shared Memory Blocks
 */

use crate::core::data_structures::InlineString;
use crate::core::types::{GuestAddr, Handle};

/// Named kernel port reachable through ConnectToPort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: InlineString,
}

impl Port {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
        }
    }
}

/// Client session connected to a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub port: Handle,
}

/// Access rights on a shared memory block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum MemoryPermission {
    None = 0,
    Read = 1,
    Write = 2,
    ReadWrite = 3,
    DontCare = 0x1000_0000,
}

impl MemoryPermission {
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(Self::None),
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            3 => Some(Self::ReadWrite),
            0x1000_0000 => Some(Self::DontCare),
            _ => None,
        }
    }

    /// DontCare is granted as read-write
    pub const fn resolve(self) -> Self {
        match self {
            Self::DontCare => Self::ReadWrite,
            other => other,
        }
    }
}

/// Shared memory block created by CreateMemoryBlock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryBlock {
    pub address: GuestAddr,
    pub size: u32,
    pub my_permission: MemoryPermission,
    pub other_permission: MemoryPermission,
    pub mapped: bool,
}
