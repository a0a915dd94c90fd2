/*!
 * Guest Result Codes
 * Bit-packed result words returned to guest code in r0
 *
 * Layout: `level << 27 | summary << 21 | module << 10 | description`.
 * Bad-handle and timeout outcomes are reported through these codes and never
 * unwind the emulation core.
 */

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result word written to a guest thread's return register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct ResultCode(u32);

/// Severity field (bits 27-31)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Level {
    Success = 0,
    Info = 1,
    Status = 25,
    Temporary = 26,
    Permanent = 27,
    Usage = 28,
    Reinitialize = 29,
    Reset = 30,
    Fatal = 31,
}

/// Summary field (bits 21-26)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Summary {
    Success = 0,
    NothingHappened = 1,
    WouldBlock = 2,
    OutOfResource = 3,
    NotFound = 4,
    InvalidState = 5,
    NotSupported = 6,
    InvalidArgument = 7,
    WrongArgument = 8,
    Canceled = 9,
    StatusChanged = 10,
    Internal = 11,
}

/// Module field (bits 10-17)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Module {
    Common = 0,
    Kernel = 1,
    Os = 6,
    Srv = 26,
}

impl ResultCode {
    pub const SUCCESS: Self = Self(0);
    pub const INVALID_HANDLE: Self = Self(0xD8E0_07F7);
    pub const TIMEOUT: Self = Self(0x0940_1BFE);
    pub const OUT_OF_RANGE: Self = Self(0xD8E0_07FD);
    pub const BAD_THREAD_PRIORITY: Self = Self(0xE0E0_1BFD);
    pub const INVALID_MUTEX_RELEASE: Self = Self(0xD8E0_041F);
    pub const INVALID_ENUM_VALUE: Self = Self(0xD8E0_07ED);
    pub const MISALIGNED_SIZE: Self = Self(0xE0E0_1BF2);
    pub const INVALID_COMBINATION: Self = Self(0xE0E0_1BEE);
    pub const PORT_NAME_TOO_LONG: Self = Self(0xE0E0_181E);
    pub const NOT_FOUND: Self = Self(0xD880_07FA);

    /// Pack the four fields into a result word
    #[inline]
    pub const fn new(level: Level, summary: Summary, module: Module, description: u32) -> Self {
        Self(
            (level as u32) << 27
                | (summary as u32 & 0x3F) << 21
                | (module as u32 & 0xFF) << 10
                | (description & 0x3FF),
        )
    }

    #[inline(always)]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline(always)]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Bit 31 marks a failure; informational codes such as TIMEOUT leave it clear
    #[inline(always)]
    pub const fn is_failure(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    #[inline]
    pub const fn level(self) -> u32 {
        self.0 >> 27
    }

    #[inline]
    pub const fn summary(self) -> u32 {
        (self.0 >> 21) & 0x3F
    }

    #[inline]
    pub const fn module(self) -> u32 {
        (self.0 >> 10) & 0xFF
    }

    #[inline]
    pub const fn description(self) -> u32 {
        self.0 & 0x3FF
    }
}

impl From<ResultCode> for u32 {
    #[inline(always)]
    fn from(code: ResultCode) -> Self {
        code.0
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}
