/*!
 * System Limits and Constants
 *
 * Centralized location for hardware clocks, guest memory layout, thread
 * limits and IPC sizes. Grouped by domain.
 */

use super::types::{GuestAddr, Priority};

// =============================================================================
// CLOCKS
// =============================================================================

/// ARM11 core clock in Hz
pub const ARM11_CLOCK_RATE: u64 = 268_111_856;

/// Cycles between two frame-end (VBlank) events at 60 Hz
pub const VBLANK_INTERVAL_CYCLES: u64 = ARM11_CLOCK_RATE / 60;

// =============================================================================
// HANDLES
// =============================================================================

/// Highest handle the object table may allocate
pub const MAX_OBJECT_HANDLE: u32 = 0xFFFF_7FFF;

/// Maximum handles accepted by a single WaitSynchronizationN call
pub const MAX_WAIT_HANDLES: u32 = 64;

// =============================================================================
// THREADS
// =============================================================================

/// User thread slots per kernel instance
pub const MAX_THREADS: usize = 32;

/// The idle thread lives in the slot after the last user thread
pub const IDLE_THREAD_INDEX: usize = MAX_THREADS;

/// Numerically highest priority a user thread may hold
pub const LOWEST_USER_PRIORITY: Priority = 0x3F;

/// Idle thread priority, below every user thread
pub const IDLE_THREAD_PRIORITY: Priority = 0x40;

pub const DEFAULT_MAIN_THREAD_PRIORITY: Priority = 0x30;

/// Process ID of the emulated application
pub const MAIN_PROCESS_ID: u32 = 1;

// =============================================================================
// GUEST MEMORY LAYOUT
// =============================================================================

/// Guest page size; shared memory blocks must be multiples of it
pub const PAGE_SIZE: u32 = 0x1000;

/// Initial stack pointer of the main thread
pub const STACK_TOP: GuestAddr = 0x1000_0000;

/// Base of the thread-local storage area
pub const TLS_BASE: GuestAddr = 0x1FF8_2000;

/// Per-thread TLS stride
pub const TLS_SIZE: u32 = 0x200;

/// Default linear heap base (FCRAM mapping)
pub const DEFAULT_LINEAR_HEAP_BASE: GuestAddr = 0x1400_0000;

/// Virtual end of the linear heap window used by GetProcessInfo
pub const LINEAR_HEAP_END: GuestAddr = 0x2000_0000;

/// Where the idle thread's four-instruction loop is written
pub const DEFAULT_IDLE_THREAD_CODE: GuestAddr = 0xBFC0_0000;

// =============================================================================
// IPC
// =============================================================================

/// Offset of the IPC command buffer inside a thread's TLS
pub const COMMAND_BUFFER_OFFSET: u32 = 0x80;

/// Size of the IPC command buffer in bytes
pub const COMMAND_BUFFER_SIZE: u32 = 0x100;

/// Longest name ConnectToPort accepts (not counting the terminator)
pub const MAX_PORT_NAME_LEN: usize = 11;

/// Time a thread sleeps after issuing SendSyncRequest
pub const DEFAULT_SYNC_REQUEST_DELAY_NS: i64 = 39_000;

// =============================================================================
// HOST QUEUE
// =============================================================================

/// Default slot count of the auxiliary-thread request queue
pub const DEFAULT_HOST_QUEUE_CAPACITY: usize = 64;
