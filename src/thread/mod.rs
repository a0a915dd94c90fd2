/*!
 * Thread Model
 * Per-thread register snapshot, status state machine and wait bookkeeping
 */

use crate::core::limits::{TLS_BASE, TLS_SIZE};
use crate::core::types::{GuestAddr, Handle, Priority, ThreadIndex, Tick};
use crate::cpu::{cpsr, ThreadContext, FPSCR_THREAD_DEFAULT, PC, SP};
use crate::sync::WaitList;
use serde::{Deserialize, Serialize};

/// Scheduling state of a thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreadStatus {
    Running,
    Ready,
    /// WaitSynchronization1
    WaitSync1,
    /// WaitSynchronizationN, any object
    WaitSyncAny,
    /// WaitSynchronizationN, all objects
    WaitSyncAll,
    WaitArbiter,
    WaitSleep,
    Dead,
}

impl ThreadStatus {
    /// Blocked in a wait that a timeout or a signal can end
    #[inline]
    pub const fn is_waiting(self) -> bool {
        matches!(
            self,
            Self::WaitSync1 | Self::WaitSyncAny | Self::WaitSyncAll | Self::WaitArbiter | Self::WaitSleep
        )
    }
}

/// Processor affinity requested at thread creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorId {
    AllCpus,
    Default,
    AppCore,
    SysCore,
    /// New-model extra cores 2 and 3
    Extra(u8),
}

impl ProcessorId {
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            -1 => Some(Self::AllCpus),
            -2 => Some(Self::Default),
            0 => Some(Self::AppCore),
            1 => Some(Self::SysCore),
            2 | 3 => Some(Self::Extra(raw as u8)),
            _ => None,
        }
    }

    /// Core number reported by GetCurrentProcessorNumber
    pub const fn core_number(self) -> u32 {
        match self {
            Self::AllCpus | Self::Default | Self::AppCore => 0,
            Self::SysCore => 1,
            Self::Extra(n) => n as u32,
        }
    }
}

/// TLS address of a thread slot
#[inline]
pub const fn tls_address(index: ThreadIndex) -> GuestAddr {
    TLS_BASE + index as u32 * TLS_SIZE
}

/// Guest thread
#[derive(Debug, Clone)]
pub struct Thread {
    pub index: ThreadIndex,
    /// Object handle, `None` for the idle thread
    pub handle: Option<Handle>,
    pub context: ThreadContext,
    pub initial_sp: GuestAddr,
    pub entrypoint: GuestAddr,
    pub arg: u32,
    pub priority: Priority,
    pub processor_id: ProcessorId,
    pub status: ThreadStatus,
    /// Handles this thread is blocked on, in call order
    pub wait_list: Vec<Handle>,
    /// Absolute tick at which the pending wait times out, `u64::MAX` for none
    pub wakeup_tick: Tick,
    /// Guest address of a pending arbiter wait
    pub waiting_address: GuestAddr,
    /// Position in its priority group; lower runs first
    pub ready_seq: u64,
    /// Order in which the thread joined the arbiter queue
    pub block_seq: u64,
    /// Threads joined on this thread's termination
    pub termination_waiters: WaitList,
}

impl Thread {
    /// Unused slot
    pub fn dead(index: ThreadIndex) -> Self {
        Self {
            index,
            handle: None,
            context: ThreadContext::default(),
            initial_sp: 0,
            entrypoint: 0,
            arg: 0,
            priority: 0,
            processor_id: ProcessorId::Default,
            status: ThreadStatus::Dead,
            wait_list: Vec::new(),
            wakeup_tick: u64::MAX,
            waiting_address: 0,
            ready_seq: 0,
            block_seq: 0,
            termination_waiters: WaitList::new(),
        }
    }

    /// Fresh thread ready to run at `entrypoint`
    ///
    /// Registers are zeroed except r0 (argument), SP, PC and CPSR. Bit 0 of
    /// the entrypoint selects Thumb state.
    pub fn new(
        index: ThreadIndex,
        entrypoint: GuestAddr,
        initial_sp: GuestAddr,
        arg: u32,
        priority: Priority,
        processor_id: ProcessorId,
    ) -> Self {
        let mut context = ThreadContext::default();
        let thumb = entrypoint & 1 != 0;
        context.gprs[0] = arg;
        context.gprs[SP] = initial_sp;
        context.gprs[PC] = entrypoint & !1;
        context.cpsr = cpsr::USER_MODE | if thumb { cpsr::THUMB } else { 0 };
        context.fpscr = FPSCR_THREAD_DEFAULT;
        context.tls_base = tls_address(index);

        Self {
            context,
            initial_sp,
            entrypoint,
            arg,
            priority,
            processor_id,
            status: ThreadStatus::Ready,
            ..Self::dead(index)
        }
    }

    #[inline]
    pub fn tls_base(&self) -> GuestAddr {
        self.context.tls_base
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.status != ThreadStatus::Dead
    }

    /// Whether a timeout is armed for the current wait
    #[inline]
    pub fn has_timeout(&self) -> bool {
        self.status.is_waiting() && self.wakeup_tick != u64::MAX
    }
}
