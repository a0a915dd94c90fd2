/*!
 * System Calls
 * Numeric SVC dispatch with the console's register layouts
 *
 * Arguments arrive in the running thread's r0-r5; results go back in r0 (the
 * result code) and r1/r2. Guest-visible failures are result codes; anything
 * returned as `Err` is fatal to emulation.
 */

mod info;
mod ipc;
mod sync;
mod thread;

use crate::core::errors::KernelError;
use crate::core::types::KernelResult;
use crate::kernel::Kernel;
use crate::monitoring::SvcSpan;

/// SVC numbers
pub mod numbers {
    pub const CREATE_THREAD: u32 = 0x08;
    pub const EXIT_THREAD: u32 = 0x09;
    pub const SLEEP_THREAD: u32 = 0x0A;
    pub const GET_THREAD_PRIORITY: u32 = 0x0B;
    pub const SET_THREAD_PRIORITY: u32 = 0x0C;
    pub const GET_CURRENT_PROCESSOR_NUMBER: u32 = 0x11;
    pub const CREATE_MUTEX: u32 = 0x13;
    pub const RELEASE_MUTEX: u32 = 0x14;
    pub const CREATE_SEMAPHORE: u32 = 0x15;
    pub const RELEASE_SEMAPHORE: u32 = 0x16;
    pub const CREATE_EVENT: u32 = 0x17;
    pub const SIGNAL_EVENT: u32 = 0x18;
    pub const CLEAR_EVENT: u32 = 0x19;
    pub const CREATE_TIMER: u32 = 0x1A;
    pub const SET_TIMER: u32 = 0x1B;
    pub const CANCEL_TIMER: u32 = 0x1C;
    pub const CLEAR_TIMER: u32 = 0x1D;
    pub const CREATE_MEMORY_BLOCK: u32 = 0x1E;
    pub const CREATE_ADDRESS_ARBITER: u32 = 0x21;
    pub const ARBITRATE_ADDRESS: u32 = 0x22;
    pub const CLOSE_HANDLE: u32 = 0x23;
    pub const WAIT_SYNCHRONIZATION_1: u32 = 0x24;
    pub const WAIT_SYNCHRONIZATION_N: u32 = 0x25;
    pub const DUPLICATE_HANDLE: u32 = 0x27;
    pub const GET_SYSTEM_TICK: u32 = 0x28;
    pub const GET_PROCESS_INFO: u32 = 0x2B;
    pub const CONNECT_TO_PORT: u32 = 0x2D;
    pub const SEND_SYNC_REQUEST: u32 = 0x32;
    pub const GET_PROCESS_ID: u32 = 0x35;
    pub const GET_THREAD_ID: u32 = 0x37;
    pub const GET_RESOURCE_LIMIT: u32 = 0x38;
    pub const GET_RESOURCE_LIMIT_LIMIT_VALUES: u32 = 0x39;
    pub const GET_RESOURCE_LIMIT_CURRENT_VALUES: u32 = 0x3A;
    pub const BREAK: u32 = 0x3C;
    pub const OUTPUT_DEBUG_STRING: u32 = 0x3D;
}

/// Display name of an SVC number
pub fn svc_name(svc: u32) -> &'static str {
    use numbers::*;
    match svc {
        CREATE_THREAD => "CreateThread",
        EXIT_THREAD => "ExitThread",
        SLEEP_THREAD => "SleepThread",
        GET_THREAD_PRIORITY => "GetThreadPriority",
        SET_THREAD_PRIORITY => "SetThreadPriority",
        GET_CURRENT_PROCESSOR_NUMBER => "GetCurrentProcessorNumber",
        CREATE_MUTEX => "CreateMutex",
        RELEASE_MUTEX => "ReleaseMutex",
        CREATE_SEMAPHORE => "CreateSemaphore",
        RELEASE_SEMAPHORE => "ReleaseSemaphore",
        CREATE_EVENT => "CreateEvent",
        SIGNAL_EVENT => "SignalEvent",
        CLEAR_EVENT => "ClearEvent",
        CREATE_TIMER => "CreateTimer",
        SET_TIMER => "SetTimer",
        CANCEL_TIMER => "CancelTimer",
        CLEAR_TIMER => "ClearTimer",
        CREATE_MEMORY_BLOCK => "CreateMemoryBlock",
        CREATE_ADDRESS_ARBITER => "CreateAddressArbiter",
        ARBITRATE_ADDRESS => "ArbitrateAddress",
        CLOSE_HANDLE => "CloseHandle",
        WAIT_SYNCHRONIZATION_1 => "WaitSynchronization1",
        WAIT_SYNCHRONIZATION_N => "WaitSynchronizationN",
        DUPLICATE_HANDLE => "DuplicateHandle",
        GET_SYSTEM_TICK => "GetSystemTick",
        GET_PROCESS_INFO => "GetProcessInfo",
        CONNECT_TO_PORT => "ConnectToPort",
        SEND_SYNC_REQUEST => "SendSyncRequest",
        GET_PROCESS_ID => "GetProcessId",
        GET_THREAD_ID => "GetThreadId",
        GET_RESOURCE_LIMIT => "GetResourceLimit",
        GET_RESOURCE_LIMIT_LIMIT_VALUES => "GetResourceLimitLimitValues",
        GET_RESOURCE_LIMIT_CURRENT_VALUES => "GetResourceLimitCurrentValues",
        BREAK => "Break",
        OUTPUT_DEBUG_STRING => "OutputDebugString",
        _ => "Unknown",
    }
}

impl Kernel {
    /// Execute system call `svc` for the running thread
    ///
    /// Queued event callbacks are delivered and at most one scheduling
    /// decision is made before returning to guest code.
    pub fn service_svc(&mut self, svc: u32) -> KernelResult<()> {
        self.metrics.record_svc(svc);
        let span = SvcSpan::new(svc, svc_name(svc), self.current_thread());
        let result = {
            let _entered = span.enter();
            self.dispatch_svc(svc)
        };
        span.record_result(self.reg(0));
        result?;

        self.flush_event_callbacks()?;
        self.eval_reschedule();
        Ok(())
    }

    fn dispatch_svc(&mut self, svc: u32) -> KernelResult<()> {
        use numbers::*;
        match svc {
            CREATE_THREAD => self.svc_create_thread()?,
            EXIT_THREAD => self.svc_exit_thread(),
            SLEEP_THREAD => self.svc_sleep_thread(),
            GET_THREAD_PRIORITY => self.svc_get_thread_priority(),
            SET_THREAD_PRIORITY => self.svc_set_thread_priority(),
            GET_CURRENT_PROCESSOR_NUMBER => self.svc_get_current_processor_number(),
            GET_THREAD_ID => self.svc_get_thread_id(),

            CREATE_MUTEX => self.svc_create_mutex()?,
            RELEASE_MUTEX => self.svc_release_mutex(),
            CREATE_SEMAPHORE => self.svc_create_semaphore()?,
            RELEASE_SEMAPHORE => self.svc_release_semaphore(),
            CREATE_EVENT => self.svc_create_event()?,
            SIGNAL_EVENT => self.svc_signal_event(),
            CLEAR_EVENT => self.svc_clear_event(),
            CREATE_TIMER => self.svc_create_timer()?,
            SET_TIMER => self.svc_set_timer(),
            CANCEL_TIMER => self.svc_cancel_timer(),
            CLEAR_TIMER => self.svc_clear_timer(),
            CREATE_ADDRESS_ARBITER => self.svc_create_address_arbiter()?,
            ARBITRATE_ADDRESS => self.svc_arbitrate_address(),
            WAIT_SYNCHRONIZATION_1 => self.svc_wait_synchronization1(),
            WAIT_SYNCHRONIZATION_N => self.svc_wait_synchronization_n(),

            CLOSE_HANDLE => self.svc_close_handle(),
            DUPLICATE_HANDLE => self.svc_duplicate_handle(),
            GET_SYSTEM_TICK => self.svc_get_system_tick(),
            GET_PROCESS_INFO => self.svc_get_process_info()?,
            GET_PROCESS_ID => self.svc_get_process_id(),
            GET_RESOURCE_LIMIT => self.svc_get_resource_limit(),
            GET_RESOURCE_LIMIT_LIMIT_VALUES => self.svc_get_resource_limit_values(false)?,
            GET_RESOURCE_LIMIT_CURRENT_VALUES => self.svc_get_resource_limit_values(true)?,
            BREAK => return Err(self.svc_break()),
            OUTPUT_DEBUG_STRING => self.svc_output_debug_string(),

            CREATE_MEMORY_BLOCK => self.svc_create_memory_block()?,
            CONNECT_TO_PORT => self.svc_connect_to_port()?,
            SEND_SYNC_REQUEST => self.svc_send_sync_request()?,

            other => {
                log::error!("Unimplemented SVC 0x{:02X}", other);
                return Err(KernelError::UnimplementedSvc(other));
            }
        }
        Ok(())
    }
}
