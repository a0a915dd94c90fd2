/*!
 * Thread SVCs
 */

use crate::core::limits::LOWEST_USER_PRIORITY;
use crate::core::result::ResultCode;
use crate::core::types::{join_s64, KernelResult};
use crate::kernel::Kernel;
use crate::objects::ResourceType;
use crate::thread::ProcessorId;
use log::debug;

impl Kernel {
    /// CreateThread: r0 priority, r1 entrypoint, r2 arg, r3 stack top, r4 processor id
    pub(super) fn svc_create_thread(&mut self) -> KernelResult<()> {
        let priority = self.reg(0);
        let entrypoint = self.reg(1);
        let arg = self.reg(2);
        let stack_top = self.reg(3) & !7;
        let raw_processor = self.reg(4) as i32;

        if priority > LOWEST_USER_PRIORITY {
            self.set_result(ResultCode::BAD_THREAD_PRIORITY);
            return Ok(());
        }
        let Some(processor) = ProcessorId::from_raw(raw_processor) else {
            self.set_result(ResultCode::OUT_OF_RANGE);
            return Ok(());
        };

        self.charge(ResourceType::Thread)?;
        let handle = self.make_thread(entrypoint, stack_top, arg, priority, processor)?;
        self.set_result(ResultCode::SUCCESS);
        self.set_reg(1, handle);
        self.request_reschedule();
        Ok(())
    }

    pub(super) fn svc_exit_thread(&mut self) {
        self.exit_current_thread();
    }

    /// SleepThread: r0/r1 nanoseconds
    pub(super) fn svc_sleep_thread(&mut self) {
        let ns = join_s64(self.reg(0), self.reg(1));
        self.sleep_current(ns);
    }

    /// GetThreadPriority: r1 thread handle; out r1 priority
    pub(super) fn svc_get_thread_priority(&mut self) {
        let handle = self.reg(1);
        match self.thread_by_handle(handle).map(|t| t.priority) {
            Some(priority) => {
                self.set_result(ResultCode::SUCCESS);
                self.set_reg(1, priority);
            }
            None => self.set_result(ResultCode::INVALID_HANDLE),
        }
    }

    /// SetThreadPriority: r0 thread handle, r1 priority
    pub(super) fn svc_set_thread_priority(&mut self) {
        let handle = self.reg(0);
        let priority = self.reg(1);
        if priority > LOWEST_USER_PRIORITY {
            self.set_result(ResultCode::BAD_THREAD_PRIORITY);
            return;
        }
        let Some(index) = self.thread_index_of(handle) else {
            self.set_result(ResultCode::INVALID_HANDLE);
            return;
        };
        debug!("Thread {} priority -> 0x{:X}", index, priority);
        self.threads[index].priority = priority;
        self.set_result(ResultCode::SUCCESS);
        self.request_reschedule();
    }

    /// GetCurrentProcessorNumber: out r0 core number
    pub(super) fn svc_get_current_processor_number(&mut self) {
        let core = self.threads[self.current].processor_id.core_number();
        self.set_reg(0, core);
    }

    /// GetThreadId: r1 thread handle; out r1 id
    pub(super) fn svc_get_thread_id(&mut self) {
        let handle = self.reg(1);
        match self.thread_index_of(handle) {
            Some(index) => {
                self.set_result(ResultCode::SUCCESS);
                self.set_reg(1, index as u32);
            }
            None => self.set_result(ResultCode::INVALID_HANDLE),
        }
    }
}
