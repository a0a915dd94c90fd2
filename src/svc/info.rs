/*!
 * Handle and Information SVCs
 */

use crate::core::errors::KernelError;
use crate::core::limits::LINEAR_HEAP_END;
use crate::core::result::ResultCode;
use crate::core::types::{Handle, KernelResult};
use crate::kernel::Kernel;
use crate::objects::handles::{self, CURRENT_PROCESS, CURRENT_THREAD};
use crate::objects::{Process, ResourceLimits, ResourceType, RESOURCE_TYPE_COUNT};
use log::{error, info};

/// Upper bound on a single OutputDebugString payload
const MAX_DEBUG_STRING: u32 = 0x1000;

mod process_info {
    pub const COMMITTED_MEMORY: u32 = 2;
    pub const LINEAR_HEAP_SIZE: u32 = 20;
}

impl Kernel {
    fn process_by_handle(&self, handle: Handle) -> Option<&Process> {
        let handle = if handle == CURRENT_PROCESS { self.process_handle() } else { handle };
        self.objects.get_as::<Process>(handle)
    }

    /// CloseHandle: r0 handle
    pub(super) fn svc_close_handle(&mut self) {
        let result = self.close_handle(self.reg(0));
        self.set_result(result.err().unwrap_or(ResultCode::SUCCESS));
    }

    /// DuplicateHandle: r1 handle; out r1 duplicate
    pub(super) fn svc_duplicate_handle(&mut self) {
        let original = self.reg(1);
        let duplicate = match original {
            CURRENT_THREAD => self.threads[self.current].handle,
            CURRENT_PROCESS => Some(self.process_handle()),
            h if handles::is_service_handle(h) => Some(h),
            h => self.objects.get(h).map(|obj| obj.handle),
        };
        match duplicate {
            Some(handle) => {
                self.set_result(ResultCode::SUCCESS);
                self.set_reg(1, handle);
            }
            None => self.set_result(ResultCode::INVALID_HANDLE),
        }
    }

    /// GetSystemTick: out r0/r1 tick count
    pub(super) fn svc_get_system_tick(&mut self) {
        let ticks = self.current_timestamp();
        self.set_reg(0, ticks as u32);
        self.set_reg(1, (ticks >> 32) as u32);
    }

    /// GetProcessInfo: r1 process handle, r2 type; out r1/r2 value
    pub(super) fn svc_get_process_info(&mut self) -> KernelResult<()> {
        let handle = self.reg(1);
        let info_type = self.reg(2);
        if self.process_by_handle(handle).is_none() {
            self.set_result(ResultCode::INVALID_HANDLE);
            return Ok(());
        }

        let value: u64 = match info_type {
            process_info::COMMITTED_MEMORY => self
                .resource_current_value(self.resource_limit_handle(), ResourceType::Commit)
                .unwrap_or(0),
            process_info::LINEAR_HEAP_SIZE => {
                u64::from(LINEAR_HEAP_END - self.config().linear_heap_base)
            }
            other => {
                error!("GetProcessInfo: unknown type {}", other);
                return Err(KernelError::UnknownProcessInfo(other));
            }
        };
        self.set_result(ResultCode::SUCCESS);
        self.set_reg(1, value as u32);
        self.set_reg(2, (value >> 32) as u32);
        Ok(())
    }

    /// GetProcessId: r1 process handle; out r1 id
    pub(super) fn svc_get_process_id(&mut self) {
        match self.process_by_handle(self.reg(1)).map(|p| p.id) {
            Some(id) => {
                self.set_result(ResultCode::SUCCESS);
                self.set_reg(1, id);
            }
            None => self.set_result(ResultCode::INVALID_HANDLE),
        }
    }

    /// GetResourceLimit: r1 process handle; out r1 resource limit handle
    pub(super) fn svc_get_resource_limit(&mut self) {
        match self.resource_limit_of(self.reg(1)) {
            Some(limit) => {
                self.set_result(ResultCode::SUCCESS);
                self.set_reg(1, limit);
            }
            None => self.set_result(ResultCode::INVALID_HANDLE),
        }
    }

    /// GetResourceLimit{Limit,Current}Values: r0 values out, r1 handle, r2 names, r3 count
    pub(super) fn svc_get_resource_limit_values(&mut self, current: bool) -> KernelResult<()> {
        let values = self.reg(0);
        let limit = self.reg(1);
        let names = self.reg(2);
        let count = self.reg(3);

        if self.objects.get_as::<ResourceLimits>(limit).is_none() {
            self.set_result(ResultCode::INVALID_HANDLE);
            return Ok(());
        }
        if count as usize > RESOURCE_TYPE_COUNT {
            self.set_result(ResultCode::OUT_OF_RANGE);
            return Ok(());
        }

        for i in 0..count {
            let raw = self.memory.read32(names.wrapping_add(i * 4));
            let resource = ResourceType::from_raw(raw).ok_or(KernelError::UnknownResourceType(raw))?;
            let value = if current {
                self.resource_current_value(limit, resource)
            } else {
                self.resource_limit_value(limit, resource)
            }
            .unwrap_or(0);
            self.memory.write64(values.wrapping_add(i * 8), value);
        }
        self.set_result(ResultCode::SUCCESS);
        Ok(())
    }

    /// Break: r0 reason; always fatal
    pub(super) fn svc_break(&mut self) -> KernelError {
        let reason = self.reg(0);
        error!("Guest break (reason {}) on thread {}", reason, self.current_thread());
        KernelError::GuestBreak(reason)
    }

    /// OutputDebugString: r0 string, r1 length
    pub(super) fn svc_output_debug_string(&mut self) {
        let address = self.reg(0);
        let len = self.reg(1).min(MAX_DEBUG_STRING);
        let mut bytes = vec![0u8; len as usize];
        self.memory.read_bytes(address, &mut bytes);
        info!("[guest] {}", String::from_utf8_lossy(&bytes));
    }
}
