/*!
 * Synchronization SVCs
 * Object creation, signalling and the WaitSynchronization family
 */

use crate::core::result::ResultCode;
use crate::core::types::{join_s64, GuestResult, KernelResult, ResetType};
use crate::kernel::Kernel;
use crate::objects::ResourceType;

impl Kernel {
    /// Write a guest result to r0
    fn finish(&mut self, result: GuestResult) {
        match result {
            Ok(()) => self.set_result(ResultCode::SUCCESS),
            Err(code) => self.set_result(code),
        }
    }

    fn reset_type_arg(&mut self, raw: u32) -> Option<ResetType> {
        let reset_type = ResetType::from_raw(raw);
        if reset_type.is_none() {
            self.set_result(ResultCode::INVALID_ENUM_VALUE);
        }
        reset_type
    }

    /// CreateMutex: r1 initially locked; out r1 handle
    pub(super) fn svc_create_mutex(&mut self) -> KernelResult<()> {
        let locked = self.reg(1) != 0;
        self.charge(ResourceType::Mutex)?;
        let handle = self.make_mutex(locked)?;
        self.set_result(ResultCode::SUCCESS);
        self.set_reg(1, handle);
        Ok(())
    }

    /// ReleaseMutex: r0 handle
    pub(super) fn svc_release_mutex(&mut self) {
        let result = self.release_mutex(self.reg(0));
        self.finish(result);
    }

    /// CreateSemaphore: r1 initial count, r2 maximum; out r1 handle
    pub(super) fn svc_create_semaphore(&mut self) -> KernelResult<()> {
        let initial = self.reg(1) as i32;
        let maximum = self.reg(2) as i32;
        if initial < 0 || maximum < 0 {
            self.set_result(ResultCode::OUT_OF_RANGE);
            return Ok(());
        }
        if initial > maximum {
            self.set_result(ResultCode::INVALID_COMBINATION);
            return Ok(());
        }
        self.charge(ResourceType::Semaphore)?;
        let handle = self.make_semaphore(initial, maximum)?;
        self.set_result(ResultCode::SUCCESS);
        self.set_reg(1, handle);
        Ok(())
    }

    /// ReleaseSemaphore: r1 handle, r2 count; out r1 previous count
    pub(super) fn svc_release_semaphore(&mut self) {
        let handle = self.reg(1);
        let count = self.reg(2) as i32;
        match self.release_semaphore(handle, count) {
            Ok(previous) => {
                self.set_result(ResultCode::SUCCESS);
                self.set_reg(1, previous as u32);
            }
            Err(code) => self.set_result(code),
        }
    }

    /// CreateEvent: r1 reset type; out r1 handle
    pub(super) fn svc_create_event(&mut self) -> KernelResult<()> {
        let Some(reset_type) = self.reset_type_arg(self.reg(1)) else {
            return Ok(());
        };
        self.charge(ResourceType::Event)?;
        let handle = self.make_event(reset_type)?;
        self.set_result(ResultCode::SUCCESS);
        self.set_reg(1, handle);
        Ok(())
    }

    /// SignalEvent: r0 handle
    pub(super) fn svc_signal_event(&mut self) {
        let result = self.signal_event(self.reg(0));
        self.finish(result);
    }

    /// ClearEvent: r0 handle
    pub(super) fn svc_clear_event(&mut self) {
        let result = self.clear_event(self.reg(0));
        self.finish(result);
    }

    /// CreateTimer: r1 reset type; out r1 handle
    pub(super) fn svc_create_timer(&mut self) -> KernelResult<()> {
        let Some(reset_type) = self.reset_type_arg(self.reg(1)) else {
            return Ok(());
        };
        self.charge(ResourceType::Timer)?;
        let handle = self.make_timer(reset_type)?;
        self.set_result(ResultCode::SUCCESS);
        self.set_reg(1, handle);
        Ok(())
    }

    /// SetTimer: r0 handle, r2/r3 initial ns, r1/r4 interval ns
    pub(super) fn svc_set_timer(&mut self) {
        let handle = self.reg(0);
        let initial = join_s64(self.reg(2), self.reg(3));
        let interval = join_s64(self.reg(1), self.reg(4));
        let result = self.set_timer(handle, initial, interval);
        self.finish(result);
    }

    /// CancelTimer: r0 handle
    pub(super) fn svc_cancel_timer(&mut self) {
        let result = self.cancel_timer(self.reg(0));
        self.finish(result);
    }

    /// ClearTimer: r0 handle
    pub(super) fn svc_clear_timer(&mut self) {
        let result = self.clear_timer(self.reg(0));
        self.finish(result);
    }

    /// CreateAddressArbiter: out r1 handle
    pub(super) fn svc_create_address_arbiter(&mut self) -> KernelResult<()> {
        self.charge(ResourceType::AddressArbiter)?;
        let handle = self.make_address_arbiter()?;
        self.set_result(ResultCode::SUCCESS);
        self.set_reg(1, handle);
        Ok(())
    }

    /// ArbitrateAddress: r0 handle, r1 address, r2 type, r3 value, r4/r5 timeout ns
    pub(super) fn svc_arbitrate_address(&mut self) {
        let handle = self.reg(0);
        let address = self.reg(1);
        let kind = self.reg(2);
        let value = self.reg(3) as i32;
        let timeout = join_s64(self.reg(4), self.reg(5));
        self.arbitrate_address(handle, address, kind, value, timeout);
    }

    /// WaitSynchronization1: r0 handle, r2/r3 timeout ns
    pub(super) fn svc_wait_synchronization1(&mut self) {
        let handle = self.reg(0);
        let timeout = join_s64(self.reg(2), self.reg(3));
        self.wait_synchronization1(handle, timeout);
    }

    /// WaitSynchronizationN: r0/r4 timeout ns, r1 handle array, r2 count, r3 wait all
    pub(super) fn svc_wait_synchronization_n(&mut self) {
        let timeout = join_s64(self.reg(0), self.reg(4));
        let handles = self.reg(1);
        let count = self.reg(2) as i32;
        let wait_all = self.reg(3) != 0;
        self.wait_synchronization_n(handles, count, wait_all, timeout);
    }
}
