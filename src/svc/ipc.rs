/*!
 * IPC and Shared Memory SVCs
 */

use crate::core::limits::PAGE_SIZE;
use crate::core::result::ResultCode;
use crate::core::types::KernelResult;
use crate::kernel::Kernel;
use crate::objects::{MemoryPermission, ResourceType};
use log::debug;

impl Kernel {
    /// CreateMemoryBlock: r0 other permission, r1 address, r2 size, r3 own permission; out r1 handle
    pub(super) fn svc_create_memory_block(&mut self) -> KernelResult<()> {
        let other = self.reg(0);
        let address = self.reg(1);
        let size = self.reg(2);
        let mine = self.reg(3);

        if size % PAGE_SIZE != 0 {
            self.set_result(ResultCode::MISALIGNED_SIZE);
            return Ok(());
        }
        let (Some(mine), Some(other)) = (MemoryPermission::from_raw(mine), MemoryPermission::from_raw(other))
        else {
            self.set_result(ResultCode::INVALID_COMBINATION);
            return Ok(());
        };

        self.charge(ResourceType::SharedMemory)?;
        let handle = self.make_memory_block(address, size, mine.resolve(), other)?;
        debug!(
            "CreateMemoryBlock(addr = {:08X}, size = {:X}) -> {:X}",
            address, size, handle
        );
        self.set_result(ResultCode::SUCCESS);
        self.set_reg(1, handle);
        Ok(())
    }

    /// ConnectToPort: r1 port name; out r1 session handle
    pub(super) fn svc_connect_to_port(&mut self) -> KernelResult<()> {
        match self.connect_to_port(self.reg(1))? {
            Ok(session) => {
                self.set_result(ResultCode::SUCCESS);
                self.set_reg(1, session);
            }
            Err(code) => self.set_result(code),
        }
        Ok(())
    }

    /// SendSyncRequest: r0 service or session handle
    pub(super) fn svc_send_sync_request(&mut self) -> KernelResult<()> {
        self.send_sync_request(self.reg(0))
    }
}
