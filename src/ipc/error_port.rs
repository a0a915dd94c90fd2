/*!
 * err:f Port
 * Fatal-error reports from guest software
 */

use super::message::CommandBuffer;
use crate::core::data_structures::InlineString;
use crate::core::errors::KernelError;
use crate::core::types::{GuestAddr, KernelResult};
use crate::kernel::Kernel;
use log::error;

const THROW: u32 = 0x0001_0800;

/// Fatal-error record type carrying a free-form message
const ERROR_TYPE_EXCEPTION_MESSAGE: u8 = 4;
const MESSAGE_OFFSET: u32 = 0x24;
const MESSAGE_LEN: usize = 0x60;

/// Handle one request on an `err:f` session
///
/// Throw never returns to the guest: the record is logged and emulation stops.
pub fn handle_request(kernel: &mut Kernel, message: GuestAddr) -> KernelResult<()> {
    let buf = CommandBuffer::at(message);
    let mem = kernel.memory();
    let command = buf.read(mem, 0);
    if command != THROW {
        return Err(KernelError::unknown_command("err:f", command));
    }

    let error_type = mem.read8(message + 4);
    let pc = buf.read(mem, 3);
    let process_id = buf.read(mem, 4);

    let mut report = InlineString::from(format!(
        "type {} at pc 0x{:08X} (process {})",
        error_type, pc, process_id
    ));
    if error_type == ERROR_TYPE_EXCEPTION_MESSAGE {
        let mut bytes = vec![0u8; MESSAGE_LEN];
        mem.read_bytes(message + MESSAGE_OFFSET, &mut bytes);
        let text = InlineString::from_guest_bytes(&bytes);
        report.push_str(": ");
        report.push_str(text.as_str());
    }

    error!("err:f::Throw {}", report);
    Err(KernelError::GuestFatal(report))
}
