/*!
 * Command buffer helpers for IPC tests
 */

#![allow(dead_code)]

use crate::common::*;
use horizon_kernel::memory::{GuestRead, GuestWrite};
use horizon_kernel::svc::numbers;
use horizon_kernel::{CommandBuffer, Kernel, KernelResult};

pub fn cmdbuf(k: &Kernel) -> CommandBuffer {
    CommandBuffer::for_tls(k.tls_base())
}

/// Write a request into the running thread's command buffer
pub fn write_request(k: &mut Kernel, words: &[u32]) {
    let buf = cmdbuf(k);
    for (i, &w) in words.iter().enumerate() {
        buf.write(k.memory_mut(), i as u32, w);
    }
}

pub fn reply_word(k: &Kernel, word: u32) -> u32 {
    cmdbuf(k).read(k.memory(), word)
}

/// ConnectToPort by name; returns (r0, session)
pub fn connect(k: &mut Kernel, name: &str) -> (u32, u32) {
    let mut bytes = [0u8; 12];
    let n = name.len().min(12);
    bytes[..n].copy_from_slice(&name.as_bytes()[..n]);
    k.memory_mut().write_bytes(SCRATCH, &bytes);
    svc(k, numbers::CONNECT_TO_PORT, &[0, SCRATCH])
}

/// SendSyncRequest without asserting success; returns the caller's r0
pub fn try_send(k: &mut Kernel, handle: u32) -> KernelResult<u32> {
    let caller = k.current_thread();
    k.set_reg(0, handle);
    k.service_svc(numbers::SEND_SYNC_REQUEST)?;
    Ok(reg_of(k, caller, 0))
}

pub fn send(k: &mut Kernel, handle: u32) -> u32 {
    try_send(k, handle).expect("request handled")
}

pub fn memory_word(k: &Kernel, addr: u32) -> u32 {
    k.memory().read32(addr)
}
