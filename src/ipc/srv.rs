/*!
 * srv: Port
 * Service directory and notification hub
 */

use super::message::CommandBuffer;
use super::service::ServiceId;
use crate::core::data_structures::InlineString;
use crate::core::errors::KernelError;
use crate::core::result::ResultCode;
use crate::core::types::{GuestAddr, Handle, KernelResult};
use crate::kernel::Kernel;
use ahash::AHashSet;
use log::{debug, info, warn};
use std::collections::VecDeque;

mod commands {
    pub const REGISTER_CLIENT: u32 = 0x0001_0002;
    pub const ENABLE_NOTIFICATION: u32 = 0x0002_0000;
    pub const GET_SERVICE_HANDLE: u32 = 0x0005_0100;
    pub const SUBSCRIBE: u32 = 0x0009_0040;
    pub const UNSUBSCRIBE: u32 = 0x000A_0040;
    pub const RECEIVE_NOTIFICATION: u32 = 0x000B_0000;
    pub const PUBLISH_TO_SUBSCRIBER: u32 = 0x000C_0080;
}

/// Cap of the notification semaphore and the pending-notification queue
pub const MAX_PENDING_NOTIFICATIONS: usize = 16;

/// Per-boot `srv:` state
#[derive(Debug, Default)]
pub struct SrvState {
    /// Created by the first EnableNotification
    pub notification_semaphore: Option<Handle>,
    subscriptions: AHashSet<u32>,
    pending: VecDeque<u32>,
}

impl SrvState {
    pub fn is_subscribed(&self, notification: u32) -> bool {
        self.subscriptions.contains(&notification)
    }

    pub fn pending_notifications(&self) -> usize {
        self.pending.len()
    }
}

/// Handle one request on a `srv:` session
pub fn handle_request(kernel: &mut Kernel, message: GuestAddr) -> KernelResult<()> {
    let buf = CommandBuffer::at(message);
    let command = buf.read(kernel.memory(), 0);
    match command {
        commands::REGISTER_CLIENT => {
            debug!("srv::RegisterClient");
            buf.write_response(kernel.memory_mut(), 0x1, 1, 0, ResultCode::SUCCESS);
        }
        commands::ENABLE_NOTIFICATION => enable_notification(kernel, buf)?,
        commands::GET_SERVICE_HANDLE => get_service_handle(kernel, buf)?,
        commands::SUBSCRIBE => {
            let id = buf.read(kernel.memory(), 1);
            debug!("srv::Subscribe (notification = 0x{:X})", id);
            kernel.srv.subscriptions.insert(id);
            buf.write_response(kernel.memory_mut(), 0x9, 1, 0, ResultCode::SUCCESS);
        }
        commands::UNSUBSCRIBE => {
            let id = buf.read(kernel.memory(), 1);
            debug!("srv::Unsubscribe (notification = 0x{:X})", id);
            kernel.srv.subscriptions.remove(&id);
            buf.write_response(kernel.memory_mut(), 0xA, 1, 0, ResultCode::SUCCESS);
        }
        commands::RECEIVE_NOTIFICATION => {
            let id = kernel.srv.pending.pop_front().unwrap_or(0);
            debug!("srv::ReceiveNotification (notification = 0x{:X})", id);
            let mem = kernel.memory_mut();
            buf.write_response(mem, 0xB, 2, 0, ResultCode::SUCCESS);
            buf.write(mem, 2, id);
        }
        commands::PUBLISH_TO_SUBSCRIBER => publish_to_subscriber(kernel, buf),
        other => return Err(KernelError::unknown_command("srv:", other)),
    }
    Ok(())
}

fn enable_notification(kernel: &mut Kernel, buf: CommandBuffer) -> KernelResult<()> {
    let semaphore = match kernel.srv.notification_semaphore {
        Some(handle) => handle,
        None => {
            let handle = kernel.make_semaphore(0, MAX_PENDING_NOTIFICATIONS as i32)?;
            kernel.srv.notification_semaphore = Some(handle);
            handle
        }
    };
    debug!("srv::EnableNotification (semaphore = {:X})", semaphore);

    let mem = kernel.memory_mut();
    buf.write_response(mem, 0x2, 1, 2, ResultCode::SUCCESS);
    buf.write(mem, 2, 0);
    buf.write(mem, 3, semaphore);
    Ok(())
}

fn get_service_handle(kernel: &mut Kernel, buf: CommandBuffer) -> KernelResult<()> {
    let mem = kernel.memory();
    let declared_len = buf.read(mem, 3).min(8) as usize;
    let name = buf.read_string(mem, 1, declared_len);

    let id = ServiceId::from_port_name(name.as_str())
        .ok_or_else(|| KernelError::UnknownService(InlineString::from(name.as_str())))?;
    info!("srv::GetServiceHandle (service: {} -> {})", name, id);

    let mem = kernel.memory_mut();
    buf.write_response(mem, 0x5, 1, 2, ResultCode::SUCCESS);
    buf.write(mem, 2, 0);
    buf.write(mem, 3, id.handle());
    Ok(())
}

fn publish_to_subscriber(kernel: &mut Kernel, buf: CommandBuffer) {
    let id = buf.read(kernel.memory(), 1);
    let flags = buf.read(kernel.memory(), 2);
    debug!("srv::PublishToSubscriber (notification = 0x{:X}, flags = {})", id, flags);

    if kernel.srv.is_subscribed(id) {
        if kernel.srv.pending.len() < MAX_PENDING_NOTIFICATIONS {
            kernel.srv.pending.push_back(id);
            if let Some(semaphore) = kernel.srv.notification_semaphore {
                if let Err(code) = kernel.release_semaphore(semaphore, 1) {
                    warn!("srv: notification semaphore release failed: {}", code);
                }
            }
        } else {
            warn!("srv: notification 0x{:X} dropped, queue full", id);
        }
    }

    buf.write_response(kernel.memory_mut(), 0xC, 1, 0, ResultCode::SUCCESS);
}
