/*!
 * Kernel IPC Entry Points
 * ConnectToPort and SendSyncRequest routing
 */

use super::Kernel;
use crate::core::data_structures::InlineString;
use crate::core::errors::KernelError;
use crate::core::limits::MAX_PORT_NAME_LEN;
use crate::core::result::ResultCode;
use crate::core::types::{GuestAddr, GuestResult, Handle, KernelResult};
use crate::ipc::{error_port, srv, CommandBuffer, ServiceId, TranslateDescriptor};
use crate::objects::{ObjectData, Port, Process, Session};
use log::{debug, trace};

impl Kernel {
    /// Open a session on the named port; returns the session handle
    pub fn connect_to_port(&mut self, name_ptr: GuestAddr) -> KernelResult<GuestResult<Handle>> {
        let mut bytes = [0u8; MAX_PORT_NAME_LEN + 1];
        self.memory.read_bytes(name_ptr, &mut bytes);
        let name = InlineString::from_guest_bytes(&bytes);
        if name.len() > MAX_PORT_NAME_LEN {
            return Ok(Err(ResultCode::PORT_NAME_TOO_LONG));
        }

        let port = self.objects.iter().find_map(|obj| match &obj.data {
            ObjectData::Port(port) if port.name.as_str() == name.as_str() => Some(obj.handle),
            _ => None,
        });
        let Some(port) = port else {
            debug!("ConnectToPort: no port named {:?}", name.as_str());
            return Ok(Err(ResultCode::NOT_FOUND));
        };

        let session = self.make_session(port)?;
        debug!("ConnectToPort({}) -> session {:X}", name, session);
        Ok(Ok(session))
    }

    /// Deliver the running thread's command buffer to `handle`
    ///
    /// Service handles go to their registered handler; sessions go to the
    /// port that owns them. Unknown targets are fatal, bad handles are not.
    pub fn send_sync_request(&mut self, handle: Handle) -> KernelResult<()> {
        let message = CommandBuffer::for_tls(self.tls_base()).base();

        if let Some(service) = ServiceId::from_handle(handle) {
            self.prepare_request(message)?;
            self.dispatch_service(service, message)?;
        } else if let Some(session) = self.objects.get_as::<Session>(handle) {
            let port = session.port;
            self.prepare_request(message)?;
            if port == self.srv_port {
                srv::handle_request(self, message)?;
            } else if port == self.error_port {
                error_port::handle_request(self, message)?;
            } else {
                let name = self
                    .objects
                    .get_as::<Port>(port)
                    .map_or_else(|| InlineString::from("<unknown port>"), |p| p.name.clone());
                return Err(KernelError::UnknownService(name));
            }
        } else {
            debug!("SendSyncRequest on bad handle {:X}", handle);
            self.set_result(ResultCode::INVALID_HANDLE);
            return Ok(());
        }

        self.set_result(ResultCode::SUCCESS);
        let delay = self.config.sync_request_delay_ns;
        if delay > 0 {
            self.sleep_current(delay);
        }
        Ok(())
    }

    /// Validate the header and fill in calling-PID descriptors
    fn prepare_request(&mut self, message: GuestAddr) -> KernelResult<()> {
        let buf = CommandBuffer::at(message);
        let descriptors = buf.translate_descriptors(&*self.memory)?;
        let pid = self
            .objects
            .get_as::<Process>(self.process)
            .map_or(0, |p| p.id);
        for (word, descriptor) in descriptors {
            if descriptor == TranslateDescriptor::CallingPid {
                buf.write(&mut *self.memory, word + 1, pid);
            }
        }
        Ok(())
    }

    /// Run a service handler against the command buffer at `message`
    pub fn dispatch_service(&mut self, service: ServiceId, message: GuestAddr) -> KernelResult<()> {
        trace!("IPC to {} (command {:08X})", service, self.memory.read32(message));
        let mut handler = self.services.take(service)?;
        let result = handler.handle_request(self, message);
        self.services.restore(service, handler);
        result
    }
}
