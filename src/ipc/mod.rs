/*!
 * IPC
 * Command buffer codec and service dispatch
 *
 * Guest code talks to system services by filling its TLS command buffer and
 * issuing SendSyncRequest on a service handle or a port session.
 */

pub mod error_port;
mod message;
mod service;
pub mod srv;

pub use message::{
    response_header, CommandBuffer, IpcHeader, TranslateDescriptor, COMMAND_BUFFER_WORDS,
};
pub use service::{ServiceHandler, ServiceId, ServiceManager, SERVICE_COUNT};
pub use srv::SrvState;
