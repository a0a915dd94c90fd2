/*!
 * Error Types
 * Fatal kernel conditions with thiserror and miette diagnostics
 *
 * Recoverable guest outcomes (bad handle, timeout, out of range) never appear
 * here; they are `ResultCode`s written into guest registers. A `KernelError`
 * always terminates emulation.
 */

use crate::core::data_structures::InlineString;
use miette::Diagnostic;
use thiserror::Error;

/// Unrecoverable kernel error with miette diagnostics
#[derive(Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
pub enum KernelError {
    #[error("Resource limit exceeded: {0}")]
    #[diagnostic(
        code(kernel::resource_limit_exceeded),
        help("Real hardware refuses this allocation earlier. The guest created more objects than its resource limit allows.")
    )]
    ResourceLimitExceeded(InlineString),

    #[error("Handle space exhausted at {0} objects")]
    #[diagnostic(
        code(kernel::handle_space_exhausted),
        help("The object table reached the highest allocatable handle.")
    )]
    HandleSpaceExhausted(usize),

    #[error("Unimplemented system call 0x{0:02X}")]
    #[diagnostic(
        code(kernel::unimplemented_svc),
        help("The guest issued an SVC this kernel does not emulate.")
    )]
    UnimplementedSvc(u32),

    #[error("Unknown service: {0}")]
    #[diagnostic(
        code(ipc::unknown_service),
        help("No handler is registered for this service name or handle.")
    )]
    UnknownService(InlineString),

    #[error("Unknown command 0x{command:08X} for service {service}")]
    #[diagnostic(
        code(ipc::unknown_command),
        help("The service handler does not implement this command header.")
    )]
    UnknownServiceCommand { service: InlineString, command: u32 },

    #[error("Malformed IPC header 0x{0:08X}")]
    #[diagnostic(
        code(ipc::malformed_header),
        help("The header's parameter counts overflow the command buffer.")
    )]
    MalformedIpcHeader(u32),

    #[error("Unknown resource limit type {0}")]
    #[diagnostic(code(kernel::unknown_resource_type))]
    UnknownResourceType(u32),

    #[error("Unknown process info type {0}")]
    #[diagnostic(code(kernel::unknown_process_info))]
    UnknownProcessInfo(u32),

    #[error("CPU exception {kind} at PC 0x{pc:08X}")]
    #[diagnostic(
        code(cpu::exception),
        help("The execution engine raised an exception the guest cannot recover from.")
    )]
    CpuException { kind: InlineString, pc: u32 },

    #[error("Guest requested break (reason {0})")]
    #[diagnostic(code(kernel::guest_break))]
    GuestBreak(u32),

    #[error("Guest reported fatal error: {0}")]
    #[diagnostic(
        code(ipc::guest_fatal),
        help("The guest threw a fatal error through err:f.")
    )]
    GuestFatal(InlineString),

    #[error("Service {0} is already handling a request")]
    #[diagnostic(
        code(ipc::service_busy),
        help("Service handlers must complete without re-entering their own port.")
    )]
    ServiceBusy(InlineString),

    #[error("Invalid kernel state: {0}")]
    #[diagnostic(code(kernel::invalid_state))]
    InvalidState(InlineString),

    #[error("Configuration error: {0}")]
    #[diagnostic(
        code(kernel::configuration_error),
        help("Invalid configuration. Review configuration parameters.")
    )]
    Config(InlineString),

    #[error("I/O error: {0}")]
    #[diagnostic(
        code(kernel::io_error),
        help("Configuration file could not be read. Check the path and permissions.")
    )]
    Io(InlineString),
}

impl From<std::io::Error> for KernelError {
    fn from(err: std::io::Error) -> Self {
        KernelError::Io(err.to_string().into())
    }
}

impl From<serde_json::Error> for KernelError {
    fn from(err: serde_json::Error) -> Self {
        KernelError::Config(err.to_string().into())
    }
}

impl KernelError {
    /// Shorthand for a resource-limit overflow on the named resource
    pub fn limit(resource: &str, max: u32) -> Self {
        KernelError::ResourceLimitExceeded(format!("{resource} (max {max})").into())
    }

    /// Shorthand for an unknown command on the named service
    pub fn unknown_command(service: &str, command: u32) -> Self {
        KernelError::UnknownServiceCommand {
            service: service.into(),
            command,
        }
    }
}
